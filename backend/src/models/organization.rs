use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{types::OrganizationId, validation::rules::validate_nit};

/// A tenant. Every HR record belongs to exactly one organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Employer tax id, unique across the installation.
    pub nit: String,
    pub legal_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(payload: CreateOrganization) -> Self {
        let now = Utc::now();
        Self {
            id: OrganizationId::new(),
            name: payload.name.trim().to_string(),
            nit: payload.nit.trim().to_string(),
            legal_name: trim_optional(payload.legal_name),
            email: trim_optional(payload.email),
            phone: trim_optional(payload.phone),
            address: trim_optional(payload.address),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, payload: UpdateOrganization) {
        if let Some(name) = payload.name {
            self.name = name.trim().to_string();
        }
        if payload.legal_name.is_some() {
            self.legal_name = trim_optional(payload.legal_name);
        }
        if payload.email.is_some() {
            self.email = trim_optional(payload.email);
        }
        if payload.phone.is_some() {
            self.phone = trim_optional(payload.phone);
        }
        if payload.address.is_some() {
            self.address = trim_optional(payload.address);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrganization {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(custom(function = "validate_nit"))]
    pub nit: String,
    #[serde(default)]
    pub legal_name: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganization {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub legal_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Trims an optional string and maps blank values to `None`.
pub fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateOrganization {
        CreateOrganization {
            name: "  Acme SAS ".into(),
            nit: "900123456-7".into(),
            legal_name: Some("   ".into()),
            email: Some("rrhh@acme.co".into()),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn new_organization_trims_fields() {
        let org = Organization::new(payload());
        assert_eq!(org.name, "Acme SAS");
        assert_eq!(org.legal_name, None);
        assert_eq!(org.email.as_deref(), Some("rrhh@acme.co"));
    }

    #[test]
    fn create_organization_validates_nit() {
        let mut bad = payload();
        bad.nit = "ABC".into();
        assert!(bad.validate().is_err());
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn apply_update_only_touches_given_fields() {
        let mut org = Organization::new(payload());
        org.apply_update(UpdateOrganization {
            phone: Some("601 555 0101".into()),
            ..Default::default()
        });
        assert_eq!(org.name, "Acme SAS");
        assert_eq!(org.phone.as_deref(), Some("601 555 0101"));
    }
}
