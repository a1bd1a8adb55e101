//! Electronic payroll documents for DIAN.
//!
//! Builds the payroll XML, computes its CUNE and hands it to a [`DianClient`].
//! The default client is simulated; `DIAN_MODE=http` posts to a real endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use sha2::{Digest, Sha384};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::DianSettings,
    error::AppError,
    models::{employee::Employee, organization::Organization, payroll::Payroll},
    validation::rules::validate_nit,
};

/// Document type code for an individual electronic payroll.
pub const PAYROLL_DOCUMENT_TYPE: &str = "102";
/// Response code meaning the document was accepted.
pub const ACCEPTED_CODE: &str = "00";
/// Number used when exporting a document that was never submitted.
pub const PREVIEW_NUMBER: &str = "PREVIEW";

#[derive(Debug, Error)]
pub enum DianError {
    #[error("DIAN service unreachable: {0}")]
    Transport(String),
    #[error("Unexpected DIAN response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for DianError {
    fn from(err: reqwest::Error) -> Self {
        DianError::Transport(err.to_string())
    }
}

impl From<DianError> for AppError {
    fn from(err: DianError) -> Self {
        AppError::InternalServerError(anyhow::Error::new(err))
    }
}

/// What is sent to DIAN for one payroll.
#[derive(Debug, Clone, PartialEq)]
pub struct DianRequest {
    pub document_number: String,
    pub cune: String,
    pub xml: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DianResponse {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub tracking_id: Option<String>,
}

impl DianResponse {
    pub fn is_accepted(&self) -> bool {
        self.code == ACCEPTED_CODE
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DianClient: Send + Sync {
    async fn submit(&self, request: &DianRequest) -> Result<DianResponse, DianError>;
}

/// Accepts every document without leaving the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedDianClient;

#[async_trait]
impl DianClient for SimulatedDianClient {
    async fn submit(&self, request: &DianRequest) -> Result<DianResponse, DianError> {
        tracing::info!(
            document_number = %request.document_number,
            "Simulated DIAN submission accepted"
        );
        Ok(DianResponse {
            code: ACCEPTED_CODE.to_string(),
            message: "Procesado Correctamente".to_string(),
            tracking_id: Some(Uuid::new_v4().to_string()),
        })
    }
}

pub struct HttpDianClient {
    client: reqwest::Client,
    endpoint: String,
    software_id: String,
}

impl HttpDianClient {
    pub fn from_settings(settings: &DianSettings) -> anyhow::Result<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("DIAN_ENDPOINT is required for the HTTP client"))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            software_id: settings.software_id.clone(),
        })
    }
}

#[async_trait]
impl DianClient for HttpDianClient {
    async fn submit(&self, request: &DianRequest) -> Result<DianResponse, DianError> {
        let span = tracing::info_span!(
            "dian_http_submit",
            document_number = %request.document_number
        );
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .header("X-Software-Id", &self.software_id)
            .header("X-Cune", &request.cune)
            .body(request.xml.clone())
            .send()
            .instrument(span)
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(DianError::Transport(format!("HTTP {}", status)));
        }
        response
            .json::<DianResponse>()
            .await
            .map_err(|e| DianError::InvalidResponse(e.to_string()))
    }
}

/// A payroll ready to be rendered as an electronic document.
pub struct PayrollDocument<'a> {
    pub organization: &'a Organization,
    pub employee: &'a Employee,
    pub payroll: &'a Payroll,
    pub document_number: String,
    pub issued_at: DateTime<Tz>,
}

impl<'a> PayrollDocument<'a> {
    pub fn new(
        organization: &'a Organization,
        employee: &'a Employee,
        payroll: &'a Payroll,
        document_number: String,
        issued_at: DateTime<Utc>,
        time_zone: &Tz,
    ) -> Self {
        Self {
            organization,
            employee,
            payroll,
            document_number,
            issued_at: issued_at.with_timezone(time_zone),
        }
    }

    pub fn issue_date(&self) -> String {
        self.issued_at.format("%Y-%m-%d").to_string()
    }

    pub fn issue_time(&self) -> String {
        self.issued_at.format("%H:%M:%S%:z").to_string()
    }

    pub fn cune(&self, settings: &DianSettings) -> String {
        compute_cune(&CuneInput {
            document_number: &self.document_number,
            issue_date: &self.issue_date(),
            issue_time: &self.issue_time(),
            gross: self.payroll.gross_pay,
            deductions: self.payroll.total_deductions,
            net: self.payroll.net_pay,
            employer_nit: &self.organization.nit,
            employee_document: &self.employee.document_number,
            software_pin: &settings.software_pin,
            environment: settings.environment,
        })
    }

    pub fn to_request(&self, settings: &DianSettings) -> DianRequest {
        let cune = self.cune(settings);
        let xml = build_xml(self, &cune, settings);
        DianRequest {
            document_number: self.document_number.clone(),
            cune,
            xml,
        }
    }
}

pub struct CuneInput<'a> {
    pub document_number: &'a str,
    pub issue_date: &'a str,
    pub issue_time: &'a str,
    pub gross: f64,
    pub deductions: f64,
    pub net: f64,
    pub employer_nit: &'a str,
    pub employee_document: &'a str,
    pub software_pin: &'a str,
    pub environment: u8,
}

/// SHA-384 hex digest of the concatenated document fields.
pub fn compute_cune(input: &CuneInput<'_>) -> String {
    let raw = format!(
        "{}{}{}{}{}{}{}{}{}{}{}",
        input.document_number,
        input.issue_date,
        input.issue_time,
        format_amount(input.gross),
        format_amount(input.deductions),
        format_amount(input.net),
        nit_digits(input.employer_nit),
        input.employee_document,
        PAYROLL_DOCUMENT_TYPE,
        input.software_pin,
        input.environment,
    );
    hex::encode(Sha384::digest(raw.as_bytes()))
}

pub fn document_number(prefix: &str, sequence: i64) -> String {
    format!("{}{}", prefix, sequence)
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// NIT without the check digit.
fn nit_digits(nit: &str) -> &str {
    nit.trim().split('-').next().unwrap_or_default()
}

/// Returns every reason the payroll cannot be sent; empty when it can.
pub fn validate_document(
    organization: &Organization,
    employee: &Employee,
    payroll: &Payroll,
) -> Vec<String> {
    let mut errors = Vec::new();
    if organization.nit.trim().is_empty() {
        errors.push("Organization NIT is required".to_string());
    } else if validate_nit(&organization.nit).is_err() {
        errors.push("Organization NIT must be numeric with an optional check digit".to_string());
    }
    if employee.document_number.trim().is_empty() {
        errors.push("Employee document number is required".to_string());
    }
    if !payroll.status.is_submittable() {
        errors.push(format!(
            "Payroll status must be approved or rejected, found {}",
            payroll.status
        ));
    }
    if payroll.net_pay <= 0.0 {
        errors.push("Net pay must be greater than zero".to_string());
    }
    if payroll.gross_pay < payroll.total_deductions {
        errors.push("Gross pay must not be lower than total deductions".to_string());
    }
    if payroll.period_end < payroll.period_start {
        errors.push("Payroll period end precedes its start".to_string());
    }
    errors
}

/// Escapes the five XML special characters.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn element(xml: &mut String, indent: usize, name: &str, value: &str) {
    xml.push_str(&" ".repeat(indent));
    xml.push_str(&format!("<{name}>{}</{name}>\n", escape_xml(value)));
}

pub fn build_xml(document: &PayrollDocument<'_>, cune: &str, settings: &DianSettings) -> String {
    let org = document.organization;
    let emp = document.employee;
    let p = document.payroll;

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<NominaIndividual xmlns=\"dian:gov:co:facturaelectronica:NominaIndividual\">\n");

    xml.push_str("  <InformacionGeneral>\n");
    element(&mut xml, 4, "Numero", &document.document_number);
    element(&mut xml, 4, "CUNE", cune);
    element(&mut xml, 4, "FechaGen", &document.issue_date());
    element(&mut xml, 4, "HoraGen", &document.issue_time());
    element(&mut xml, 4, "TipoXML", PAYROLL_DOCUMENT_TYPE);
    element(&mut xml, 4, "Ambiente", &settings.environment.to_string());
    element(&mut xml, 4, "SoftwareID", &settings.software_id);
    xml.push_str("  </InformacionGeneral>\n");

    xml.push_str("  <Periodo>\n");
    element(&mut xml, 4, "FechaIngreso", &emp.hire_date.to_string());
    element(&mut xml, 4, "FechaLiquidacionInicio", &p.period_start.to_string());
    element(&mut xml, 4, "FechaLiquidacionFin", &p.period_end.to_string());
    element(&mut xml, 4, "TiempoLaborado", &p.worked_days.to_string());
    xml.push_str("  </Periodo>\n");

    xml.push_str("  <Empleador>\n");
    element(&mut xml, 4, "RazonSocial", org.legal_name.as_deref().unwrap_or(&org.name));
    element(&mut xml, 4, "NIT", nit_digits(&org.nit));
    if let Some(address) = org.address.as_deref() {
        element(&mut xml, 4, "Direccion", address);
    }
    xml.push_str("  </Empleador>\n");

    xml.push_str("  <Trabajador>\n");
    element(&mut xml, 4, "TipoDocumento", emp.document_type.dian_code());
    element(&mut xml, 4, "NumeroDocumento", &emp.document_number);
    element(&mut xml, 4, "PrimerApellido", &emp.last_name);
    element(&mut xml, 4, "PrimerNombre", &emp.first_name);
    element(&mut xml, 4, "CodigoTrabajador", &emp.employee_number);
    element(&mut xml, 4, "Sueldo", &format_amount(p.base_salary));
    xml.push_str("  </Trabajador>\n");

    xml.push_str("  <Devengados>\n");
    element(&mut xml, 4, "SueldoTrabajado", &format_amount(p.base_pay));
    element(&mut xml, 4, "AuxilioTransporte", &format_amount(p.transport_allowance));
    element(&mut xml, 4, "HorasExtra", &format_amount(p.overtime_hours));
    element(&mut xml, 4, "PagoHorasExtra", &format_amount(p.overtime_pay));
    element(&mut xml, 4, "Bonificaciones", &format_amount(p.bonuses));
    xml.push_str("  </Devengados>\n");

    xml.push_str("  <Deducciones>\n");
    element(&mut xml, 4, "Salud", &format_amount(p.health_deduction));
    element(&mut xml, 4, "FondoPension", &format_amount(p.pension_deduction));
    element(&mut xml, 4, "OtrasDeducciones", &format_amount(p.other_deductions));
    xml.push_str("  </Deducciones>\n");

    element(&mut xml, 2, "DevengadosTotal", &format_amount(p.gross_pay));
    element(&mut xml, 2, "DeduccionesTotal", &format_amount(p.total_deductions));
    element(&mut xml, 2, "ComprobanteTotal", &format_amount(p.net_pay));
    xml.push_str("</NominaIndividual>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        employee::{CreateEmployee, DocumentType},
        organization::CreateOrganization,
        payroll::PayrollStatus,
    };
    use crate::config::PayrollSettings;
    use crate::services::payroll::{build_draft, Adjustments};
    use chrono::{NaiveDate, TimeZone};

    fn organization(name: &str) -> Organization {
        Organization::new(CreateOrganization {
            name: name.into(),
            nit: "900123456-7".into(),
            legal_name: None,
            email: None,
            phone: None,
            address: None,
        })
    }

    fn employee(org: &Organization) -> Employee {
        Employee::new(
            org.id,
            CreateEmployee {
                employee_number: "EMP-1".into(),
                first_name: "Ana".into(),
                last_name: "Gómez".into(),
                document_type: DocumentType::Cc,
                document_number: "1020304050".into(),
                email: "ana@acme.co".into(),
                phone: None,
                address: None,
                birth_date: None,
                hire_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                department_id: None,
                position_id: None,
                user_id: None,
                base_salary: 1_300_000.0,
                bank_account: None,
                eps: None,
                pension_fund: None,
            },
        )
    }

    fn approved_payroll(employee: &Employee) -> Payroll {
        let mut payroll = build_draft(
            employee,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            &[],
            Adjustments::default(),
            &PayrollSettings::default(),
        )
        .unwrap();
        payroll.status = PayrollStatus::Approved;
        payroll
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 15, 30, 0).unwrap()
    }

    #[test]
    fn cune_is_deterministic_and_sensitive_to_amounts() {
        let input = CuneInput {
            document_number: "NE1",
            issue_date: "2024-04-01",
            issue_time: "10:30:00-05:00",
            gross: 1_462_000.0,
            deductions: 104_000.0,
            net: 1_358_000.0,
            employer_nit: "900123456-7",
            employee_document: "1020304050",
            software_pin: "12345",
            environment: 2,
        };
        let first = compute_cune(&input);
        assert_eq!(first, compute_cune(&input));
        assert_eq!(first.len(), 96);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let changed = CuneInput { net: 1_358_000.01, ..input };
        assert_ne!(first, compute_cune(&changed));
    }

    #[test]
    fn cune_matches_manual_digest() {
        let input = CuneInput {
            document_number: "NE7",
            issue_date: "2024-04-01",
            issue_time: "10:30:00-05:00",
            gross: 100.0,
            deductions: 8.0,
            net: 92.0,
            employer_nit: "900123456-7",
            employee_document: "123456",
            software_pin: "999",
            environment: 2,
        };
        let expected = hex::encode(Sha384::digest(
            "NE72024-04-0110:30:00-05:00100.008.0092.009001234561234561029992".as_bytes(),
        ));
        assert_eq!(compute_cune(&input), expected);
    }

    #[test]
    fn escape_xml_handles_special_characters() {
        assert_eq!(
            escape_xml(r#"Gómez & Hijos <S.A.S> "ltda" 'co'"#),
            "Gómez &amp; Hijos &lt;S.A.S&gt; &quot;ltda&quot; &apos;co&apos;"
        );
    }

    #[test]
    fn xml_contains_escaped_parties_and_totals() {
        let org = organization("Pérez & Cía <SAS>");
        let emp = employee(&org);
        let payroll = approved_payroll(&emp);
        let settings = DianSettings::default();
        let doc = PayrollDocument::new(
            &org,
            &emp,
            &payroll,
            "NE10".into(),
            issued_at(),
            &chrono_tz::America::Bogota,
        );
        let request = doc.to_request(&settings);
        assert!(request.xml.contains("<RazonSocial>Pérez &amp; Cía &lt;SAS&gt;</RazonSocial>"));
        assert!(request.xml.contains("<NIT>900123456</NIT>"));
        assert!(request.xml.contains("<ComprobanteTotal>1358000.00</ComprobanteTotal>"));
        assert!(request.xml.contains(&format!("<CUNE>{}</CUNE>", request.cune)));
        assert!(request.xml.contains("<HoraGen>10:30:00-05:00</HoraGen>"));
        assert_eq!(doc.issue_date(), "2024-04-01");
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut org = organization("Acme");
        let emp = employee(&org);
        let mut payroll = approved_payroll(&emp);
        assert!(validate_document(&org, &emp, &payroll).is_empty());

        org.nit = "ABC".into();
        payroll.status = PayrollStatus::Draft;
        payroll.net_pay = 0.0;
        let errors = validate_document(&org, &emp, &payroll);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejected_payroll_can_be_resubmitted() {
        let org = organization("Acme");
        let emp = employee(&org);
        let mut payroll = approved_payroll(&emp);
        payroll.status = PayrollStatus::Rejected;
        assert!(validate_document(&org, &emp, &payroll).is_empty());
    }

    #[tokio::test]
    async fn simulated_client_accepts() {
        let request = DianRequest {
            document_number: "NE1".into(),
            cune: "abc".into(),
            xml: "<x/>".into(),
        };
        let response = SimulatedDianClient.submit(&request).await.unwrap();
        assert!(response.is_accepted());
        assert_eq!(response.message, "Procesado Correctamente");
        assert!(response.tracking_id.is_some());
    }

    #[tokio::test]
    async fn mock_client_can_reject() {
        let mut client = MockDianClient::new();
        client.expect_submit().times(1).returning(|_| {
            Ok(DianResponse {
                code: "99".into(),
                message: "Rechazado".into(),
                tracking_id: None,
            })
        });
        let request = DianRequest {
            document_number: "NE2".into(),
            cune: "def".into(),
            xml: "<x/>".into(),
        };
        let response = client.submit(&request).await.unwrap();
        assert!(!response.is_accepted());
    }

    #[test]
    fn http_client_requires_endpoint() {
        assert!(HttpDianClient::from_settings(&DianSettings::default()).is_err());
    }

    #[test]
    fn document_number_uses_prefix() {
        assert_eq!(document_number("NE", 42), "NE42");
    }
}
