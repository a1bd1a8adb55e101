//! Typed ID wrappers for compile-time type safety.
//!
//! These types wrap UUIDs to prevent accidental mixing of different entity IDs.
//! In the database they are stored as `TEXT`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{encode::IsNull, error::BoxDynError, Database, Decode, Encode, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate typed ID wrappers with common trait implementations.
macro_rules! typed_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Uuid::parse_str(&s)
                    .map(Self)
                    .map_err(serde::de::Error::custom)
            }
        }

        impl utoipa::PartialSchema for $name {
            fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
                <String as utoipa::PartialSchema>::schema()
            }
        }

        impl utoipa::ToSchema for $name {}

        // SQLx integration for reading from database
        impl<'r, DB: Database> Decode<'r, DB> for $name
        where
            String: Decode<'r, DB>,
        {
            fn decode(value: <DB as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
                let s = String::decode(value)?;
                Uuid::parse_str(&s).map(Self).map_err(|e| e.into())
            }
        }

        // SQLx integration for writing to database
        impl<'q, DB: Database> Encode<'q, DB> for $name
        where
            String: Encode<'q, DB>,
        {
            fn encode_by_ref(
                &self,
                buf: &mut <DB as Database>::ArgumentBuffer<'q>,
            ) -> Result<IsNull, BoxDynError> {
                self.0.to_string().encode_by_ref(buf)
            }
        }

        impl<DB: Database> Type<DB> for $name
        where
            String: Type<DB>,
        {
            fn type_info() -> <DB as Database>::TypeInfo {
                String::type_info()
            }

            fn compatible(ty: &<DB as Database>::TypeInfo) -> bool {
                String::compatible(ty)
            }
        }
    };
}

// Identity and tenancy
typed_id!(OrganizationId, "Unique identifier for an organization (tenant).");
typed_id!(UserId, "Unique identifier for a user account.");
typed_id!(MembershipId, "Unique identifier for an organization membership.");
typed_id!(RoleId, "Unique identifier for a role.");

// Organization structure
typed_id!(DepartmentId, "Unique identifier for a department.");
typed_id!(PositionId, "Unique identifier for a position.");
typed_id!(EmployeeId, "Unique identifier for an employee.");
typed_id!(ObservationId, "Unique identifier for an employee observation.");
typed_id!(InterviewId, "Unique identifier for an interview.");

// Time and pay
typed_id!(AttendanceId, "Unique identifier for an attendance record.");
typed_id!(VacationId, "Unique identifier for a vacation request.");
typed_id!(PayrollId, "Unique identifier for a payroll record.");
typed_id!(DianSubmissionId, "Unique identifier for a DIAN submission.");

// Talent
typed_id!(PsychometricTestId, "Unique identifier for a psychometric test.");
typed_id!(QuestionId, "Unique identifier for a psychometric question.");
typed_id!(AssignmentId, "Unique identifier for a test assignment.");
typed_id!(TestResultId, "Unique identifier for a test result.");
typed_id!(EvaluationId, "Unique identifier for a performance evaluation.");
typed_id!(CriteriaId, "Unique identifier for an evaluation criterion.");
typed_id!(CompetencyId, "Unique identifier for a competency.");
typed_id!(BenefitId, "Unique identifier for a benefit.");
typed_id!(EmployeeBenefitId, "Unique identifier for a benefit enrollment.");

// Disciplinary
typed_id!(DisciplinaryCaseId, "Unique identifier for a disciplinary case.");
typed_id!(ChargeId, "Unique identifier for a disciplinary charge.");
typed_id!(NotificationId, "Unique identifier for a disciplinary notification.");
typed_id!(DefenseId, "Unique identifier for a defense submission.");
typed_id!(HearingId, "Unique identifier for a disciplinary hearing.");
typed_id!(SanctionId, "Unique identifier for a sanction.");
typed_id!(TerminationId, "Unique identifier for a termination.");
