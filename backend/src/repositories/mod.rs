pub mod attendance;
pub mod auth;
pub mod benefit;
pub mod common;
pub mod competency;
pub mod department;
pub mod dian;
pub mod disciplinary;
pub mod employee;
pub mod evaluation;
pub mod observation;
pub mod organization;
pub mod payroll;
pub mod position;
pub mod psychometric;
pub mod rbac;
pub mod repository;
pub mod transaction;
pub mod vacation;

pub use attendance::{AttendanceRepository, AttendanceRepositoryTrait};
pub use benefit::BenefitRepository;
pub use common::*;
pub use competency::CompetencyRepository;
pub use department::DepartmentRepository;
pub use dian::DianSubmissionRepository;
pub use disciplinary::DisciplinaryRepository;
pub use employee::EmployeeRepository;
pub use evaluation::EvaluationRepository;
pub use observation::{InterviewRepository, ObservationRepository};
pub use organization::OrganizationRepository;
pub use payroll::{PayrollFilters, PayrollRepository};
pub use position::PositionRepository;
pub use psychometric::PsychometricRepository;
pub use rbac::{MembershipGrant, RbacRepository};
pub use repository::*;
pub use transaction::*;
pub use vacation::VacationRepository;

#[cfg(test)]
pub use attendance::MockAttendanceRepositoryTrait;
