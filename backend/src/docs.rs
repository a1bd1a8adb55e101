#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::models::{
    attendance::{
        Attendance, AttendanceListQuery, AttendanceStatus, AttendanceSummary,
        AttendanceSummaryQuery, CheckRequest, ManualAttendanceRequest, UpdateAttendanceRequest,
    },
    benefit::{Benefit, BenefitPayload, BenefitType, EmployeeBenefit, EnrollRequest},
    competency::{
        AssessCompetenciesRequest, Competency, CompetencyPayload, EmployeeCompetency,
        GapAnalysis, SetRequirementsRequest,
    },
    department::{Department, DepartmentPayload, DepartmentSummary},
    dian::{DianSubmission, DianSubmitResponse, DianValidationResponse},
    disciplinary::{
        CaseDetail, CaseStatus, Charge, CreateCaseRequest, CreateChargeRequest,
        CreateSanctionRequest, CreateTerminationRequest, DisciplinaryCase, Sanction, Termination,
    },
    employee::{CreateEmployee, DocumentType, Employee, EmployeeListQuery, EmployeeStatus, UpdateEmployee},
    evaluation::{CreateEvaluationRequest, EvaluationDetail, EvaluationStatus},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    payroll::{
        GeneratePayrollRequest, GeneratePayrollResponse, Payroll, PayrollListQuery, PayrollStatus,
    },
    position::{Position, PositionPayload},
    psychometric::{
        CreateAssignmentRequest, CreateQuestionRequest, CreateTestRequest, PsychometricTest,
        SubmitAnswersRequest, SubmitTestResponse, TestWithQuestions,
    },
    rbac::{AddMemberPayload, CreateRolePayload, MemberResponse, MembershipSummary, RoleResponse},
    user::{
        AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, RefreshRequest,
        RegisterRequest, RegisterResponse, UserResponse,
    },
    vacation::{CreateVacationRequest, Vacation, VacationBalance, VacationStatus, VacationType},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "HRM API", description = "Multi-tenant human resources backend"),
    paths(
        register_doc,
        login_doc,
        refresh_doc,
        me_doc,
        logout_doc,
        change_password_doc,
        list_organizations_doc,
        create_organization_doc,
        current_organization_doc,
        update_organization_doc,
        list_roles_doc,
        create_role_doc,
        list_members_doc,
        add_member_doc,
        list_departments_doc,
        create_department_doc,
        list_positions_doc,
        create_position_doc,
        list_employees_doc,
        create_employee_doc,
        get_employee_doc,
        update_employee_doc,
        check_in_doc,
        check_out_doc,
        list_attendance_doc,
        create_attendance_doc,
        attendance_summary_doc,
        create_vacation_doc,
        approve_vacation_doc,
        vacation_balance_doc,
        generate_payroll_doc,
        list_payroll_doc,
        approve_payroll_doc,
        export_payroll_doc,
        dian_validate_doc,
        dian_submit_doc,
        dian_xml_doc,
        list_tests_doc,
        create_test_doc,
        add_question_doc,
        create_assignment_doc,
        submit_assignment_doc,
        create_evaluation_doc,
        submit_evaluation_doc,
        create_competency_doc,
        assess_competencies_doc,
        competency_gap_doc,
        create_benefit_doc,
        enroll_doc,
        create_case_doc,
        get_case_doc,
        add_charge_doc,
        impose_sanction_doc,
        terminate_doc
    ),
    components(
        schemas(
            // auth & tenancy
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            RefreshRequest,
            AuthResponse,
            MeResponse,
            ChangePasswordRequest,
            UserResponse,
            MembershipSummary,
            Organization,
            CreateOrganization,
            UpdateOrganization,
            RoleResponse,
            CreateRolePayload,
            MemberResponse,
            AddMemberPayload,
            // structure
            Department,
            DepartmentPayload,
            DepartmentSummary,
            Position,
            PositionPayload,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeStatus,
            DocumentType,
            // time
            Attendance,
            AttendanceStatus,
            CheckRequest,
            ManualAttendanceRequest,
            UpdateAttendanceRequest,
            AttendanceSummary,
            Vacation,
            VacationType,
            VacationStatus,
            CreateVacationRequest,
            VacationBalance,
            // payroll
            Payroll,
            PayrollStatus,
            GeneratePayrollRequest,
            GeneratePayrollResponse,
            DianSubmission,
            DianValidationResponse,
            DianSubmitResponse,
            // talent
            PsychometricTest,
            TestWithQuestions,
            CreateTestRequest,
            CreateQuestionRequest,
            CreateAssignmentRequest,
            SubmitAnswersRequest,
            SubmitTestResponse,
            CreateEvaluationRequest,
            EvaluationDetail,
            EvaluationStatus,
            Competency,
            CompetencyPayload,
            EmployeeCompetency,
            SetRequirementsRequest,
            AssessCompetenciesRequest,
            GapAnalysis,
            Benefit,
            BenefitPayload,
            BenefitType,
            EmployeeBenefit,
            EnrollRequest,
            // disciplinary
            DisciplinaryCase,
            CaseStatus,
            CaseDetail,
            CreateCaseRequest,
            Charge,
            CreateChargeRequest,
            Sanction,
            CreateSanctionRequest,
            Termination,
            CreateTerminationRequest
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Organizations", description = "Tenants and memberships"),
        (name = "Admin", description = "Roles, permissions and members"),
        (name = "Employees", description = "Departments, positions and employee records"),
        (name = "Attendance", description = "Daily check-in/check-out"),
        (name = "Vacations", description = "Vacation requests and balances"),
        (name = "Payroll", description = "Payroll generation and lifecycle"),
        (name = "DIAN", description = "Electronic payroll documents"),
        (name = "Talent", description = "Training, evaluations, competencies and benefits"),
        (name = "Disciplinary", description = "Disciplinary process")
    ),
    security(("BearerAuth" = [], "Organization" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
        components.add_security_scheme(
            "Organization",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Organization-Id"))),
        );
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, body = RegisterResponse),
        (status = 409, description = "Email or NIT already registered")
    ),
    tag = "Auth",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses((status = 200, body = AuthResponse), (status = 401)),
    tag = "Auth",
    security(())
)]
fn refresh_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, body = MeResponse)),
    tag = "Auth",
    security(("BearerAuth" = []))
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, body = serde_json::Value)),
    tag = "Auth",
    security(("BearerAuth" = []))
)]
fn logout_doc() {}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses((status = 200, body = serde_json::Value), (status = 400)),
    tag = "Auth",
    security(("BearerAuth" = []))
)]
fn change_password_doc() {}

#[utoipa::path(
    get,
    path = "/api/organizations",
    responses((status = 200, body = [MembershipSummary])),
    tag = "Organizations",
    security(("BearerAuth" = []))
)]
fn list_organizations_doc() {}

#[utoipa::path(
    post,
    path = "/api/organizations",
    request_body = CreateOrganization,
    responses((status = 201, body = Organization), (status = 409)),
    tag = "Organizations",
    security(("BearerAuth" = []))
)]
fn create_organization_doc() {}

#[utoipa::path(
    get,
    path = "/api/organizations/current",
    responses((status = 200, body = Organization)),
    tag = "Organizations"
)]
fn current_organization_doc() {}

#[utoipa::path(
    put,
    path = "/api/organizations/current",
    request_body = UpdateOrganization,
    responses((status = 200, body = Organization)),
    tag = "Organizations"
)]
fn update_organization_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/roles",
    responses((status = 200, body = [RoleResponse])),
    tag = "Admin"
)]
fn list_roles_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/roles",
    request_body = CreateRolePayload,
    responses((status = 201, body = RoleResponse), (status = 400, description = "Unknown permission")),
    tag = "Admin"
)]
fn create_role_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/members",
    responses((status = 200, body = [MemberResponse])),
    tag = "Admin"
)]
fn list_members_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/members",
    request_body = AddMemberPayload,
    responses((status = 201, body = MemberResponse), (status = 409)),
    tag = "Admin"
)]
fn add_member_doc() {}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, body = [DepartmentSummary])),
    tag = "Employees"
)]
fn list_departments_doc() {}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentPayload,
    responses((status = 201, body = Department), (status = 409)),
    tag = "Employees"
)]
fn create_department_doc() {}

#[utoipa::path(
    get,
    path = "/api/positions",
    responses((status = 200, body = [Position])),
    tag = "Employees"
)]
fn list_positions_doc() {}

#[utoipa::path(
    post,
    path = "/api/positions",
    request_body = PositionPayload,
    responses((status = 201, body = Position)),
    tag = "Employees"
)]
fn create_position_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeListQuery),
    responses((status = 200, description = "Paginated employees", body = serde_json::Value)),
    tag = "Employees"
)]
fn list_employees_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses((status = 201, body = Employee), (status = 409)),
    tag = "Employees"
)]
fn create_employee_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    responses((status = 200, body = Employee), (status = 404)),
    tag = "Employees"
)]
fn get_employee_doc() {}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    request_body = UpdateEmployee,
    responses((status = 200, body = Employee)),
    tag = "Employees"
)]
fn update_employee_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckRequest,
    responses((status = 201, body = Attendance), (status = 409, description = "Already checked in")),
    tag = "Attendance"
)]
fn check_in_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = CheckRequest,
    responses((status = 200, body = Attendance), (status = 400)),
    tag = "Attendance"
)]
fn check_out_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceListQuery),
    responses((status = 200, body = [Attendance])),
    tag = "Attendance"
)]
fn list_attendance_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = ManualAttendanceRequest,
    responses((status = 201, body = Attendance)),
    tag = "Attendance"
)]
fn create_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(AttendanceSummaryQuery),
    responses((status = 200, body = AttendanceSummary)),
    tag = "Attendance"
)]
fn attendance_summary_doc() {}

#[utoipa::path(
    post,
    path = "/api/vacations",
    request_body = CreateVacationRequest,
    responses((status = 201, body = Vacation), (status = 409, description = "Overlapping request")),
    tag = "Vacations"
)]
fn create_vacation_doc() {}

#[utoipa::path(
    put,
    path = "/api/vacations/{id}/approve",
    params(("id" = String, Path, description = "Vacation id")),
    responses((status = 200, body = Vacation), (status = 400), (status = 409)),
    tag = "Vacations"
)]
fn approve_vacation_doc() {}

#[utoipa::path(
    get,
    path = "/api/vacations/balance/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee id")),
    responses((status = 200, body = VacationBalance)),
    tag = "Vacations"
)]
fn vacation_balance_doc() {}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = GeneratePayrollRequest,
    responses((status = 201, body = GeneratePayrollResponse), (status = 409)),
    tag = "Payroll"
)]
fn generate_payroll_doc() {}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollListQuery),
    responses((status = 200, body = [Payroll])),
    tag = "Payroll"
)]
fn list_payroll_doc() {}

#[utoipa::path(
    put,
    path = "/api/payroll/{id}/approve",
    params(("id" = String, Path, description = "Payroll id")),
    responses((status = 200, body = Payroll), (status = 409, description = "Invalid transition")),
    tag = "Payroll"
)]
fn approve_payroll_doc() {}

#[utoipa::path(
    get,
    path = "/api/payroll/export",
    params(
        ("period_start" = String, Query, description = "YYYY-MM-DD"),
        ("period_end" = String, Query, description = "YYYY-MM-DD")
    ),
    responses((status = 200, description = "CSV file", content_type = "text/csv", body = String)),
    tag = "Payroll"
)]
fn export_payroll_doc() {}

#[utoipa::path(
    post,
    path = "/api/dian/payroll/{id}/validate",
    params(("id" = String, Path, description = "Payroll id")),
    responses((status = 200, body = DianValidationResponse)),
    tag = "DIAN"
)]
fn dian_validate_doc() {}

#[utoipa::path(
    post,
    path = "/api/dian/payroll/{id}/submit",
    params(("id" = String, Path, description = "Payroll id")),
    responses(
        (status = 200, body = DianSubmitResponse),
        (status = 400, description = "Document failed validation"),
        (status = 409, description = "Payroll is not approved")
    ),
    tag = "DIAN"
)]
fn dian_submit_doc() {}

#[utoipa::path(
    get,
    path = "/api/dian/payroll/{id}/xml",
    params(("id" = String, Path, description = "Payroll id")),
    responses((status = 200, content_type = "application/xml", body = String)),
    tag = "DIAN"
)]
fn dian_xml_doc() {}

#[utoipa::path(
    get,
    path = "/api/training/tests",
    responses((status = 200, body = [PsychometricTest])),
    tag = "Talent"
)]
fn list_tests_doc() {}

#[utoipa::path(
    post,
    path = "/api/training/tests",
    request_body = CreateTestRequest,
    responses((status = 201, body = PsychometricTest)),
    tag = "Talent"
)]
fn create_test_doc() {}

#[utoipa::path(
    post,
    path = "/api/training/tests/{id}/questions",
    params(("id" = String, Path, description = "Test id")),
    request_body = CreateQuestionRequest,
    responses((status = 201, body = serde_json::Value)),
    tag = "Talent"
)]
fn add_question_doc() {}

#[utoipa::path(
    post,
    path = "/api/training/assignments",
    request_body = CreateAssignmentRequest,
    responses((status = 201, body = serde_json::Value), (status = 409)),
    tag = "Talent"
)]
fn create_assignment_doc() {}

#[utoipa::path(
    post,
    path = "/api/training/assignments/{id}/submit",
    params(("id" = String, Path, description = "Assignment id")),
    request_body = SubmitAnswersRequest,
    responses((status = 201, body = SubmitTestResponse), (status = 409)),
    tag = "Talent"
)]
fn submit_assignment_doc() {}

#[utoipa::path(
    post,
    path = "/api/evaluations",
    request_body = CreateEvaluationRequest,
    responses((status = 201, body = EvaluationDetail)),
    tag = "Talent"
)]
fn create_evaluation_doc() {}

#[utoipa::path(
    put,
    path = "/api/evaluations/{id}/submit",
    params(("id" = String, Path, description = "Evaluation id")),
    responses((status = 200, body = EvaluationDetail), (status = 400, description = "Unscored criteria")),
    tag = "Talent"
)]
fn submit_evaluation_doc() {}

#[utoipa::path(
    post,
    path = "/api/competencies",
    request_body = CompetencyPayload,
    responses((status = 201, body = Competency), (status = 409)),
    tag = "Talent"
)]
fn create_competency_doc() {}

#[utoipa::path(
    put,
    path = "/api/employees/{id}/competencies",
    params(("id" = String, Path, description = "Employee id")),
    request_body = AssessCompetenciesRequest,
    responses((status = 200, body = [EmployeeCompetency])),
    tag = "Talent"
)]
fn assess_competencies_doc() {}

#[utoipa::path(
    get,
    path = "/api/competencies/gap/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee id")),
    responses((status = 200, body = GapAnalysis)),
    tag = "Talent"
)]
fn competency_gap_doc() {}

#[utoipa::path(
    post,
    path = "/api/benefits",
    request_body = BenefitPayload,
    responses((status = 201, body = Benefit)),
    tag = "Talent"
)]
fn create_benefit_doc() {}

#[utoipa::path(
    post,
    path = "/api/benefits/{id}/enroll",
    params(("id" = String, Path, description = "Benefit id")),
    request_body = EnrollRequest,
    responses((status = 201, body = EmployeeBenefit), (status = 409)),
    tag = "Talent"
)]
fn enroll_doc() {}

#[utoipa::path(
    post,
    path = "/api/disciplinary",
    request_body = CreateCaseRequest,
    responses((status = 201, body = DisciplinaryCase)),
    tag = "Disciplinary"
)]
fn create_case_doc() {}

#[utoipa::path(
    get,
    path = "/api/disciplinary/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses((status = 200, body = CaseDetail)),
    tag = "Disciplinary"
)]
fn get_case_doc() {}

#[utoipa::path(
    post,
    path = "/api/disciplinary/{id}/charges",
    params(("id" = String, Path, description = "Case id")),
    request_body = CreateChargeRequest,
    responses((status = 201, body = Charge), (status = 409, description = "Case is closed")),
    tag = "Disciplinary"
)]
fn add_charge_doc() {}

#[utoipa::path(
    post,
    path = "/api/disciplinary/{id}/sanctions",
    params(("id" = String, Path, description = "Case id")),
    request_body = CreateSanctionRequest,
    responses((status = 201, body = Sanction)),
    tag = "Disciplinary"
)]
fn impose_sanction_doc() {}

#[utoipa::path(
    post,
    path = "/api/disciplinary/{id}/termination",
    params(("id" = String, Path, description = "Case id")),
    request_body = CreateTerminationRequest,
    responses((status = 201, body = Termination)),
    tag = "Disciplinary"
)]
fn terminate_doc() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths_and_security_schemes() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = json["paths"].as_object().unwrap();
        for path in [
            "/api/auth/login",
            "/api/payroll/generate",
            "/api/dian/payroll/{id}/submit",
            "/api/disciplinary/{id}/termination",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
        assert_eq!(
            json.pointer("/components/securitySchemes/BearerAuth/scheme")
                .and_then(|v| v.as_str()),
            Some("bearer")
        );
        assert!(json
            .pointer("/components/securitySchemes/Organization")
            .is_some());
    }
}
