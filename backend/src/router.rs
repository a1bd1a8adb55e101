use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    docs::ApiDoc,
    handlers,
    middleware::{self as app_middleware, rate_limit::create_auth_rate_limiter},
    state::AppState,
};

/// Wires every route, middleware layer and the API docs onto one router.
pub fn build_router(state: AppState) -> Router {
    let mut public_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh));
    if state.config.rate_limit_enabled {
        if let Some(limiter) = create_auth_rate_limiter(&state.config) {
            public_routes = public_routes.route_layer(limiter);
        }
    }

    // Authenticated, but not bound to an organization.
    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/change-password",
            put(handlers::auth::change_password),
        )
        .route(
            "/api/organizations",
            get(handlers::organizations::list_my_organizations)
                .post(handlers::organizations::create_organization),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth,
        ));

    let system_routes = Router::new()
        .route(
            "/api/system/organizations",
            get(handlers::organizations::list_all_organizations),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_system_admin,
        ));

    // `tenant` needs the user inserted by `auth`, so `auth` is the outer layer.
    let tenant_routes = tenant_routes()
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::tenant,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth,
        ));

    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(system_routes)
        .merge(tenant_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn(app_middleware::log_error_responses)),
        )
        .with_state(state)
}

fn tenant_routes() -> Router<AppState> {
    use handlers::*;

    Router::new()
        .route(
            "/api/organizations/current",
            get(organizations::get_current_organization)
                .put(organizations::update_current_organization),
        )
        // administration
        .route("/api/admin/permissions", get(admin::list_permissions))
        .route(
            "/api/admin/roles",
            get(admin::list_roles).post(admin::create_role),
        )
        .route(
            "/api/admin/roles/{id}/permissions",
            put(admin::set_role_permissions),
        )
        .route(
            "/api/admin/members",
            get(admin::list_members).post(admin::add_member),
        )
        .route(
            "/api/admin/members/{id}",
            put(admin::update_member).delete(admin::remove_member),
        )
        // organization structure
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/{id}",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/positions",
            get(positions::list_positions).post(positions::create_position),
        )
        .route(
            "/api/positions/{id}",
            get(positions::get_position)
                .put(positions::update_position)
                .delete(positions::delete_position),
        )
        .route(
            "/api/positions/{id}/competencies",
            get(positions::get_requirements).put(positions::set_requirements),
        )
        // employees
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::terminate_employee),
        )
        .route(
            "/api/employees/{id}/observations",
            get(employees::list_observations).post(employees::create_observation),
        )
        .route(
            "/api/employees/{id}/interviews",
            get(employees::list_interviews).post(employees::create_interview),
        )
        .route("/api/interviews/{id}", put(employees::update_interview))
        .route(
            "/api/employees/{id}/competencies",
            get(competencies::employee_competencies).put(competencies::assess_competencies),
        )
        .route(
            "/api/employees/{id}/benefits",
            get(benefits::employee_benefits),
        )
        // attendance
        .route("/api/attendance/check-in", post(attendance::check_in))
        .route("/api/attendance/check-out", post(attendance::check_out))
        .route("/api/attendance/summary", get(attendance::attendance_summary))
        .route(
            "/api/attendance",
            get(attendance::list_attendance).post(attendance::create_attendance),
        )
        .route(
            "/api/attendance/{id}",
            put(attendance::update_attendance).delete(attendance::delete_attendance),
        )
        // vacations
        .route(
            "/api/vacations",
            get(vacations::list_vacations).post(vacations::create_vacation),
        )
        .route(
            "/api/vacations/balance/{employee_id}",
            get(vacations::vacation_balance),
        )
        .route("/api/vacations/{id}", get(vacations::get_vacation))
        .route("/api/vacations/{id}/approve", put(vacations::approve_vacation))
        .route("/api/vacations/{id}/reject", put(vacations::reject_vacation))
        .route("/api/vacations/{id}/cancel", put(vacations::cancel_vacation))
        // payroll
        .route("/api/payroll", get(payroll::list_payrolls))
        .route("/api/payroll/generate", post(payroll::generate_payroll))
        .route("/api/payroll/export", get(payroll::export_payrolls))
        .route(
            "/api/payroll/{id}",
            get(payroll::get_payroll).delete(payroll::delete_payroll),
        )
        .route("/api/payroll/{id}/approve", put(payroll::approve_payroll))
        .route("/api/payroll/{id}/pay", put(payroll::pay_payroll))
        // electronic payroll
        .route(
            "/api/dian/payroll/{id}/validate",
            post(dian::validate_payroll),
        )
        .route("/api/dian/payroll/{id}/submit", post(dian::submit_payroll))
        .route("/api/dian/payroll/{id}/xml", get(dian::payroll_xml))
        .route("/api/dian/submissions", get(dian::list_submissions))
        // psychometric training
        .route(
            "/api/training/tests",
            get(training::list_tests).post(training::create_test),
        )
        .route(
            "/api/training/tests/{id}",
            get(training::get_test)
                .put(training::update_test)
                .delete(training::delete_test),
        )
        .route(
            "/api/training/tests/{id}/questions",
            post(training::add_question),
        )
        .route(
            "/api/training/questions/{id}",
            delete(training::delete_question),
        )
        .route(
            "/api/training/assignments",
            get(training::list_assignments).post(training::create_assignment),
        )
        .route(
            "/api/training/assignments/{id}/submit",
            post(training::submit_assignment),
        )
        .route("/api/training/results", get(training::list_results))
        // evaluations
        .route(
            "/api/evaluations",
            get(evaluations::list_evaluations).post(evaluations::create_evaluation),
        )
        .route(
            "/api/evaluations/{id}",
            get(evaluations::get_evaluation)
                .put(evaluations::update_evaluation)
                .delete(evaluations::delete_evaluation),
        )
        .route(
            "/api/evaluations/{id}/submit",
            put(evaluations::submit_evaluation),
        )
        .route(
            "/api/evaluations/{id}/complete",
            put(evaluations::complete_evaluation),
        )
        // competencies
        .route(
            "/api/competencies",
            get(competencies::list_competencies).post(competencies::create_competency),
        )
        .route(
            "/api/competencies/gap/{employee_id}",
            get(competencies::competency_gap),
        )
        .route(
            "/api/competencies/{id}",
            get(competencies::get_competency)
                .put(competencies::update_competency)
                .delete(competencies::delete_competency),
        )
        // benefits
        .route(
            "/api/benefits",
            get(benefits::list_benefits).post(benefits::create_benefit),
        )
        .route(
            "/api/benefits/{id}",
            get(benefits::get_benefit)
                .put(benefits::update_benefit)
                .delete(benefits::delete_benefit),
        )
        .route("/api/benefits/{id}/enroll", post(benefits::enroll))
        .route(
            "/api/employee-benefits/{id}",
            delete(benefits::end_enrollment),
        )
        // disciplinary
        .route(
            "/api/disciplinary",
            get(disciplinary::list_cases).post(disciplinary::create_case),
        )
        .route("/api/disciplinary/{id}", get(disciplinary::get_case))
        .route(
            "/api/disciplinary/{id}/charges",
            post(disciplinary::add_charge),
        )
        .route(
            "/api/disciplinary/{id}/notifications",
            post(disciplinary::add_notification),
        )
        .route(
            "/api/disciplinary/{id}/defense",
            post(disciplinary::submit_defense),
        )
        .route(
            "/api/disciplinary/{id}/hearings",
            post(disciplinary::schedule_hearing),
        )
        .route(
            "/api/disciplinary/{id}/sanctions",
            post(disciplinary::impose_sanction),
        )
        .route(
            "/api/disciplinary/{id}/termination",
            post(disciplinary::terminate),
        )
        .route("/api/disciplinary/{id}/close", put(disciplinary::close_case))
}

/// Empty origin list means any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(24 * 60 * 60));
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
