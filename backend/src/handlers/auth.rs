use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::organizations::create_with_owner,
    models::{
        organization::Organization,
        user::{
            normalize_email, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse,
            RefreshRequest, RegisterRequest, RegisterResponse, User, UserResponse,
        },
    },
    repositories::{
        auth::{self as auth_repo, ActiveAccessToken},
        begin_transaction, commit_transaction, RbacRepository,
    },
    state::AppState,
    utils::{
        jwt::{
            create_access_token, create_refresh_token, decode_refresh_token, verify_refresh_token,
            Claims,
        },
        password::{hash_password, verify_password},
    },
    validation::rules::validate_password,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    payload.validate()?;
    ensure_password_policy(&state, &payload.password)?;

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(payload.email, password_hash, payload.full_name.trim().to_string());
    let organization = Organization::new(payload.organization);

    let mut tx = begin_transaction(&state.pool).await?;
    let user = auth_repo::insert_user(&mut *tx, &user).await?;
    let organization = create_with_owner(&mut *tx, &organization, user.id).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        user_id = %user.id,
        organization_id = %organization.id,
        "Registered user with a new organization"
    );

    let auth = issue_tokens(&state, user).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { auth, organization })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    let user = auth_repo::find_user_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    if !user.is_active {
        return Err(AppError::Forbidden("Account is inactive".into()));
    }

    Ok(Json(issue_tokens(&state, user).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid or expired refresh token".into());
    let (token_id, secret) = decode_refresh_token(&payload.refresh_token).map_err(|_| invalid())?;

    let stored = auth_repo::fetch_valid_refresh_token(&state.pool, &token_id, Utc::now())
        .await?
        .ok_or_else(invalid)?;
    if !verify_refresh_token(&secret, &stored.token_hash)? {
        return Err(invalid());
    }

    let user = auth_repo::find_user_by_id(&state.pool, stored.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    auth_repo::delete_refresh_token_by_id(&state.pool, &stored.id).await?;
    Ok(Json(issue_tokens(&state, user).await?))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<MeResponse>> {
    let memberships = RbacRepository::new()
        .summaries_for_user(&state.pool, user.id)
        .await?;
    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        memberships,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Value>> {
    auth_repo::delete_active_access_token_by_jti(&state.pool, &claims.jti).await?;
    auth_repo::delete_refresh_tokens_for_user(&state.pool, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged out");
    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    if payload.new_password == payload.current_password {
        return Err(AppError::BadRequest(
            "New password must differ from current password".into(),
        ));
    }
    ensure_password_policy(&state, &payload.new_password)?;

    let new_hash = hash_password(&payload.new_password)?;
    auth_repo::update_user_password(&state.pool, user.id, &new_hash).await?;
    auth_repo::delete_refresh_tokens_for_user(&state.pool, user.id).await?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

fn ensure_password_policy(state: &AppState, password: &str) -> AppResult<()> {
    validate_password(password, state.config.password_min_length).map_err(|_| {
        AppError::BadRequest(format!(
            "Password must be at least {} characters",
            state.config.password_min_length
        ))
    })
}

/// Issues an access/refresh pair and records both for revocation.
async fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let config = &state.config;
    let (access_token, claims) = create_access_token(
        user.id,
        user.email.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )?;
    auth_repo::insert_active_access_token(
        &state.pool,
        &ActiveAccessToken {
            jti: &claims.jti,
            user_id: user.id,
            expires_at: claims.expires_at(),
        },
    )
    .await?;

    let refresh = create_refresh_token(user.id, config.refresh_token_expiration_days)?;
    auth_repo::insert_refresh_token(&state.pool, &refresh).await?;

    let memberships = RbacRepository::new()
        .summaries_for_user(&state.pool, user.id)
        .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.encoded(),
        token_type: "Bearer".to_string(),
        expires_in: config.jwt_expiration_hours * 3600,
        user: UserResponse::from(user),
        memberships,
    })
}
