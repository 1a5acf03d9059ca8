//! # User API Handlers
//!
//! Signup, login and session introspection.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ErrorType};
use crate::handlers::types::{
    AccountResponse, AuthenticateRequest, RegisterRequest, SessionResponse, TokenResponse,
    normalize_email,
};
use crate::server::AppState;

/// Register a new account
#[utoipa::path(
    post,
    path = "/user/add",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(request) = payload?;
    let request = request.validate()?;

    let account = state
        .auth
        .register(request.name, request.email, request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/user/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 403, description = "Invalid credentials", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ErrorType::InvalidCredentials.into());
    }

    let issued = state.auth.authenticate(&email, request.password).await?;
    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

/// Identity behind the presented bearer token
#[utoipa::path(
    get,
    path = "/user/session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session is valid", body = SessionResponse),
        (status = 401, description = "Missing, expired or invalid token", body = ApiError)
    ),
    tag = "users"
)]
pub async fn session(AuthenticatedUser(claims): AuthenticatedUser) -> Result<Json<SessionResponse>, ApiError> {
    let expires_at = claims
        .expires_at()
        .ok_or_else(|| ApiError::from(ErrorType::Unauthorized))?;

    Ok(Json(SessionResponse {
        id: claims.id,
        email: claims.email,
        expires_at,
    }))
}
