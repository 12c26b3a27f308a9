//! Authentication routes: login, profile, and admin user creation.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireAdmin;
use crate::models::user::{CreateUser, UserResponse};
use crate::services::auth as auth_service;
use crate::services::auth::TokenResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let token = auth_service::login(
        &state.db,
        &body.username,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_token_expiry_secs,
    )
    .await?;

    Ok(ApiResponse::success(token))
}

/// GET /api/v1/auth/me — current user profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = auth_service::find_user_by_id(&state.db, current_user.id).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}

/// POST /api/v1/auth/users — admin-only user creation
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CreateUser>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = auth_service::create_user(&state.db, &body).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}
