//! Role-based access control extractors for Axum handlers.
//!
//! Each extractor performs the capability check once at the service
//! boundary; handlers receive a typed proof of authorization and pass the
//! explicit actor identity into core operations.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::user::UserRole;
use crate::AppState;

/// Extractor that requires the Admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(RequireAdmin(user))
    }
}

/// Extractor that requires the Maker role.
#[derive(Debug, Clone)]
pub struct RequireMaker(pub CurrentUser);

impl FromRequestParts<AppState> for RequireMaker {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Maker {
            return Err(AppError::Forbidden("Maker access required".to_string()));
        }
        Ok(RequireMaker(user))
    }
}

/// Extractor that requires the Checker role.
#[derive(Debug, Clone)]
pub struct RequireChecker(pub CurrentUser);

impl FromRequestParts<AppState> for RequireChecker {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Checker {
            return Err(AppError::Forbidden("Checker access required".to_string()));
        }
        Ok(RequireChecker(user))
    }
}

/// Extractor that requires the User role (runtime extraction and ledger).
#[derive(Debug, Clone)]
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::User {
            return Err(AppError::Forbidden("User access required".to_string()));
        }
        Ok(RequireUser(user))
    }
}

/// Extractor for pattern test mode: Maker or Checker.
#[derive(Debug, Clone)]
pub struct RequireReviewerOrMaker(pub CurrentUser);

impl FromRequestParts<AppState> for RequireReviewerOrMaker {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        match user.role {
            UserRole::Maker | UserRole::Checker => Ok(RequireReviewerOrMaker(user)),
            _ => Err(AppError::Forbidden(
                "Maker or checker access required".to_string(),
            )),
        }
    }
}
