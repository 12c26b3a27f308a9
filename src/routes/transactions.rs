//! Transaction ledger routes for end users.

use axum::{extract::State, Json};
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireUser;
use crate::models::transaction::{SaveTransaction, Transaction};
use crate::services::transaction as transaction_service;
use crate::AppState;

/// POST /api/v1/transactions — save a matched extraction to the ledger.
pub async fn save(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<SaveTransaction>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let tx = transaction_service::save(&state.db, user.id, &body).await?;
    Ok(ApiResponse::success(tx))
}

/// GET /api/v1/transactions — the caller's ledger, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    let rows = transaction_service::list_for_user(&state.db, user.id).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/v1/transactions/summary — totals over the caller's ledger.
pub async fn summary(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ApiResponse<transaction_service::TransactionSummary>>, AppError> {
    let rows = transaction_service::list_for_user(&state.db, user.id).await?;
    Ok(ApiResponse::success(transaction_service::summarize(&rows)))
}
