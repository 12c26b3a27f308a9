//! Runtime extraction routes for end users.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireUser;
use crate::models::extraction::{BatchReport, ExtractionResult, SmsItem};
use crate::services::batch as batch_service;
use crate::services::extraction as extraction_service;
use crate::services::pattern as pattern_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ExtractRequest {
    #[validate(length(min = 1, message = "sms_title is required"))]
    pub sms_title: String,
    #[validate(length(min = 1, message = "sms is required"))]
    pub sms: String,
}

/// POST /api/v1/extract — resolve against approved patterns. A miss records
/// the SMS as a FAILED pattern row for maker attention before responding.
pub async fn extract(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(body): Json<ExtractRequest>,
) -> Result<Json<ApiResponse<ExtractionResult>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let budget = Duration::from_millis(state.config.match_timeout_ms);
    let resolution =
        extraction_service::find_pattern(&state.db, &body.sms_title, &body.sms, budget).await?;

    if !resolution.result.matched {
        pattern_service::record_failed_sms(
            &state.db,
            &body.sms_title,
            &body.sms,
            resolution.bank_id,
        )
        .await?;
    }

    Ok(ApiResponse::success(resolution.result))
}

#[derive(Debug, Deserialize)]
pub struct BulkExtractRequest {
    pub items: Vec<SmsItem>,
}

/// POST /api/v1/extract/bulk — batch extraction with per-item isolation.
/// Item-level problems become failed results; only an unparseable payload
/// fails the call.
pub async fn extract_bulk(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(body): Json<BulkExtractRequest>,
) -> Result<Json<ApiResponse<BatchReport>>, AppError> {
    let budget = Duration::from_millis(state.config.match_timeout_ms);
    let report = batch_service::extract_batch(
        &state.db,
        body.items,
        state.config.bulk_concurrency,
        budget,
    )
    .await?;
    Ok(ApiResponse::success(report))
}
