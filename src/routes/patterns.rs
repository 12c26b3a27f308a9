//! Pattern routes: authoring (Maker), test mode (Maker|Checker), and
//! review (Checker).

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{RequireChecker, RequireMaker, RequireReviewerOrMaker};
use crate::models::extraction::ExtractionResult;
use crate::models::pattern::{CreatePattern, Pattern, PatternStatus, SavePattern};
use crate::models::user::UserRole;
use crate::services::extraction as extraction_service;
use crate::services::pattern::{self as pattern_service, ReviewVerdict};
use crate::AppState;

fn match_budget(state: &AppState) -> Duration {
    Duration::from_millis(state.config.match_timeout_ms)
}

#[derive(Debug, Deserialize, Validate)]
pub struct TestPatternRequest {
    #[validate(length(min = 1, message = "expression is required"))]
    pub expression: String,
    #[validate(length(min = 1, message = "sample_text is required"))]
    pub sample_text: String,
}

/// POST /api/v1/patterns/test — run a bare expression against a sample SMS.
/// Compile errors and evaluation timeouts are surfaced, not folded into
/// "no match".
pub async fn test(
    State(state): State<AppState>,
    RequireReviewerOrMaker(_actor): RequireReviewerOrMaker,
    Json(body): Json<TestPatternRequest>,
) -> Result<Json<ApiResponse<ExtractionResult>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let result = extraction_service::test_pattern(
        &body.expression,
        &body.sample_text,
        match_budget(&state),
    )
    .await?;
    Ok(ApiResponse::success(result))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckPatternRequest {
    #[validate(length(min = 1, message = "sms_title is required"))]
    pub sms_title: String,
    #[validate(length(min = 1, message = "sms is required"))]
    pub sms: String,
}

/// POST /api/v1/patterns/check — does an approved pattern already cover this
/// SMS? Resolution without side effects, for a maker deciding whether a new
/// pattern is needed.
pub async fn check(
    State(state): State<AppState>,
    RequireMaker(_maker): RequireMaker,
    Json(body): Json<CheckPatternRequest>,
) -> Result<Json<ApiResponse<ExtractionResult>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let resolution = extraction_service::find_pattern(
        &state.db,
        &body.sms_title,
        &body.sms,
        match_budget(&state),
    )
    .await?;
    Ok(ApiResponse::success(resolution.result))
}

/// POST /api/v1/patterns — create a pattern as DRAFT or PENDING.
pub async fn create(
    State(state): State<AppState>,
    RequireMaker(maker): RequireMaker,
    Json(body): Json<CreatePattern>,
) -> Result<Json<ApiResponse<Pattern>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let pattern = pattern_service::create(&state.db, maker.id, &body).await?;
    Ok(ApiResponse::success(pattern))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: PatternStatus,
}

/// GET /api/v1/patterns?status=... — Makers see their own rows (plus
/// unowned FAILED ones to adopt); Checkers see the full queue.
pub async fn list(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Pattern>>>, AppError> {
    let owner_scope = match current_user.role {
        UserRole::Maker => Some(current_user.id),
        UserRole::Checker | UserRole::Admin => None,
        UserRole::User => {
            return Err(AppError::Forbidden(
                "Maker or checker access required".to_string(),
            ))
        }
    };
    let patterns = pattern_service::list_by_status(&state.db, query.status, owner_scope).await?;
    Ok(ApiResponse::success(patterns))
}

/// PUT /api/v1/patterns/{id} — edit an editable pattern; lands in DRAFT.
pub async fn update(
    State(state): State<AppState>,
    RequireMaker(maker): RequireMaker,
    Path(id): Path<Uuid>,
    Json(body): Json<SavePattern>,
) -> Result<Json<ApiResponse<Pattern>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let pattern =
        pattern_service::update(&state.db, id, maker.id, &body, PatternStatus::Draft).await?;
    Ok(ApiResponse::success(pattern))
}

/// PUT /api/v1/patterns/{id}/submit — submit for review; lands in PENDING.
pub async fn submit(
    State(state): State<AppState>,
    RequireMaker(maker): RequireMaker,
    Path(id): Path<Uuid>,
    Json(body): Json<SavePattern>,
) -> Result<Json<ApiResponse<Pattern>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let pattern =
        pattern_service::update(&state.db, id, maker.id, &body, PatternStatus::Pending).await?;
    Ok(ApiResponse::success(pattern))
}

/// POST /api/v1/patterns/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireChecker(checker): RequireChecker,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Pattern>>, AppError> {
    let pattern =
        pattern_service::review(&state.db, id, checker.id, ReviewVerdict::Approve).await?;
    Ok(ApiResponse::success(pattern))
}

/// POST /api/v1/patterns/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    RequireChecker(checker): RequireChecker,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Pattern>>, AppError> {
    let pattern = pattern_service::review(&state.db, id, checker.id, ReviewVerdict::Reject).await?;
    Ok(ApiResponse::success(pattern))
}
