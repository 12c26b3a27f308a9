//! Route definitions for the smsledger API.

pub mod auth;
pub mod extraction;
pub mod health;
pub mod patterns;
pub mod transactions;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

/// Assemble the full API router under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    let v1 = Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/users", post(auth::create_user))
        // Pattern authoring and review
        .route("/patterns/test", post(patterns::test))
        .route("/patterns/check", post(patterns::check))
        .route("/patterns", post(patterns::create).get(patterns::list))
        .route("/patterns/{id}", put(patterns::update))
        .route("/patterns/{id}/submit", put(patterns::submit))
        .route("/patterns/{id}/approve", post(patterns::approve))
        .route("/patterns/{id}/reject", post(patterns::reject))
        // Runtime extraction
        .route("/extract", post(extraction::extract))
        .route("/extract/bulk", post(extraction::extract_bulk))
        // Ledger
        .route(
            "/transactions",
            post(transactions::save).get(transactions::list),
        )
        .route("/transactions/summary", get(transactions::summary));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", v1)
}
