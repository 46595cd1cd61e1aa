//! services/api/src/web/stats.rs
//!
//! The read-only statistics endpoint. Everything is computed on demand from
//! the caller's ledger, so the numbers always reflect the current state.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use booktrack_core::domain::Stats;
use booktrack_core::stats::compute_stats;

use crate::error::ApiError;
use crate::web::middleware::AuthedUser;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_books: u32,
    pub books_read: u32,
    pub books_reading: u32,
    pub books_to_read: u32,
    pub total_pages_read: i64,
    pub average_progress: f64,
    /// Completion histogram keyed by "YYYY-MM" of the finish date.
    pub books_by_month: BTreeMap<String, u32>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            total_books: stats.total_books,
            books_read: stats.books_read,
            books_reading: stats.books_reading,
            books_to_read: stats.books_to_read,
            total_pages_read: stats.total_pages_read,
            average_progress: stats.average_progress,
            books_by_month: stats.books_by_month,
        }
    }
}

/// GET /api/stats - Summary statistics over the caller's ledger
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Aggregate reading statistics", body = StatsResponse),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn get_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let books = state.db.list_books(owner_id, None).await?;
    let stats = compute_stats(&books);
    Ok(Json(StatsResponse::from(stats)))
}
