//! Progress handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::progress::ProgressStore;

/// `GET /scans/:scan_id`: latest progress update, or 404 when unknown or expired.
pub async fn scan_progress_handler(
    State(store): State<ProgressStore>,
    Path(scan_id): Path<String>,
) -> Response {
    match store.get_progress(&scan_id) {
        Some(update) => Json(update).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown scan id", "scan_id": scan_id })),
        )
            .into_response(),
    }
}
