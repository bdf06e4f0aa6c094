//! HTTP status server for polling scan progress.
//!
//! Provides one endpoint:
//! - `/scans/:scan_id` - latest progress update of a scan, as JSON
//!
//! The server runs in the background and does not block scanning.

mod handlers;

use axum::routing::get;
use axum::Router;

use handlers::scan_progress_handler;

use crate::progress::ProgressStore;

/// Router serving `store`.
pub fn status_router(store: ProgressStore) -> Router {
    Router::new()
        .route("/scans/:scan_id", get(scan_progress_handler))
        .with_state(store)
}

/// Serves the status endpoint on an already-bound listener.
pub async fn serve_status(
    listener: tokio::net::TcpListener,
    store: ProgressStore,
) -> Result<(), anyhow::Error> {
    axum::serve(listener, status_router(store))
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))
}

/// Creates and starts the status server on `127.0.0.1:{port}`.
pub async fn start_status_server(port: u16, store: ProgressStore) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;

    log::info!("Status server listening on http://127.0.0.1:{}/", port);
    log::info!("  - Progress: http://127.0.0.1:{}/scans/<scan_id>", port);

    serve_status(listener, store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressSink, ProgressUpdate};

    async fn spawn(store: ProgressStore) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_status(listener, store));
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_known_scan_returns_progress() {
        let store = ProgressStore::new();
        store.report_progress("abc", ProgressUpdate::running("search", 1, 2, "querying"));
        let base = spawn(store).await;

        let response = reqwest::get(format!("{}/scans/abc", base)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["phase"], "search");
        assert_eq!(body["current"], 1);
    }

    #[tokio::test]
    async fn test_unknown_scan_is_404() {
        let base = spawn(ProgressStore::new()).await;
        let response = reqwest::get(format!("{}/scans/missing", base)).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_port_binding_failure_is_an_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let err = start_status_server(port, ProgressStore::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
