//! HTTP publish endpoint.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/menu` | Publish a full tree. 200 receipt, 400 violations, 500 write error |
//! | `GET /api/menu` | Current canonical tree. 404 before the first publish |
//! | `GET /health` | Readiness probe for the test harness |
//!
//! Store operations block on the filesystem, so handlers run them on the
//! blocking pool. Requests are not serialized against each other; see the
//! [`store`](crate::store) docs for what concurrent publishes do.

use crate::store::{DiskBackend, MenuStore, PublishReceipt, StoreBackend, StoreError};
use crate::types::MenuTree;
use crate::validate::{self, Violation};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
pub struct AppState<B: StoreBackend = DiskBackend> {
    pub store: Arc<MenuStore<B>>,
}

impl<B: StoreBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<B: StoreBackend> AppState<B> {
    pub fn new(store: MenuStore<B>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {}", validate::summarize(.0))]
    Validation(Vec<Violation>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Load error: {0}")]
    Load(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(v) => ApiError::Validation(v),
            StoreError::Missing(_) | StoreError::NoBackup(_) => ApiError::NotFound(err.to_string()),
            StoreError::Load(msg) => ApiError::Load(msg),
            StoreError::Write(e) => ApiError::Write(e.to_string()),
            StoreError::Io(e) => ApiError::Internal(e.to_string()),
            StoreError::Json(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, violations) = match self {
            ApiError::Validation(v) => {
                tracing::warn!("Validation error: {}", message);
                (StatusCode::BAD_REQUEST, "ValidationError", v)
            }
            ApiError::NotFound(_) => {
                tracing::warn!("Not found: {}", message);
                (StatusCode::NOT_FOUND, "NotFoundError", vec![])
            }
            ApiError::Load(_) => {
                tracing::error!("Load error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "LoadError", vec![])
            }
            ApiError::Write(_) => {
                tracing::error!("Write error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "WriteError", vec![])
            }
            ApiError::Internal(_) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", vec![])
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            violations,
        });

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router<B: StoreBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/menu", get(read_menu::<B>).post(publish_menu::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on an already-bound listener until ctrl-c.
pub async fn run<B: StoreBackend + 'static>(
    listener: TcpListener,
    state: AppState<B>,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "menu endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

async fn read_menu<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
) -> Result<Json<MenuTree>, ApiError> {
    let store = Arc::clone(&state.store);
    let tree = tokio::task::spawn_blocking(move || store.read())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(tree))
}

async fn publish_menu<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<Json<PublishReceipt>, ApiError> {
    let tree: MenuTree = serde_json::from_slice(&body).map_err(|e| {
        ApiError::Validation(vec![Violation::Malformed {
            detail: e.to_string(),
        }])
    })?;
    let store = Arc::clone(&state.store);
    let receipt = tokio::task::spawn_blocking(move || store.publish(tree))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorePaths;
    use crate::store::backend::tests::FlakyBackend;
    use crate::test_helpers::{disk_store, sample_tree, setup_site};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_reports_version() {
        let site = setup_site();
        let app = router(AppState::new(disk_store(site.path())));
        let (status, body) = send(app, "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn get_returns_canonical_tree() {
        let site = setup_site();
        let app = router(AppState::new(disk_store(site.path())));
        let (status, body) = send(app, "GET", "/api/menu", "").await;
        assert_eq!(status, StatusCode::OK);
        let tree: MenuTree = serde_json::from_str(&body).unwrap();
        assert_eq!(tree, sample_tree());
    }

    #[tokio::test]
    async fn get_before_first_publish_is_404() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = router(AppState::new(disk_store(tmp.path())));
        let (status, body) = send(app, "GET", "/api/menu", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("NotFoundError"));
    }

    #[tokio::test]
    async fn post_publishes_and_returns_receipt() {
        let site = setup_site();
        let state = AppState::new(disk_store(site.path()));
        let payload = r#"{"en":[{"id":"home","label":"Home","url":"/"}]}"#;
        let (status, body) = send(router(state.clone()), "POST", "/api/menu", payload).await;
        assert_eq!(status, StatusCode::OK);

        let receipt: PublishReceipt = serde_json::from_str(&body).unwrap();
        assert_eq!(receipt.tree.items("en")[0].id, "home");
        assert_eq!(receipt.checksum.len(), 64);
        assert_eq!(state.store.read().unwrap(), receipt.tree);
    }

    #[tokio::test]
    async fn post_duplicate_ids_is_400_with_violations() {
        let site = setup_site();
        let state = AppState::new(disk_store(site.path()));
        let payload = r#"{"en":[{"id":"a","label":"A","url":"/"}],"he":[{"id":"a","label":"א","url":"/he"}]}"#;
        let (status, body) = send(router(state.clone()), "POST", "/api/menu", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let err: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(err.error, "ValidationError");
        assert_eq!(err.violations, vec![Violation::DuplicateId { id: "a".into() }]);
        assert_eq!(state.store.read().unwrap(), sample_tree());
        assert!(!state.store.paths().backup.exists());
    }

    #[tokio::test]
    async fn post_malformed_json_is_400() {
        let site = setup_site();
        let app = router(AppState::new(disk_store(site.path())));
        let (status, body) = send(app, "POST", "/api/menu", "{\"en\": [").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert!(matches!(err.violations[0], Violation::Malformed { .. }));
    }

    #[tokio::test]
    async fn post_with_disk_failure_is_500_and_keeps_file() {
        let site = setup_site();
        let paths = StorePaths::under(site.path());
        let store = MenuStore::new(paths.clone(), FlakyBackend::failing(&[&paths.canonical]));
        let state = AppState::new(store);
        let payload = r#"{"en":[{"id":"home","label":"Home","url":"/"}]}"#;
        let (status, body) = send(router(state.clone()), "POST", "/api/menu", payload).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("WriteError"));
        assert_eq!(state.store.read().unwrap(), sample_tree());
    }

    #[tokio::test]
    async fn get_malformed_file_is_500_load_error() {
        let site = setup_site();
        std::fs::write(site.path().join("data/menu.json"), "[]").unwrap();
        let app = router(AppState::new(disk_store(site.path())));
        let (status, body) = send(app, "GET", "/api/menu", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("LoadError"));
    }
}
