//! Liveness endpoints for the hosting platform

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct LivenessState {
    started: Instant,
}

impl LivenessState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for LivenessState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    timestamp: String,
    uptime: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: f64,
}

async fn status_handler(State(state): State<LivenessState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime(),
    })
}

async fn health_handler(State(state): State<LivenessState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime: state.uptime(),
    })
}

pub fn router(state: LivenessState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the liveness endpoints until `shutdown` resolves
pub async fn serve<S>(listener: TcpListener, state: LivenessState, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Liveness server listening on {}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Liveness server error")?;

    info!("Liveness server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(LivenessState::new())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_reports_status_timestamp_uptime() {
        let (status, body) = get_json("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let (status, body) = get_json("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime"].is_number());
        assert!(body.get("timestamp").is_none());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router(LivenessState::new())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, LivenessState::new(), async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
