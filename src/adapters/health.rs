//! Liveness endpoint on the container's declared port.

use crate::core::catalog::Catalog;
use crate::utils::error::{BotError, Result};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub venues: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

async fn health(State(catalog): State<Catalog>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        venues: catalog.len().await,
        loaded_at: catalog.loaded_at().await,
    })
}

pub fn router(catalog: Catalog) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(catalog)
}

/// Serves `/health` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    catalog: Catalog,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("✅ Health endpoint listening on {}", addr);

    axum::serve(listener, router(catalog))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(BotError::IoError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Venue;

    #[tokio::test]
    async fn test_health_reports_catalog_size() {
        let catalog = Catalog::with_venues(vec![Venue::from_pairs([("name", "A")])]);
        let Json(report) = health(State(catalog)).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.venues, 1);
        assert!(report.loaded_at.is_some());
    }

    #[tokio::test]
    async fn test_serve_answers_over_http() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(addr, Catalog::new(), async move {
            let _ = rx.await;
        }));

        let url = format!("http://{}/health", addr);
        let mut body = None;
        for _ in 0..50 {
            if let Ok(response) = reqwest::get(&url).await {
                body = Some(response.json::<serde_json::Value>().await.unwrap());
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let body = body.expect("health endpoint never came up");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["venues"], 0);

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
