use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::state::AppState;

/// Body of the keep-alive root route
pub const KEEP_ALIVE_BODY: &str = "Bot is running!";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ledger_entries: usize,
}

/// Bind `bind_addr` and serve the keep-alive routes until `shutdown` fires.
pub async fn run(
    state: Arc<AppState>,
    bind_addr: &str,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Keep-alive server listening on {}", bind_addr);

    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn root_handler() -> &'static str {
    KEEP_ALIVE_BODY
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger_entries: state.ledger.len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use avenger_core::Settings;
    use avenger_ledger::{LedgerStore, PointsLedger, UserId};

    #[tokio::test]
    async fn serves_keep_alive_and_health() {
        let ledger = Arc::new(LedgerStore::with_ledger("unused.json", PointsLedger::new()));
        ledger.add(&UserId::from("U1"), 4).await;
        let state = Arc::new(AppState::new(ledger, Settings::default()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        let server = tokio::spawn(serve(listener, state, rx));

        let client = reqwest::Client::new();
        let body = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, KEEP_ALIVE_BODY);

        let health: serde_json::Value = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["ledger_entries"], 1);

        tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }
}
