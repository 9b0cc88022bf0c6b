//! HTTP surface: the metrics endpoint and a liveness probe.
//!
//! The export path is read-only and performs no network I/O of its own, so
//! a scrape always answers within the puller's timeout with whatever data
//! the refresh tasks have published so far.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::exporter::{self, Snapshot};
use crate::store::SnapshotStore;

pub fn router(store: Arc<SnapshotStore>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(store)
}

async fn metrics(State(store): State<Arc<SnapshotStore>>) -> impl IntoResponse {
    let snapshot = Snapshot::take(&store).await;
    (
        [(CONTENT_TYPE, exporter::CONTENT_TYPE)],
        exporter::render(&snapshot),
    )
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn serve(listener: TcpListener, store: Arc<SnapshotStore>) -> Result<()> {
    info!(addr = %listener.local_addr()?, "serving metrics");
    axum::serve(listener, router(store)).await?;
    Ok(())
}
