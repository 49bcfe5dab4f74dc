// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod config;
pub mod http;
mod middleware;
pub mod store;
mod telemetry;

use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use marketpulse_api::ApiError;
use marketpulse_query::StoreMetadata;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub use config::ServerConfig;
pub use store::{MarketStore, StoreError};
pub use telemetry::metrics::RequestMetrics;

pub const CRATE_NAME: &str = "marketpulse-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MarketStore>,
    pub config: Arc<ServerConfig>,
    pub metrics: Arc<RequestMetrics>,
    pub(crate) ready: Arc<AtomicBool>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
    pub(crate) started: Instant,
}

impl AppState {
    /// Starts not ready; see [`AppState::confirm_ready`].
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let store = MarketStore::new(
            config.db_path.clone(),
            config.max_connections,
            config.request_timeout,
        );
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            metrics: Arc::new(RequestMetrics::default()),
            ready: Arc::new(AtomicBool::new(false)),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Marks the service ready once the store reports a completed load.
    pub async fn confirm_ready(&self) -> Result<StoreMetadata, StoreError> {
        let meta = self.store.metadata().await?;
        if !meta.load_completed {
            return Err(StoreError::Unavailable(
                "store has no completed load".to_string(),
            ));
        }
        self.ready.store(true, Ordering::Relaxed);
        info!(
            companies = meta.companies_rows,
            index_points = meta.index_history_rows,
            sectors = meta.sector_stats_rows,
            "store ready"
        );
        Ok(meta)
    }
}

async fn fallback_handler() -> Response {
    http::response_contract::api_error_response(ApiError::not_found(
        "route not found",
        json!({}),
    ))
}

pub fn build_router(state: AppState) -> Router {
    use http::handlers;
    Router::new()
        .route("/", get(handlers::landing_handler))
        .route("/health", get(handlers::health_handler))
        .route("/readyz", get(handlers::readyz_handler))
        .route("/metrics", get(telemetry::metrics::metrics_handler))
        .route("/v1/openapi.json", get(handlers::openapi_handler))
        .route("/companies", get(handlers::companies_handler))
        .route("/company/:symbol", get(handlers::company_handler))
        .route("/sectors", get(handlers::sectors_handler))
        .route(
            "/sector/:sector/companies",
            get(handlers::sector_companies_handler),
        )
        .route("/index", get(handlers::index_handler))
        .fallback(fallback_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .with_state(state)
}
