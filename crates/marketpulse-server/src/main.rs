// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use marketpulse_ingest::{initialize, LoadOptions};
use marketpulse_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);

    let opts = LoadOptions::from_assets_dir(&config.assets_dir, &config.db_path, config.rebuild);
    let report = tokio::task::spawn_blocking(move || initialize(&opts))
        .await
        .map_err(|e| format!("load task failed: {e}"))?
        .map_err(|e| {
            error!(code = ?e.code, "store initialization failed: {e}");
            e.to_string()
        })?;
    info!(
        db_path = %report.db_path.display(),
        skipped = report.skipped,
        companies = report.companies,
        index_points = report.index_points,
        sectors = report.sectors,
        "store initialized"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config);
    state
        .confirm_ready()
        .await
        .map_err(|e| format!("store not ready after load: {e}"))?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("marketpulse-server listening on {bind_addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
