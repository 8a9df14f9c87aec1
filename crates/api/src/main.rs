//! memberhook API Server
//!
//! Receives membership platform webhooks and answers with the records the
//! platform expects.

use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tower_http::trace::TraceLayer;

use memberhook_api::{create_router, telemetry, AppState, Config};

/// Time in-flight requests get to finish after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _log_guard = telemetry::init(&config)?;

    tracing::info!("Starting memberhook API Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        custom_field_id = config.custom_field_id,
        log_payloads = config.log_payloads,
        "Configuration loaded"
    );

    let state = AppState::new(config);
    log_stored_profiles(&state).await;

    let addr = state.config.bind_address;
    let tls = state.config.tls.clone();
    let app = create_router(state).layer(TraceLayer::new_for_http());

    match tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            let handle = Handle::new();
            tokio::spawn(shutdown_on_signal(handle.clone()));

            tracing::info!("Starting HTTPS server on {}", addr);
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("Starting server on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Log how many profiles the store already holds
async fn log_stored_profiles(state: &AppState) {
    let Some(store) = state.store() else {
        return;
    };
    match tokio::time::timeout(state.config.store_timeout(), store.scan_all_keys()).await {
        Ok(Ok(keys)) => tracing::info!(profiles = keys.len(), "Profile store reachable"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Profile store unreachable at startup"),
        Err(_) => tracing::warn!("Profile store scan timed out at startup"),
    }
}

async fn shutdown_on_signal(handle: Handle) {
    shutdown_signal().await;
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
