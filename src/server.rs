use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::error::{Result, ServeError};

/// Start the prediction server and run until Ctrl-C.
pub async fn start_api_server(config: &AppConfig, state: AppState) -> Result<()> {
    if config.model.preload {
        preload_model(&state).await;
    }

    let app = create_router(state, &config.server.predict_path);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("ISL predict server listening on http://{}", addr);
    info!("  POST {} - hand landmarks -> letter", config.server.predict_path);
    info!("  GET  {} - health check", config.server.predict_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServeError::Internal(format!("API server error: {}", e)))?;

    info!("server stopped");
    Ok(())
}

/// Try to load the model before accepting traffic. A failure is not fatal:
/// the handle retries on every request until a load succeeds.
pub async fn preload_model(state: &AppState) {
    match state.model().acquire().await {
        Ok(model) => info!(input = ?model.expected_input, "model preloaded"),
        Err(e) => warn!(error = %e, "model preload failed; will retry per request"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
