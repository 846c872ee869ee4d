//! # specgate-server: Binary Entry Point
//!
//! Starts the validation gateway. Reads the validation config named by
//! `SPECGATE_CONFIG` (default `specs/validation.yaml`) and binds to `PORT`
//! (default 8080). Business handlers are mounted by embedding crates via
//! [`specgate_api::app`]; this binary answers every validated route with
//! 404 once it passes the request stage.

use std::path::PathBuf;

use axum::Router;
use specgate_api::error::AppError;
use specgate_schema::DEFAULT_CONFIG_PATH;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config_path = std::env::var("SPECGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let state = specgate_api::bootstrap::bootstrap(&config_path).map_err(|e| {
        tracing::error!(config = %config_path.display(), "Bootstrap failed: {e}");
        e
    })?;

    let api = Router::new().fallback(no_handler);
    let app = specgate_api::app(state, api);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("specgate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn no_handler(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(format!("no handler mounted for {}", uri.path()))
}
