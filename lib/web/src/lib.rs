use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

mod compose;
mod config;
mod error;
mod files;
mod state;

use crate::compose::handle_compose;
use crate::files::{handle_blank_config, handle_file, handle_index};
pub use config::{ServeConfig, ServerConfig};
pub use error::ComposeServerError;
pub use state::AppState;

/// Loads everything the web app needs and serves it until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let serve_config = ServeConfig::load(&config.input, &config.serve_config)?;
    let app_state = AppState::prepare(
        &config.input,
        &config.main_config,
        &serve_config,
        config.pages.as_deref(),
    )?;

    let app = create_router(app_state);
    let app = if config.cors {
        app.layer(tower_http::cors::CorsLayer::permissive())
    } else {
        app
    };

    let listener = tokio::net::TcpListener::bind((serve_config.host(), serve_config.port)).await?;
    let host = if serve_config.address.is_empty() {
        "localhost"
    } else {
        serve_config.address.as_str()
    };
    info!(
        "Ready. HTTP server address is http://{host}:{}/",
        listener.local_addr()?.port()
    );
    Ok(axum::serve(listener, app).await?)
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/blank_compose.json", get(handle_blank_config))
        .route("/compose", post(handle_compose).fallback(handle_file))
        .fallback(handle_file)
        .with_state(app_state)
        .layer(DefaultBodyLimit::disable())
}
