//! HTTP surface: directory, dispatch, health and the static pages

mod handlers;

use crate::config::Settings;
use crate::directory::{DirectoryService, PageQuery};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::slack::SlackApi;
use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use handlers::{
    answer_options, handle_auth, handle_directory, handle_dispatch, handle_health,
    handle_not_found,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

/// Shared state for every request
pub struct AppState {
    pub api: Arc<dyn SlackApi>,
    pub directory: DirectoryService,
    pub dispatcher: Dispatcher,
    pub static_dir: PathBuf,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(api: Arc<dyn SlackApi>, settings: &Settings) -> Self {
        let query = PageQuery::from_config(&settings.directory, &settings.slack);

        Self {
            directory: DirectoryService::new(api.clone(), &settings.directory, query),
            dispatcher: Dispatcher::new(api.clone(), &settings.dispatch),
            api,
            static_dir: settings.server.static_dir.clone(),
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let index = ServeFile::new(state.static_dir.join("index.html"));
    let scheduler = ServeFile::new(state.static_dir.join("message-scheduler.html"));

    Router::new()
        .route("/directory", get(handle_directory))
        .route("/dispatch", post(handle_dispatch))
        .route("/health", get(handle_health))
        .route("/auth", get(handle_auth))
        .route_service("/", index)
        .route_service("/scheduler", scheduler)
        .fallback(handle_not_found)
        .layer(from_fn(answer_options))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve(
    bind: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "HTTP server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
