pub mod chat_request;
pub mod handlers;
pub mod streaming;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::providers::ChatBackend;

#[derive(Clone)]
pub struct AppState {
    /// Shared by all requests; see `ChatBackend` for the concurrency contract.
    pub backend: Arc<dyn ChatBackend>,
}

pub fn create_app(config: &Settings, backend: Arc<dyn ChatBackend>) -> Router {
    tracing::info!(
        "Forwarding {} to mesh service at {}",
        handlers::CHAT_COMPLETIONS_PATH,
        config.mesh.endpoint_uri()
    );

    let app_state = AppState { backend };

    handlers::routes()
        .with_state(Arc::new(app_state))
        .layer(TraceLayer::new_for_http())
}
