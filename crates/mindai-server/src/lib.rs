use std::sync::Arc;

use axum::Router;
use mindai_core::{HttpTransport, ProviderRouter};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProviderRouter>,
    pub transport: Arc<dyn HttpTransport>,
}

/// The full service with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
