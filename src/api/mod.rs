pub mod challenge;
pub mod types;

use axum::{Extension, Router, routing::{get, post}};
use tower_http::trace::TraceLayer;
use crate::SharedState;

pub fn create_router(state: SharedState) -> Router {
    use crate::api::challenge;

    Router::new()
        .route("/healthz", get(challenge::healthz))
        .route("/apis/{group}/v1alpha1", get(challenge::api_resources))
        .route("/apis/{group}/v1alpha1/{solver}", post(challenge::solve))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
