use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, upload};
use crate::state::AppState;
use std::sync::Arc;

/// Create the plain HTTP router
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route(
            "/upload",
            post(upload::upload_recording)
                .layer(DefaultBodyLimit::max(state.config.max_upload_size_bytes)),
        )
        .layer(TraceLayer::new_for_http())
}
