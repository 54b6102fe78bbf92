//! Router assembly
//!
//! Everything is served on one port:
//! - `GET /health`, `POST /upload` ([`api`])
//! - `GET /ws`, the listening socket ([`ws`])
//! - any other path falls through to static files under `public_dir`

use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub mod api;
pub mod ws;

/// Build the complete application router
///
/// Global layers (CORS, rate limiting, security headers) are added by the
/// binary on top of this.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .merge(api::create_api_router(&state))
        .merge(ws::create_ws_router(state.clone()))
        .fallback_service(static_files)
        .with_state(state)
}
