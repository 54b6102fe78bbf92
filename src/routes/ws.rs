//! Listening socket route
//!
//! `GET /ws` upgrades to a WebSocket. After the upgrade the server pushes the
//! current listening state, then:
//!
//! - text frames are control messages
//!   (`{"type":"toggle-listen","status":"Listening...","userId":"u1"}`);
//!   every accepted toggle is pushed to all connected clients as
//!   `{"status":"Listening...","userId":"u1"}`
//! - binary frames are raw audio, appended to this connection's capture file

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::listen_handler;
use crate::middleware::connection_limit_middleware;
use crate::state::AppState;
use std::sync::Arc;

pub fn create_ws_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(listen_handler))
        .layer(middleware::from_fn_with_state(
            state,
            connection_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
