//! Axum router construction for the API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! and per-request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the API server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /epochs` -- windowed list of epochs (`?offset=&limit=`)
/// - `GET /epochs/{epoch}` -- single epoch by exact timestamp
/// - `GET /epochs/{epoch}/speed` -- speed at that epoch
/// - `GET /now` -- epoch closest to the current wall-clock time
/// - `GET /data_time_range` -- declared coverage of the dataset
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/epochs", get(handlers::list_epochs))
        .route("/epochs/{epoch}", get(handlers::get_epoch))
        .route("/epochs/{epoch}/speed", get(handlers::get_epoch_speed))
        .route("/now", get(handlers::now))
        .route("/data_time_range", get(handlers::data_time_range))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
