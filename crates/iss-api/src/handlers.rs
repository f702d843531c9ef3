//! REST API endpoint handlers.
//!
//! All handlers read through the shared [`EpochStore`](iss_core::EpochStore)
//! in [`AppState`]. Each one triggers the dataset load if it has not
//! happened yet.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/epochs` | Epochs in a window (`?offset=N&limit=M`) |
//! | `GET` | `/epochs/{epoch}` | Single epoch by exact timestamp |
//! | `GET` | `/epochs/{epoch}/speed` | Speed at that epoch |
//! | `GET` | `/now` | Epoch closest to the current time, with its speed |
//! | `GET` | `/data_time_range` | Declared start/stop of the dataset |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use iss_core::{Speed, Window};
use iss_types::{TimeRange, Timestamp};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter and response structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /epochs` endpoint.
///
/// Both are taken as text so that malformed values reach
/// [`Window::parse`] and produce the store's own error message.
#[derive(Debug, serde::Deserialize)]
pub struct EpochsQuery {
    /// Rank of the first epoch returned (default 0).
    pub offset: Option<String>,
    /// Maximum number of epochs returned (default: all remaining).
    pub limit: Option<String>,
}

/// Body of the `GET /now` response.
#[derive(Debug, Serialize)]
pub struct NowResponse {
    /// Timestamp of the epoch closest to the request time.
    pub closest_epoch: Timestamp,
    /// Speed at that epoch.
    pub closest_speed: f64,
    /// Unit of `closest_speed`.
    pub unit: &'static str,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing whether the dataset is loaded and
/// linking the API endpoints.
///
/// Does not trigger a load.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.store.is_loaded() {
        "LOADED"
    } else {
        "NOT LOADED YET"
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>ISS Tracker</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>ISS Tracker</h1>
    <p class="subtitle">Trajectory state vectors of the International Space Station</p>

    <p>Dataset: <span class="status">{status}</span></p>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/epochs">/epochs</a> -- All epochs (?offset=N&amp;limit=M)</li>
        <li>/epochs/{{epoch}} -- Single epoch, e.g. 2025-104T12:20:00.000Z</li>
        <li>/epochs/{{epoch}}/speed -- Speed at that epoch in km/s</li>
        <li><a href="/now">/now</a> -- Epoch closest to the current time</li>
        <li><a href="/data_time_range">/data_time_range</a> -- Time span covered by the data</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /epochs -- windowed list
// ---------------------------------------------------------------------------

/// List epochs in timestamp order.
///
/// # Query Parameters
///
/// - `offset`: rank of the first epoch, 0-based (default 0)
/// - `limit`: maximum number of epochs (default: all remaining)
pub async fn list_epochs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EpochsQuery>,
) -> Result<Response, ApiError> {
    let window = Window::parse(params.offset.as_deref(), params.limit.as_deref())?;
    let epochs = state.store.list_window(window).await?;
    Ok(Json(epochs).into_response())
}

// ---------------------------------------------------------------------------
// GET /epochs/{epoch} -- exact lookup
// ---------------------------------------------------------------------------

/// Return the epoch whose timestamp matches the path segment exactly.
///
/// The nearest epoch is never substituted for a missing one.
pub async fn get_epoch(
    State(state): State<Arc<AppState>>,
    Path(epoch): Path<String>,
) -> Result<Response, ApiError> {
    let found = state.store.get_exact(&epoch).await?;
    Ok(Json(found).into_response())
}

// ---------------------------------------------------------------------------
// GET /epochs/{epoch}/speed
// ---------------------------------------------------------------------------

/// Return the speed of the epoch whose timestamp matches exactly.
pub async fn get_epoch_speed(
    State(state): State<Arc<AppState>>,
    Path(epoch): Path<String>,
) -> Result<Json<Speed>, ApiError> {
    Ok(Json(state.store.get_speed(&epoch).await?))
}

// ---------------------------------------------------------------------------
// GET /now -- nearest to the wall clock
// ---------------------------------------------------------------------------

/// Return the epoch closest to the time the request is handled, and the
/// speed at that epoch.
pub async fn now(State(state): State<Arc<AppState>>) -> Result<Json<NowResponse>, ApiError> {
    let instant = Utc::now();
    let epoch = state.store.get_nearest(instant).await?;
    let speed = Speed::of(epoch);

    Ok(Json(NowResponse {
        closest_epoch: epoch.timestamp,
        closest_speed: speed.speed,
        unit: speed.unit,
    }))
}

// ---------------------------------------------------------------------------
// GET /data_time_range
// ---------------------------------------------------------------------------

/// Return the dataset's declared start and stop, split into year, day of
/// year and time of day, plus a one-sentence summary.
pub async fn data_time_range(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimeRange>, ApiError> {
    let range = state.store.time_range_summary().await?;
    Ok(Json(range))
}
