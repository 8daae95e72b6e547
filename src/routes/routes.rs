//! Defines routes for the upload API.
//!
//! ## Structure
//! - **Uploads** (multipart, `Authorization: Bearer <token>`)
//!   - `POST /api/thumbnail_upload/{video_id}` — field `thumbnail`, 10 MiB cap
//!   - `POST /api/video_upload/{video_id}` — field `video`, 1 GiB cap
//!
//! - **Assets**
//!   - `GET  /assets/{file}` — stored thumbnails, served from the assets root
//!
//! - **Probes**
//!   - `GET  /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{upload_thumbnail, upload_video},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Largest accepted thumbnail request.
pub const THUMBNAIL_MAX_BYTES: usize = 10 << 20;
/// Largest accepted video request.
pub const VIDEO_MAX_BYTES: usize = 1 << 30;

/// Build the router; the caller attaches `AppState` with `with_state`.
pub fn routes(assets_root: &Path) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(upload_thumbnail).layer(DefaultBodyLimit::max(THUMBNAIL_MAX_BYTES)),
        )
        .route(
            "/api/video_upload/{video_id}",
            post(upload_video).layer(DefaultBodyLimit::max(VIDEO_MAX_BYTES)),
        )
        .nest_service("/assets", ServeDir::new(assets_root))
}
