//! Thumbnail and video upload service.
//!
//! Thumbnails are written to a local assets directory and served back under
//! `/assets`; videos are probed, remuxed for fast start and pushed to object
//! storage. Both paths finish by recording the asset URL on the video record.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use state::AppState;

/// Router with state attached, ready to serve.
pub fn app(state: AppState) -> Router {
    let assets_root = state.assets.root().to_path_buf();
    routes::routes::routes(&assets_root).with_state(state)
}
