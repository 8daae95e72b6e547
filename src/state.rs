//! Shared, read-only state handed to every handler.

use crate::{
    config::AppConfig,
    services::{
        assets::LocalAssets, blob_store::BlobStore, media::MediaTool,
        video_repository::VideoRepository,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub videos: VideoRepository,
    pub assets: LocalAssets,
    pub blobs: BlobStore,
    pub media: Arc<dyn MediaTool>,
}
