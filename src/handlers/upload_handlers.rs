//! HTTP handlers for thumbnail and video uploads.
//!
//! Both handlers run the same prelude (path id, bearer token, ownership)
//! before touching the multipart body, then hand storage concerns to the
//! services in `AppState`. Any failure aborts the rest of the pipeline.

use crate::{
    errors::AppError,
    models::video::Video,
    services::{
        assets::{self, THUMBNAIL_MEDIA_TYPES, VIDEO_MEDIA_TYPES},
        auth,
        media::{ScratchPath, StoragePrefix},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use bytes::Bytes;
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";
/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// Prefix of the spooled upload in the system temp directory.
const UPLOAD_TEMP_PREFIX: &str = "tubely-upload";

/// POST `/api/thumbnail_upload/{video_id}` — store an image and link it.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut video = authorize(&state, &video_id, &headers).await?;
    info!(video_id = %video.id, user_id = %video.user_id, "uploading thumbnail");

    let (media_type, data) = read_thumbnail(multipart?).await?;
    let stored = state.assets.store(&data, &media_type).await?;
    debug!(file = %stored.file_name, size = data.len(), "thumbnail written");

    video.thumbnail_url = Some(stored.url);
    if let Err(err) = state.videos.update_video(&video).await {
        if let Err(cleanup) = state.assets.remove(&stored.file_name).await {
            warn!(file = %stored.file_name, error = %cleanup, "orphaned thumbnail left on disk");
        }
        return Err(err.into());
    }

    Ok(Json(json!({})))
}

/// POST `/api/video_upload/{video_id}` — normalize, upload and link a video.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, AppError> {
    let mut video = authorize(&state, &video_id, &headers).await?;
    info!(video_id = %video.id, user_id = %video.user_id, "uploading video");

    let (media_type, upload) = spool_video(multipart?).await?;

    let aspect_ratio = state.media.probe_aspect_ratio(upload.path()).await?;
    let prefix = StoragePrefix::classify(&aspect_ratio);
    debug!(aspect_ratio = %aspect_ratio, prefix = %prefix, "classified video");

    let processed = ScratchPath::new(state.media.remux_fast_start(upload.path()).await?);
    drop(upload);

    let key = format!("{}/{}.mp4", prefix, assets::generate_name());
    state
        .blobs
        .upload_file(&key, processed.path(), &media_type)
        .await?;
    drop(processed);

    video.video_url = Some(state.blobs.public_url(&key));
    match state.videos.update_video(&video).await {
        Ok(updated) => Ok(Json(updated)),
        Err(err) => {
            if let Err(cleanup) = state.blobs.delete(&key).await {
                warn!(key = %key, error = %cleanup, "orphaned video left in object storage");
            }
            Err(err.into())
        }
    }
}

/// Resolve the caller and load the video they are allowed to modify.
async fn authorize(state: &AppState, raw_id: &str, headers: &HeaderMap) -> Result<Video, AppError> {
    let video_id = Uuid::parse_str(raw_id).map_err(|_| AppError::bad_request("Invalid ID"))?;

    let token = auth::bearer_token(headers)?;
    let user_id = auth::validate_jwt(token, &state.config.jwt_secret)?;

    let video = state.videos.get_video(video_id).await?;
    if !video.is_owned_by(user_id) {
        warn!(video_id = %video_id, user_id = %user_id, "upload rejected: not the owner");
        return Err(AppError::unauthorized("Not your video"));
    }
    Ok(video)
}

/// Read the thumbnail field fully into memory.
async fn read_thumbnail(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }
        let media_type = assets::validate_media_type(field.content_type(), &THUMBNAIL_MEDIA_TYPES)?;
        let data = field.bytes().await?;
        return Ok((media_type, data));
    }
    Err(AppError::bad_request("Unable to parse form file"))
}

/// Validate the video field and copy it into a temp file.
///
/// Later steps read the file by path, so the write handle is dropped here.
async fn spool_video(mut multipart: Multipart) -> Result<(String, NamedTempFile), AppError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        let media_type = assets::validate_media_type(field.content_type(), &VIDEO_MEDIA_TYPES)?;

        let upload = tempfile::Builder::new()
            .prefix(UPLOAD_TEMP_PREFIX)
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| AppError::internal_from("Couldn't create temp file", e))?;
        let handle = upload
            .reopen()
            .map_err(|e| AppError::internal_from("Couldn't create temp file", e))?;
        let mut file = tokio::fs::File::from_std(handle);

        let mut size = 0usize;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::internal_from("Couldn't save file", e))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::internal_from("Couldn't save file", e))?;

        debug!(path = %upload.path().display(), size, "video spooled to disk");
        return Ok((media_type, upload));
    }
    Err(AppError::bad_request("Unable to parse form file"))
}
