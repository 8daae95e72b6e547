//! Asset naming and local thumbnail storage.
//!
//! Stored names are never derived from the client's filename: each asset
//! gets 32 random bytes, URL-safe base64 encoded, plus an extension taken
//! from its validated media type.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

const NAME_ENTROPY_BYTES: usize = 32;

/// Media types accepted for thumbnails.
pub const THUMBNAIL_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Media types accepted for videos.
pub const VIDEO_MEDIA_TYPES: [&str; 1] = ["video/mp4"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid media type `{0}`")]
    InvalidMediaType(String),
    #[error("media type `{0}` is not allowed")]
    UnsupportedMediaType(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Random URL-safe name with no extension.
pub fn generate_name() -> String {
    let mut bytes = [0u8; NAME_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Parse a Content-Type value and check it against `allowed`.
///
/// Parameters such as `charset` are ignored; the comparison is on the
/// lowercased `type/subtype` essence.
pub fn validate_media_type(raw: Option<&str>, allowed: &[&str]) -> AssetResult<String> {
    let raw = raw.unwrap_or_default();
    let parsed: mime::Mime = raw
        .parse()
        .map_err(|_| AssetError::InvalidMediaType(raw.to_string()))?;
    let essence = parsed.essence_str().to_ascii_lowercase();

    if allowed.contains(&essence.as_str()) {
        Ok(essence)
    } else {
        Err(AssetError::UnsupportedMediaType(essence))
    }
}

/// File extension for a `type/subtype` media type.
pub fn extension_for(media_type: &str) -> AssetResult<&str> {
    match media_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => Ok(subtype),
        _ => Err(AssetError::InvalidMediaType(media_type.to_string())),
    }
}

/// A thumbnail written to the assets root.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub file_name: String,
    pub url: String,
}

/// Thumbnail storage on local disk, served back under `/assets/`.
#[derive(Clone, Debug)]
pub struct LocalAssets {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssets {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a file stored under the assets root.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/assets/{}", self.public_base_url, file_name)
    }

    /// Write `data` under a freshly generated name.
    ///
    /// `create_new` guards against overwriting an existing asset should two
    /// names ever collide.
    pub async fn store(&self, data: &[u8], media_type: &str) -> AssetResult<StoredAsset> {
        let extension = extension_for(media_type)?;
        let file_name = format!("{}.{}", generate_name(), extension);
        let path = self.root.join(&file_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        if let Err(err) = write_all_synced(&mut file, data).await {
            let _ = fs::remove_file(&path).await;
            return Err(AssetError::Io(err));
        }

        debug!(path = %path.display(), size = data.len(), "stored asset");
        Ok(StoredAsset {
            url: self.public_url(&file_name),
            file_name,
        })
    }

    /// Remove a stored asset; a missing file is not an error.
    pub async fn remove(&self, file_name: &str) -> AssetResult<()> {
        match fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AssetError::Io(err)),
        }
    }
}

async fn write_all_synced(file: &mut fs::File, data: &[u8]) -> io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}
