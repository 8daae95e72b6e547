//! External media tooling: aspect-ratio probing and fast-start remuxing.
//!
//! Handlers talk to the `MediaTool` trait so tests can substitute a fake.
//! The production implementation shells out to ffprobe/ffmpeg with fixed
//! argument vectors; no shell is involved.

use async_trait::async_trait;
use serde::Deserialize;
use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Output,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Suffix appended to the source path for the remuxed copy.
pub const PROCESSING_SUFFIX: &str = ".processing";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("probe exited unsuccessfully: {0}")]
    ProbeFailed(String),
    #[error("probe output could not be parsed: {0}")]
    ProbeOutput(#[from] serde_json::Error),
    #[error("probe reported no streams")]
    NoStreams,
    #[error("remux exited unsuccessfully: {0}")]
    RemuxFailed(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Display aspect ratio of the first stream, e.g. `"16:9"`.
    async fn probe_aspect_ratio(&self, path: &Path) -> MediaResult<String>;

    /// Write a fast-start copy of `path` and return its location.
    async fn remux_fast_start(&self, path: &Path) -> MediaResult<PathBuf>;
}

/// Storage prefix grouping videos by orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePrefix {
    Landscape,
    Portrait,
    Other,
}

impl StoragePrefix {
    pub fn classify(aspect_ratio: &str) -> Self {
        match aspect_ratio.trim() {
            "16:9" => StoragePrefix::Landscape,
            "9:16" => StoragePrefix::Portrait,
            _ => StoragePrefix::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoragePrefix::Landscape => "landscape",
            StoragePrefix::Portrait => "portrait",
            StoragePrefix::Other => "other",
        }
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    display_aspect_ratio: String,
}

/// Extract the first stream's display aspect ratio from ffprobe JSON.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<String> {
    let output: ProbeReport = serde_json::from_slice(stdout)?;
    output
        .streams
        .into_iter()
        .next()
        .map(|stream| stream.display_aspect_ratio)
        .ok_or(MediaError::NoStreams)
}

/// Sibling path the remuxed copy is written to.
pub fn processing_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

/// Removes the file at the wrapped path when dropped.
#[derive(Debug)]
pub struct ScratchPath(PathBuf);

impl ScratchPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchPath {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => debug!(path = %self.0.display(), "removed scratch file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.0.display(), error = %err, "could not remove scratch file"),
        }
    }
}

/// ffprobe/ffmpeg backed implementation.
#[derive(Clone, Debug)]
pub struct Ffmpeg {
    ffprobe_path: String,
    ffmpeg_path: String,
}

impl Ffmpeg {
    pub fn new(ffprobe_path: impl Into<String>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    async fn run(program: &str, command: &mut Command) -> MediaResult<Output> {
        command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                program: program.to_string(),
                source,
            })
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn probe_aspect_ratio(&self, path: &Path) -> MediaResult<String> {
        debug!(path = %path.display(), "probing video streams");
        let output = Self::run(
            &self.ffprobe_path,
            Command::new(&self.ffprobe_path)
                .args(["-v", "error", "-print_format", "json", "-show_streams"])
                .arg(path),
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, stderr = %stderr, "ffprobe failed");
            return Err(MediaError::ProbeFailed(stderr));
        }
        parse_probe_output(&output.stdout)
    }

    async fn remux_fast_start(&self, path: &Path) -> MediaResult<PathBuf> {
        let target = processing_path(path);
        debug!(source = %path.display(), target = %target.display(), "remuxing for fast start");
        let output = Self::run(
            &self.ffmpeg_path,
            Command::new(&self.ffmpeg_path)
                .args(["-y", "-v", "error", "-i"])
                .arg(path)
                .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
                .arg(&target),
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, stderr = %stderr, "ffmpeg failed");
            let _ = tokio::fs::remove_file(&target).await;
            return Err(MediaError::RemuxFailed(stderr));
        }
        Ok(target)
    }
}
