//! Represents a video record tracked by the metadata store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A video owned by a single user.
///
/// The record stores where the thumbnail and the processed video live, not
/// the media bytes themselves. Only the owner may change the URL fields.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Video {
    pub id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub title: String,

    pub description: String,

    /// Public URL of the uploaded thumbnail, once one exists.
    pub thumbnail_url: Option<String>,

    /// Public URL of the processed video, once one exists.
    pub video_url: Option<String>,

    /// ID of the user who owns this video.
    pub user_id: Uuid,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
