//! Core data models for the upload service.
//!
//! Records map to database tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod video;
