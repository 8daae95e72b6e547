pub mod assets;
pub mod auth;
pub mod blob_store;
pub mod media;
pub mod video_repository;
