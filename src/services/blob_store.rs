//! Object storage for processed videos, built on the `object_store` crate.
//!
//! Production uses the S3 backend; tests use the in-memory one.

use object_store::{
    Attribute, Attributes, ObjectStore,
    aws::AmazonS3Builder,
    buffered::BufWriter,
    memory::InMemory,
    path::Path as StoragePath,
};
use std::{path::Path, sync::Arc, time::Instant};
use thiserror::Error;
use tokio::{fs::File, io::AsyncWriteExt};

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("upload of `{key}` failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Clone, Debug)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    distribution_base: String,
}

impl BlobStore {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        distribution_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            distribution_base: distribution_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// S3 backend; credentials come from the standard AWS environment.
    pub fn s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        distribution_base: &str,
    ) -> BlobResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket);
        if let Some(endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        Ok(Self::new(Arc::new(builder.build()?), bucket, distribution_base))
    }

    /// In-memory backend for tests and local development.
    pub fn in_memory(distribution_base: &str) -> Self {
        Self::new(Arc::new(InMemory::new()), "tubely-local", distribution_base)
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    /// Public URL for `key` behind the distribution.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.distribution_base, key.trim_start_matches('/'))
    }

    /// Stream the file at `path` to `key`, tagging it with `content_type`.
    pub async fn upload_file(&self, key: &str, path: &Path, content_type: &str) -> BlobResult<u64> {
        let start = Instant::now();
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let mut writer = BufWriter::new(self.store.clone(), StoragePath::from(key))
            .with_attributes(attributes);

        let io_err = |source| BlobError::Upload {
            key: key.to_string(),
            source,
        };
        let copied = async {
            let mut file = File::open(path).await?;
            let copied = tokio::io::copy(&mut file, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<_, std::io::Error>(copied)
        }
        .await;

        match copied {
            Ok(size) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "object upload successful"
                );
                Ok(size)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    bucket = %self.bucket,
                    key = %key,
                    "object upload failed"
                );
                if let Err(abort_err) = writer.abort().await {
                    tracing::debug!(error = %abort_err, "aborting partial upload failed");
                }
                Err(io_err(err))
            }
        }
    }

    pub async fn delete(&self, key: &str) -> BlobResult<()> {
        self.store.delete(&StoragePath::from(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn public_url_joins_with_single_slash() {
        let blobs = BlobStore::in_memory("https://d111.cloudfront.net/");
        assert_eq!(
            blobs.public_url("landscape/abc.mp4"),
            "https://d111.cloudfront.net/landscape/abc.mp4"
        );
        assert_eq!(
            blobs.public_url("/other/abc.mp4"),
            "https://d111.cloudfront.net/other/abc.mp4"
        );
    }

    #[tokio::test]
    async fn upload_file_stores_bytes_and_content_type() {
        let blobs = BlobStore::in_memory("https://cdn.example.com");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake mp4 payload").unwrap();

        let size = blobs
            .upload_file("portrait/xyz.mp4", file.path(), "video/mp4")
            .await
            .unwrap();
        assert_eq!(size, 16);

        let result = blobs
            .store()
            .get(&StoragePath::from("portrait/xyz.mp4"))
            .await
            .unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType).map(|v| &**v),
            Some("video/mp4")
        );
        assert_eq!(result.bytes().await.unwrap().as_ref(), b"fake mp4 payload");

        blobs.delete("portrait/xyz.mp4").await.unwrap();
        assert!(
            blobs
                .store()
                .head(&StoragePath::from("portrait/xyz.mp4"))
                .await
                .is_err()
        );
    }
}
