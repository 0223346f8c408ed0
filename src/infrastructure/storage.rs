//! Durable storage for uploaded assets.
//!
//! Callers only ever see the [`Storage`] trait. The concrete backend is picked
//! once at start-up by [`create_storage`] from `AppConfig::storage_backend`.

pub mod local;
pub mod s3;

use std::{io, sync::Arc};

use async_trait::async_trait;
use derive_more::Display;

use crate::settings::{AppConfig, StorageBackendKind};

pub use local::LocalStorage;
pub use s3::S3Storage;

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Upload failed: {_0}")]
    UploadFailed(String),

    #[display("Download failed: {_0}")]
    DownloadFailed(String),

    #[display("Delete failed: {_0}")]
    DeleteFailed(String),

    #[display("File not found: {_0}")]
    NotFound(String),

    #[display("Invalid storage key: {_0}")]
    InvalidKey(String),

    #[display("Storage backend error: {_0}")]
    BackendError(String),

    #[display("IO error: {_0}")]
    IoError(io::Error),

    #[display("Storage configuration error: {_0}")]
    ConfigError(String),
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::IoError(err)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Writes `data` under `key` and returns its public URL.
    async fn upload(&self, key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<String>;

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Removing a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn public_url(&self, key: &str) -> String;

    fn backend_name(&self) -> &'static str;
}

pub async fn create_storage(config: &AppConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackendKind::Local => {
            let storage = LocalStorage::new(&config.upload_dir, config.public_base_url.clone()).await?;
            tracing::info!(dir = %config.upload_dir, "Using local upload storage");
            Ok(Arc::new(storage))
        }
        StorageBackendKind::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET is not set".into()))?;
            let region = config
                .s3_region
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_REGION is not set".into()))?;

            let storage = S3Storage::new(
                bucket.clone(),
                region,
                config.s3_endpoint.clone(),
                config.s3_public_url.clone(),
            )
            .await?;
            tracing::info!(bucket = %bucket, "Using S3 upload storage");
            Ok(Arc::new(storage))
        }
    }
}
