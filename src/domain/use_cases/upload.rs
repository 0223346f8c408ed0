use std::{sync::Arc, time::Instant};

use image::ImageFormat;
use uuid::Uuid;

use crate::{
    entities::{
        upload::{FileRecord, NewFileRecord, UploadDeletedResponse, UploadFilter, UploadListResponse, UploadResult, UploadStats, UploadType},
        Pagination,
    },
    errors::AppError,
    media::{self, ImageFormatKind, TransformOptions, UploadError},
    repositories::upload::UploadRepository,
    storage::Storage,
};

const MAX_DIMENSION: u32 = 8192;
const MAX_EXTENSION_LEN: usize = 5;
const MAX_ORIGINAL_NAME_LEN: usize = 255;

/// Per-request overrides of the configured transform defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOverrides {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality: Option<u8>,
}

impl TransformOverrides {
    pub fn resolve(self, defaults: TransformOptions) -> Result<TransformOptions, UploadError> {
        let check_dimension = |name: &str, value: u32| {
            if (1..=MAX_DIMENSION).contains(&value) {
                Ok(value)
            } else {
                Err(UploadError::InvalidOptions(format!("{} must be between 1 and {}", name, MAX_DIMENSION)))
            }
        };

        let max_width = self.max_width.map(|w| check_dimension("maxWidth", w)).transpose()?;
        let max_height = self.max_height.map(|h| check_dimension("maxHeight", h)).transpose()?;
        let quality = match self.quality {
            Some(q) if !(1..=100).contains(&q) => {
                return Err(UploadError::InvalidOptions("quality must be between 1 and 100".into()));
            }
            other => other,
        };

        Ok(TransformOptions {
            max_width: max_width.unwrap_or(defaults.max_width),
            max_height: max_height.unwrap_or(defaults.max_height),
            quality: quality.unwrap_or(defaults.quality),
            png_compression_level: defaults.png_compression_level,
        })
    }
}

/// One client file on its way into storage.
#[derive(Debug)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub declared_mime: String,
    pub upload_type: UploadType,
    pub overrides: TransformOverrides,
}

/// Lowercase extension of the client file name when it names the detected
/// format (`jpeg` and `jpg` both count); otherwise the detected format's own.
pub fn file_extension(original_name: &str, kind: ImageFormatKind) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .filter(|ext| ImageFormat::from_extension(ext) == Some(kind.image_format()))
        .unwrap_or_else(|| kind.extension().to_string())
}

/// The client's file name is display-only: keep the last path segment only.
fn display_name(original_name: &str, fallback: &str) -> String {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() {
        fallback.to_string()
    } else {
        name.chars().take(MAX_ORIGINAL_NAME_LEN).collect()
    }
}

/// validate → transform → store. Backend agnostic; nothing is written unless
/// validation and the transform both succeed.
#[derive(Clone)]
pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    defaults: TransformOptions,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn Storage>, defaults: TransformOptions) -> Self {
        UploadPipeline { storage, defaults }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn store(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let UploadRequest { bytes, original_name, declared_mime, upload_type, overrides } = request;

        let kind = media::validate(&bytes, &declared_mime)?;
        let options = overrides.resolve(self.defaults)?;

        let transformed = tokio::task::spawn_blocking(move || media::transform(&bytes, kind, &options))
            .await
            .map_err(|e| UploadError::Internal(format!("Image transform task failed: {}", e)))??;

        let file_name = format!("{}.{}", Uuid::new_v4(), file_extension(&original_name, kind));
        let storage_key = format!("{}/{}", upload_type.as_str(), file_name);
        let size = transformed.bytes.len();
        let (width, height) = (transformed.width, transformed.height);

        let started = Instant::now();
        let url = self
            .storage
            .upload(&storage_key, kind.mime_type(), transformed.bytes)
            .await
            .map_err(|e| {
                tracing::error!(
                    key = %storage_key,
                    backend = self.storage.backend_name(),
                    error = %e,
                    "Storage write failed"
                );
                UploadError::Storage(e)
            })?;

        tracing::info!(
            key = %storage_key,
            size,
            resized = transformed.resized,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stored upload"
        );

        Ok(UploadResult {
            original_name: display_name(&original_name, &file_name),
            storage_key,
            file_name,
            mime_type: kind.mime_type().to_string(),
            size,
            url,
            upload_type,
            width,
            height,
        })
    }

    /// Best effort: failures are logged and reported as `false`.
    pub async fn delete(&self, storage_key: &str) -> bool {
        match self.storage.delete(storage_key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Failed to delete stored file");
                false
            }
        }
    }
}

pub struct UploadHandler<R>
where
    R: UploadRepository,
{
    pub pipeline: UploadPipeline,
    pub upload_repo: R,
}

impl<R> UploadHandler<R>
where
    R: UploadRepository,
{
    pub fn new(pipeline: UploadPipeline, upload_repo: R) -> Self {
        UploadHandler { pipeline, upload_repo }
    }

    /// Stores the file, then records it. A failed insert leaves the stored
    /// object behind; its key is logged for manual cleanup.
    pub async fn upload(&self, request: UploadRequest, related_id: Option<String>) -> Result<FileRecord, AppError> {
        let result = self.pipeline.store(request).await?;
        let record = NewFileRecord::from_result(&result, related_id);

        match self.upload_repo.insert_file(&record).await {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::warn!(
                    key = %result.storage_key,
                    error = %e,
                    "Upload stored but not recorded; object is orphaned"
                );
                Err(e)
            }
        }
    }

    pub async fn list(&self, filter: &UploadFilter) -> Result<UploadListResponse, AppError> {
        let (files, total) = self.upload_repo.list_files(filter).await?;

        Ok(UploadListResponse {
            files,
            pagination: Pagination::new(total, filter.limit, filter.offset),
        })
    }

    pub async fn delete(&self, id: &Uuid) -> Result<UploadDeletedResponse, AppError> {
        let file = self
            .upload_repo
            .get_file(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".into()))?;

        let storage_deleted = self.pipeline.delete(&file.storage_key).await;
        self.upload_repo.delete_file(id).await?;

        tracing::info!(id = %id, key = %file.storage_key, storage_deleted, "Upload deleted");
        Ok(UploadDeletedResponse { success: true, storage_deleted })
    }

    /// Raw stored bytes plus the content type sniffed from them.
    pub async fn fetch(&self, storage_key: &str) -> Result<(Vec<u8>, &'static str), AppError> {
        let bytes = self.pipeline.storage().download(storage_key).await?;
        let content_type = infer::get(&bytes)
            .map(|t| t.mime_type())
            .unwrap_or("application/octet-stream");

        Ok((bytes, content_type))
    }

    pub async fn stats(&self) -> Result<UploadStats, AppError> {
        self.upload_repo.upload_stats().await
    }
}
