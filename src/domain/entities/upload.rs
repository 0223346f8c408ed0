use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entities::Pagination, errors::AppError, media::UploadError};

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Classification tag for an upload; also the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    BlogImage,
    FeaturedImage,
    #[default]
    General,
    HeroImage,
    TestimonialImage,
}

impl UploadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadType::BlogImage => "blog_image",
            UploadType::FeaturedImage => "featured_image",
            UploadType::General => "general",
            UploadType::HeroImage => "hero_image",
            UploadType::TestimonialImage => "testimonial_image",
        }
    }
}

impl FromStr for UploadType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "general" => Ok(UploadType::General),
            "blog_image" => Ok(UploadType::BlogImage),
            "featured_image" => Ok(UploadType::FeaturedImage),
            "hero_image" => Ok(UploadType::HeroImage),
            "testimonial_image" => Ok(UploadType::TestimonialImage),
            other => Err(UploadError::InvalidUploadType(other.to_string())),
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the pipeline hands back after the bytes are durable.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub storage_key: String,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    /// Length of the stored (transformed) bytes.
    pub size: usize,
    pub url: String,
    pub upload_type: UploadType,
    pub width: u32,
    pub height: u32,
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub upload_type: String,
    pub related_id: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub storage_key: String,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub upload_type: UploadType,
    pub related_id: Option<String>,
    pub width: i32,
    pub height: i32,
}

impl NewFileRecord {
    pub fn from_result(result: &UploadResult, related_id: Option<String>) -> Self {
        NewFileRecord {
            storage_key: result.storage_key.clone(),
            file_name: result.file_name.clone(),
            original_name: result.original_name.clone(),
            mime_type: result.mime_type.clone(),
            size: result.size as i64,
            url: result.url.clone(),
            upload_type: result.upload_type,
            related_id,
            width: result.width as i32,
            height: result.height as i32,
        }
    }
}

// ───── Listing ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadListQuery {
    pub upload_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadFilter {
    pub upload_type: Option<UploadType>,
    pub limit: i64,
    pub offset: i64,
}

impl TryFrom<UploadListQuery> for UploadFilter {
    type Error = AppError;

    fn try_from(query: UploadListQuery) -> Result<Self, Self::Error> {
        let upload_type = match query.upload_type.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(other) => Some(other.parse::<UploadType>()?),
        };

        Ok(UploadFilter {
            upload_type,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        })
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub upload_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl From<FileRecord> for UploadResponse {
    fn from(record: FileRecord) -> Self {
        UploadResponse {
            id: record.id,
            url: record.url,
            file_name: record.file_name,
            original_name: record.original_name,
            size: record.size,
            mime_type: record.mime_type,
            upload_type: record.upload_type,
            width: record.width,
            height: record.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadListResponse {
    pub files: Vec<FileRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDeletedResponse {
    pub success: bool,
    pub storage_deleted: bool,
}

#[derive(Debug, Default, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub count: i64,
    pub total_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_type_defaults_to_general() {
        assert_eq!("".parse::<UploadType>().unwrap(), UploadType::General);
        assert_eq!(UploadType::default(), UploadType::General);
    }

    #[test]
    fn upload_type_round_trips_through_str() {
        for kind in [
            UploadType::BlogImage,
            UploadType::FeaturedImage,
            UploadType::General,
            UploadType::HeroImage,
            UploadType::TestimonialImage,
        ] {
            assert_eq!(kind.as_str().parse::<UploadType>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_upload_type_is_rejected() {
        assert!(matches!(
            "avatar".parse::<UploadType>(),
            Err(UploadError::InvalidUploadType(t)) if t == "avatar"
        ));
    }

    #[test]
    fn list_filter_accepts_all() {
        let query = UploadListQuery { upload_type: Some("all".into()), ..Default::default() };
        let filter = UploadFilter::try_from(query).unwrap();
        assert_eq!(filter.upload_type, None);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
    }
}
