use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::{option_fields::OptionField, Pagination},
    errors::AppError,
    utils::sanitize::{derive_excerpt, sanitize_html, EXCERPT_CHARS},
};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_TITLE_LENGTH: u64 = 3;
const MAX_TITLE_LENGTH: u64 = 200;
const MAX_EXCERPT_LENGTH: u64 = 500;
const MAX_CATEGORY_LENGTH: u64 = 60;
const MAX_SEO_TITLE_LENGTH: u64 = 70;
const MAX_SEO_DESCRIPTION_LENGTH: u64 = 160;
const MAX_TAGS: usize = 10;
const MAX_TAG_LENGTH: usize = 30;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(AppError::InvalidInput(format!(
                "Invalid status '{}'. Expected draft, published or archived",
                other
            ))),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication timestamp after a status change. Stamped on every move into
/// `published` from any other state (or on creation); left alone otherwise,
/// including when a post is unpublished.
pub fn publication_stamp(
    previous: Option<PostStatus>,
    next: PostStatus,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if next == PostStatus::Published && previous != Some(PostStatus::Published) {
        Some(now)
    } else {
        current
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct BlogPostRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BlogPostRow> for BlogPost {
    type Error = AppError;

    fn try_from(row: BlogPostRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| AppError::InternalError(format!("Corrupt post status '{}'", row.status)))?;

        Ok(BlogPost {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            featured_image: row.featured_image,
            category: row.category,
            tags: row.tags,
            status,
            seo_title: row.seo_title,
            seo_description: row.seo_description,
            view_count: row.view_count,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Everything the store needs to insert a post; the slug is filled in by the
/// use case once it has been made unique.
#[derive(Debug, Clone)]
pub struct BlogPostInsert {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPostRequest {
    #[validate(
        length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH, message = "Title must be between 3 and 200 characters"),
        custom(function = "validate_title")
    )]
    pub title: String,

    #[validate(custom(function = "validate_content"))]
    pub content: String,

    #[validate(length(max = MAX_EXCERPT_LENGTH, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,

    #[validate(custom(function = "validate_image_ref"))]
    pub featured_image: Option<String>,

    #[validate(length(max = MAX_CATEGORY_LENGTH, message = "Category must be at most 60 characters"))]
    pub category: Option<String>,

    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    pub status: Option<PostStatus>,

    #[validate(length(max = MAX_SEO_TITLE_LENGTH, message = "SEO title must be at most 70 characters"))]
    pub seo_title: Option<String>,

    #[validate(length(max = MAX_SEO_DESCRIPTION_LENGTH, message = "SEO description must be at most 160 characters"))]
    pub seo_description: Option<String>,
}

/// Partial update. Any subset of the create fields; the slug cannot be changed.
#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBlogPostRequest {
    #[validate(
        length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH, message = "Title must be between 3 and 200 characters"),
        custom(function = "validate_optional_title")
    )]
    pub title: OptionField<String>,

    #[validate(custom(function = "validate_optional_content"))]
    pub content: OptionField<String>,

    #[validate(length(max = MAX_EXCERPT_LENGTH, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: OptionField<String>,

    #[validate(custom(function = "validate_optional_image_ref"))]
    pub featured_image: OptionField<String>,

    #[validate(length(max = MAX_CATEGORY_LENGTH, message = "Category must be at most 60 characters"))]
    pub category: OptionField<String>,

    #[validate(custom(function = "validate_optional_tags"))]
    pub tags: OptionField<Vec<String>>,

    #[validate(custom(function = "validate_optional_status"))]
    pub status: OptionField<PostStatus>,

    #[validate(length(max = MAX_SEO_TITLE_LENGTH, message = "SEO title must be at most 70 characters"))]
    pub seo_title: OptionField<String>,

    #[validate(length(max = MAX_SEO_DESCRIPTION_LENGTH, message = "SEO description must be at most 160 characters"))]
    pub seo_description: OptionField<String>,
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().len() != title.len() {
        return Err(new_validation_error("title_whitespace", "Title must not have leading or trailing whitespace"));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(new_validation_error("content_empty", "Content cannot be empty"));
    }
    Ok(())
}

/// Featured images are either absolute http(s) URLs or paths on this host,
/// such as the `/uploads/...` URLs handed out by local storage.
pub fn validate_image_ref(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(new_validation_error("too_many_tags", "At most 10 tags are allowed"));
    }
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > MAX_TAG_LENGTH {
            return Err(new_validation_error("invalid_tag_length", "Tags must be between 1 and 30 characters"));
        }
    }
    Ok(())
}

pub fn validate_optional_title(value: &OptionField<String>) -> Result<(), ValidationError> {
    match value {
        OptionField::SetToValue(title) => validate_title(title),
        OptionField::SetToNull => Err(new_validation_error("title_required", "Title cannot be null")),
        OptionField::Unchanged => Ok(()),
    }
}

pub fn validate_optional_content(value: &OptionField<String>) -> Result<(), ValidationError> {
    match value {
        OptionField::SetToValue(content) => validate_content(content),
        OptionField::SetToNull => Err(new_validation_error("content_required", "Content cannot be null")),
        OptionField::Unchanged => Ok(()),
    }
}

pub fn validate_optional_image_ref(value: &OptionField<String>) -> Result<(), ValidationError> {
    if let OptionField::SetToValue(url) = value {
        validate_image_ref(url)?;
    }
    Ok(())
}

pub fn validate_optional_tags(value: &OptionField<Vec<String>>) -> Result<(), ValidationError> {
    if let OptionField::SetToValue(tags) = value {
        validate_tags(tags)?;
    }
    Ok(())
}

pub fn validate_optional_status(value: &OptionField<PostStatus>) -> Result<(), ValidationError> {
    if value.is_set_to_null() {
        return Err(new_validation_error("status_required", "Status cannot be null"));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ───── Conversions ──────────────────────────────────────────────────

impl NewBlogPostRequest {
    /// Validates and normalises the request. The returned insert carries an
    /// empty slug.
    pub fn into_insert(self, now: DateTime<Utc>) -> Result<BlogPostInsert, AppError> {
        self.validate()?;

        let content = sanitize_html(&self.content);
        let excerpt = non_blank(self.excerpt).or_else(|| derive_excerpt(&content, EXCERPT_CHARS));
        let status = self.status.unwrap_or(PostStatus::Draft);

        Ok(BlogPostInsert {
            title: self.title,
            slug: String::new(),
            content,
            excerpt,
            featured_image: non_blank(self.featured_image),
            category: non_blank(self.category),
            tags: normalize_tags(self.tags.unwrap_or_default()),
            status,
            seo_title: non_blank(self.seo_title),
            seo_description: non_blank(self.seo_description),
            published_at: publication_stamp(None, status, None, now),
        })
    }
}

impl BlogPost {
    /// Merges a validated patch into the post. The slug is never touched.
    pub fn apply_update(&mut self, update: UpdateBlogPostRequest, now: DateTime<Utc>) -> Result<(), AppError> {
        update.validate()?;

        if let Some(title) = update.title.take_value() {
            self.title = title;
        }
        if let Some(content) = update.content.take_value() {
            self.content = sanitize_html(&content);
        }
        if let Some(excerpt) = update.excerpt.into_option() {
            self.excerpt = non_blank(excerpt);
        }
        if let Some(image) = update.featured_image.into_option() {
            self.featured_image = non_blank(image);
        }
        if let Some(category) = update.category.into_option() {
            self.category = non_blank(category);
        }
        if let Some(tags) = update.tags.into_option() {
            self.tags = normalize_tags(tags.unwrap_or_default());
        }
        if let Some(seo_title) = update.seo_title.into_option() {
            self.seo_title = non_blank(seo_title);
        }
        if let Some(seo_description) = update.seo_description.into_option() {
            self.seo_description = non_blank(seo_description);
        }
        if let Some(status) = update.status.take_value() {
            self.published_at = publication_stamp(Some(self.status), status, self.published_at, now);
            self.status = status;
        }

        self.updated_at = now;
        Ok(())
    }
}

// ───── Listing ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogPostFilter {
    /// `None` means every status.
    pub status: Option<PostStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl BlogListQuery {
    /// Public listing: only published posts, whatever `status` says.
    pub fn into_public_filter(self) -> BlogPostFilter {
        let mut filter = self.into_filter_with_status(None);
        filter.status = Some(PostStatus::Published);
        filter
    }

    /// Admin listing: `status` may be any post status or `all` (the default).
    pub fn into_admin_filter(self) -> Result<BlogPostFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(other) => Some(other.parse::<PostStatus>()?),
        };
        Ok(self.into_filter_with_status(status))
    }

    fn into_filter_with_status(self, status: Option<PostStatus>) -> BlogPostFilter {
        BlogPostFilter {
            status,
            category: non_blank(self.category),
            search: non_blank(self.search),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BlogPostResponse {
    pub success: bool,
    pub post: BlogPost,
}

#[derive(Debug, Serialize)]
pub struct BlogPostDetailResponse {
    pub post: BlogPost,
}

#[derive(Debug, Serialize)]
pub struct BlogPostListResponse {
    pub posts: Vec<BlogPost>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct BlogPostDeletedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogStats {
    pub total: i64,
    pub draft: i64,
    pub published: i64,
    pub archived: i64,
    pub total_views: i64,
}
