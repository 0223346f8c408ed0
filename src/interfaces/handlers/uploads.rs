use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{http::header, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::upload::{UploadFilter, UploadListQuery, UploadResponse, UploadType},
    errors::AppError,
    media::UploadError,
    use_cases::{
        extractors::AdminClaims,
        upload::{TransformOverrides, UploadRequest},
    },
    utils::valid_uuid::valid_uuid,
    AppState,
};

#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    pub file: TempFile,
    #[multipart(rename = "uploadType")]
    pub upload_type: Option<Text<String>>,
    #[multipart(rename = "relatedId")]
    pub related_id: Option<Text<String>>,
    #[multipart(rename = "maxWidth")]
    pub max_width: Option<Text<u32>>,
    #[multipart(rename = "maxHeight")]
    pub max_height: Option<Text<u32>>,
    pub quality: Option<Text<u8>>,
}

impl UploadForm {
    async fn into_request(self) -> Result<(UploadRequest, Option<String>), AppError> {
        let upload_type = match &self.upload_type {
            Some(tag) => tag.parse::<UploadType>()?,
            None => UploadType::General,
        };

        let declared_mime = self
            .file
            .content_type
            .as_ref()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let original_name = self.file.file_name.clone().unwrap_or_default();

        let bytes = tokio::fs::read(self.file.file.path())
            .await
            .map_err(|e| UploadError::Internal(format!("Failed to read multipart temp file: {}", e)))?;

        let related_id = self
            .related_id
            .map(|id| id.into_inner().trim().to_string())
            .filter(|id| !id.is_empty());

        let request = UploadRequest {
            bytes,
            original_name,
            declared_mime,
            upload_type,
            overrides: TransformOverrides {
                max_width: self.max_width.map(Text::into_inner),
                max_height: self.max_height.map(Text::into_inner),
                quality: self.quality.map(Text::into_inner),
            },
        };

        Ok((request, related_id))
    }
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_file(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    form: MultipartForm<UploadForm>,
) -> Result<impl Responder, AppError> {
    let (request, related_id) = form.into_inner().into_request().await?;
    let record = state.upload_handler.upload(request, related_id).await?;
    Ok(HttpResponse::Created().json(UploadResponse::from(record)))
}

#[instrument(skip(_claims, state, query))]
pub async fn list_uploads(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<UploadListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = UploadFilter::try_from(query.into_inner())?;
    let response = state.upload_handler.list(&filter).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(_claims, state))]
pub async fn delete_upload(
    _claims: AdminClaims,
    upload_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&upload_id)?;
    let response = state.upload_handler.delete(&id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Streams a stored object back with a content type sniffed from its bytes.
#[instrument(skip(state))]
pub async fn serve_upload(
    key: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (bytes, content_type) = state.upload_handler.fetch(&key).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .body(bytes))
}
