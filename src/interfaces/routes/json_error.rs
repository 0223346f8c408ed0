use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    error::{JsonPayloadError, PathError, PayloadError, QueryPayloadError},
    http::StatusCode,
    web, HttpResponse, ResponseError,
};
use serde_json::json;

use crate::media::MAX_UPLOAD_BYTES;

/// Headroom on top of the image limit for the text fields of an upload form.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        BadRequestError::from(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        BadRequestError::from(err).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        BadRequestError::from(err).into()
    }));
    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)
            .memory_limit(MULTIPART_OVERHEAD_BYTES)
            .error_handler(|err, _req| BadRequestError::from(err).into()),
    );
}

/// Extractor failures rendered as `{ "error": ... }` instead of actix's
/// plain-text default.
#[derive(Debug)]
pub struct BadRequestError {
    message: String,
    status: StatusCode,
}

impl BadRequestError {
    fn bad_request(message: String) -> Self {
        BadRequestError {
            message,
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for BadRequestError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for BadRequestError {
    fn from(err: JsonPayloadError) -> Self {
        BadRequestError::bad_request(format!("Invalid JSON payload: {}", err))
    }
}

impl From<QueryPayloadError> for BadRequestError {
    fn from(err: QueryPayloadError) -> Self {
        BadRequestError::bad_request(format!("Invalid query string: {}", err))
    }
}

impl From<PathError> for BadRequestError {
    fn from(err: PathError) -> Self {
        BadRequestError::bad_request(format!("Invalid path parameter: {}", err))
    }
}

impl From<MultipartError> for BadRequestError {
    fn from(err: MultipartError) -> Self {
        let status = match &err {
            MultipartError::Payload(PayloadError::Overflow) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };

        BadRequestError {
            message: format!("Invalid upload form: {}", err),
            status,
        }
    }
}
