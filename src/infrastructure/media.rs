//! Image intake: validation of client uploads and the resize/re-encode step
//! applied before anything reaches storage.

pub mod transform;
pub mod validation;

use derive_more::Display;
use image::ImageFormat;

use crate::storage::StorageError;

pub use transform::{transform, TransformOptions, TransformedImage};
pub use validation::{validate, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES};

/// Raster formats accepted by the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormatKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

/// All errors related to accepting and processing an upload.
#[derive(Debug, Display)]
pub enum UploadError {
    #[display("File is empty")]
    Empty,

    #[display("Invalid file type: {_0}. Allowed types: JPEG, PNG, WebP, GIF")]
    InvalidFormat(String),

    #[display("File too large: {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[display("Invalid upload type: {_0}")]
    InvalidUploadType(String),

    #[display("Invalid transform options: {_0}")]
    InvalidOptions(String),

    #[display("Image could not be decoded: {_0}")]
    Undecodable(String),

    #[display("Storage failure: {_0}")]
    Storage(StorageError),

    #[display("{_0}")]
    Internal(String),
}

impl std::error::Error for UploadError {}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        UploadError::Storage(err)
    }
}
