use super::{ImageFormatKind, UploadError};

/// Hard ceiling for a single upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Checks an upload before any transform or storage write happens.
///
/// The declared MIME type must be on the allow-list, then the bytes are
/// sniffed and the sniffed type wins: it must also be on the allow-list and
/// is what the rest of the pipeline uses.
pub fn validate(bytes: &[u8], declared_mime: &str) -> Result<ImageFormatKind, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let declared = normalize_mime(declared_mime);
    if ImageFormatKind::from_mime(&declared).is_none() {
        return Err(UploadError::InvalidFormat(display_mime(&declared)));
    }

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            max: MAX_UPLOAD_BYTES,
        });
    }

    let sniffed = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .ok_or_else(|| UploadError::InvalidFormat("unrecognized content".to_string()))?;

    ImageFormatKind::from_mime(sniffed)
        .ok_or_else(|| UploadError::InvalidFormat(sniffed.to_string()))
}

fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn display_mime(mime: &str) -> String {
    if mime.is_empty() {
        "unknown".to_string()
    } else {
        mime.to_string()
    }
}
