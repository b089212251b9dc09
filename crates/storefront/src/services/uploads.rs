//! Image uploads to file storage.

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use marketplace_core::UserId;

use crate::backend::{BackendError, FileStorage};

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image types and the extension stored with them.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Errors that can occur while uploading an image.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file is empty")]
    Empty,

    #[error("file exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("storage error: {0}")]
    Storage(#[from] BackendError),
}

/// Folders images are uploaded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    /// `avatars/{uid}/...`
    Avatars,
    /// `reviews/{uid}/...`
    Reviews,
}

impl ImageFolder {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Avatars => "avatars",
            Self::Reviews => "reviews",
        }
    }
}

/// Check size and type, returning the file extension to store.
///
/// # Errors
///
/// Returns `UploadError` if the file is empty, too large or not an image.
pub fn validate_image(bytes: &[u8], content_type: &str) -> Result<&'static str, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge {
            max: MAX_IMAGE_BYTES,
        });
    }

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| UploadError::UnsupportedType(content_type.to_owned()))
}

/// Upload an image to `{folder}/{uid}/{uuid}.{ext}` and return its URL.
///
/// # Errors
///
/// Returns `UploadError` if validation or the upload fails.
#[instrument(skip(files, bytes), fields(size = bytes.len()))]
pub async fn upload_image(
    files: &dyn FileStorage,
    folder: ImageFolder,
    user_id: &UserId,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, UploadError> {
    let extension = validate_image(&bytes, content_type)?;
    let path = format!(
        "{}/{user_id}/{}.{extension}",
        folder.as_str(),
        Uuid::new_v4().simple()
    );
    Ok(files.upload(&path, bytes, content_type).await?)
}
