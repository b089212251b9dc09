//! Cloud Storage for Firebase objects API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use super::{authorize, error_from_response};
use crate::backend::{BackendError, FileStorage};
use crate::config::FirebaseConfig;

const STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";

/// Object metadata returned after an upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Firebase Storage client for one bucket.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    bucket: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
}

impl FirebaseStorage {
    /// Create a storage client for the configured bucket.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            http,
            bucket: config.storage_bucket.clone(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        }
    }
}

/// Public download URL for an object with its access token.
fn download_url(bucket: &str, path: &str, token: Option<&str>) -> String {
    let base = format!(
        "{STORAGE_BASE_URL}/{bucket}/o/{}?alt=media",
        urlencoding::encode(path)
    );
    match token {
        Some(token) => format!("{base}&token={token}"),
        None => base,
    }
}

#[async_trait]
impl FileStorage for FirebaseStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let request = self
            .http
            .post(format!("{STORAGE_BASE_URL}/{}/o", self.bucket))
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, content_type)
            .body(bytes);

        let response = authorize(request, &self.api_key, self.access_token.as_ref())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let metadata: ObjectMetadata = response.json().await?;
        // Several tokens may be issued; any one grants read access
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next());

        Ok(download_url(&self.bucket, &metadata.name, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_encodes_path() {
        let url = download_url("shop.appspot.com", "reviews/u1/p 1.jpg", Some("tok"));
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/shop.appspot.com/o/reviews%2Fu1%2Fp%201.jpg?alt=media&token=tok"
        );
    }

    #[test]
    fn test_download_url_without_token() {
        let url = download_url("b", "avatars/u1", None);
        assert!(url.ends_with("avatars%2Fu1?alt=media"));
    }
}
