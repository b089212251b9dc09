//! Firebase Auth (Identity Toolkit) email/password endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::ErrorEnvelope;
use crate::backend::{AuthAccount, AuthProvider, BackendError};
use crate::config::FirebaseConfig;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Response of `accounts:signUp` and `accounts:signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: String,
    id_token: String,
}

/// Response of `accounts:lookup`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email_verified: bool,
}

/// Firebase Auth client.
#[derive(Clone)]
pub struct IdentityToolkit {
    http: reqwest::Client,
    api_key: SecretString,
}

impl IdentityToolkit {
    /// Create an auth client for the configured project.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, BackendError> {
        let response = self
            .http
            .post(format!("{IDENTITY_TOOLKIT_URL}/accounts:{method}"))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or_default();
        Err(map_error_code(status, &code))
    }

    async fn email_verified(&self, id_token: &str) -> Result<bool, BackendError> {
        let lookup: LookupResponse = self.call("lookup", json!({ "idToken": id_token })).await?;
        Ok(lookup.users.first().is_some_and(|u| u.email_verified))
    }
}

/// Map Identity Toolkit error codes (e.g. `EMAIL_EXISTS`) to backend errors.
///
/// Some codes carry a suffix such as `WEAK_PASSWORD : Password should be ...`.
fn map_error_code(status: StatusCode, code: &str) -> BackendError {
    let key = code.split(':').next().unwrap_or_default().trim();
    match key {
        "EMAIL_EXISTS" => BackendError::AlreadyExists("email".to_owned()),
        "EMAIL_NOT_FOUND" => BackendError::NotFound("email".to_owned()),
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            BackendError::InvalidCredentials
        }
        "USER_DISABLED" => BackendError::PermissionDenied("account disabled".to_owned()),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => BackendError::RateLimited,
        "WEAK_PASSWORD" => BackendError::InvalidArgument(code.to_owned()),
        _ => BackendError::Unexpected {
            status: status.as_u16(),
            message: code.to_owned(),
        },
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkit {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let token: TokenResponse = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        Ok(AuthAccount {
            uid: token.local_id,
            email: token.email,
            email_verified: false,
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let token: TokenResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let email_verified = self.email_verified(&token.id_token).await?;

        Ok(AuthAccount {
            uid: token.local_id,
            email: token.email,
            email_verified,
        })
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert!(matches!(
            map_error_code(StatusCode::BAD_REQUEST, "EMAIL_EXISTS"),
            BackendError::AlreadyExists(_)
        ));
        assert!(matches!(
            map_error_code(StatusCode::BAD_REQUEST, "INVALID_LOGIN_CREDENTIALS"),
            BackendError::InvalidCredentials
        ));
        assert!(matches!(
            map_error_code(StatusCode::BAD_REQUEST, "EMAIL_NOT_FOUND"),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            map_error_code(StatusCode::BAD_REQUEST, "TOO_MANY_ATTEMPTS_TRY_LATER"),
            BackendError::RateLimited
        ));
    }

    #[test]
    fn test_error_code_with_detail_suffix() {
        let err = map_error_code(
            StatusCode::BAD_REQUEST,
            "WEAK_PASSWORD : Password should be at least 6 characters",
        );
        assert!(matches!(err, BackendError::InvalidArgument(msg) if msg.contains("6 characters")));
    }

    #[test]
    fn test_unknown_code_keeps_status() {
        let err = map_error_code(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(err, BackendError::Unexpected { status: 503, .. }));
    }
}
