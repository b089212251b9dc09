//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses carry a JSON body of the form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{
    AddressError, AuthError, ChatError, ProfileError, ReviewError, UploadError, WalletError,
};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL: &str = "Internal server error";

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Backend(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn upload_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::Empty | UploadError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
        UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::Storage(_) => StatusCode::BAD_GATEWAY,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::MissingDisplayName => StatusCode::BAD_REQUEST,
                AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
                AuthError::Repository(err) => repository_status(err),
            },
            Self::Profile(err) => match err {
                ProfileError::NotFound => StatusCode::NOT_FOUND,
                ProfileError::EmptyDisplayName => StatusCode::BAD_REQUEST,
                ProfileError::Upload(err) => upload_status(err),
                ProfileError::Repository(err) => repository_status(err),
            },
            Self::Chat(err) => match err {
                ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
                ChatError::NotFound => StatusCode::NOT_FOUND,
                ChatError::Repository(err) => repository_status(err),
            },
            Self::Review(err) => match err {
                ReviewError::InvalidRating(_)
                | ReviewError::EmptyComment
                | ReviewError::ProductNotInOrder => StatusCode::BAD_REQUEST,
                ReviewError::OrderNotDelivered => StatusCode::UNPROCESSABLE_ENTITY,
                ReviewError::AlreadyReviewed => StatusCode::CONFLICT,
                ReviewError::OrderNotFound | ReviewError::NotFound => StatusCode::NOT_FOUND,
                ReviewError::NotOwner => StatusCode::FORBIDDEN,
                ReviewError::Upload(err) => upload_status(err),
                ReviewError::Repository(err) => repository_status(err),
            },
            Self::Address(err) => match err {
                AddressError::MissingField(_)
                | AddressError::InvalidLatitude
                | AddressError::InvalidLongitude => StatusCode::BAD_REQUEST,
                AddressError::NotFound => StatusCode::NOT_FOUND,
                AddressError::Repository(err) => repository_status(err),
            },
            Self::Wallet(err) => match err {
                WalletError::InvalidAmount
                | WalletError::TooPrecise
                | WalletError::AmountTooLarge { .. } => StatusCode::BAD_REQUEST,
                WalletError::BalanceLimit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                WalletError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
                WalletError::Repository(err) => repository_status(err),
            },
            Self::Upload(err) => upload_status(err),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            return match status {
                StatusCode::BAD_GATEWAY => "External service error".to_owned(),
                _ => INTERNAL.to_owned(),
            };
        }

        // Don't expose internal error details to clients
        match self {
            Self::Repository(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Repository(err) => err.to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_owned(),
            Self::Auth(AuthError::UserAlreadyExists) => {
                "An account with this email already exists".to_owned()
            }
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_owned(),
            Self::Auth(err) => err.to_string(),
            Self::Profile(err) => err.to_string(),
            Self::Chat(err) => err.to_string(),
            Self::Review(err) => err.to_string(),
            Self::Address(err) => err.to_string(),
            Self::Wallet(err) => err.to_string(),
            Self::Upload(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => INTERNAL.to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = self.public_message(status);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("wallet", "Payment made", Some(&[("amount", "19.99")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::backend::BackendError;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(get_status(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AuthError::UserAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(get_status(ReviewError::AlreadyReviewed), StatusCode::CONFLICT);
        assert_eq!(get_status(ReviewError::NotOwner), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AddressError::MissingField("city")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(WalletError::InsufficientFunds {
                balance: Decimal::ONE,
                requested: Decimal::TEN,
            }),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(get_status(WalletError::TooPrecise), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(WalletError::BalanceLimit { max: Decimal::ONE }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(UploadError::TooLarge { max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Repository(RepositoryError::Backend(BackendError::Encoding(
            "secret layout".into(),
        )));
        let status = err.status();
        assert_eq!(err.public_message(status), "Internal server error");

        let err = AppError::Auth(AuthError::Provider(BackendError::RateLimited));
        assert_eq!(err.public_message(err.status()), "External service error");
    }
}
