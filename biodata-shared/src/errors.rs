use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Failure families every error code belongs to. The family alone decides the
/// HTTP status, so two codes in the same family always answer alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    InvalidState,
    Unavailable,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation | Self::Conflict | Self::InvalidState => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile errors
/// - E3xxx: Interest errors
/// - E4xxx: Admin errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    EndpointNotFound,
    ServiceUnavailable,
    RequestTimeout,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,
    RefreshTokenRevoked,
    AccessTokenRequired,
    UserNotFound,
    InsufficientPermissions,

    // Profile (E2xxx)
    ProfileNotFound,
    ProfileAlreadyExists,
    ProfileNotPending,
    ProfileWithdrawn,
    NotProfileOwner,
    NoApprovedProfile,

    // Interest (E3xxx)
    InterestNotFound,
    InterestAlreadyExists,
    CannotExpressInterestInOwnProfile,
    NotInterestOwner,

    // Admin (E4xxx)
    InvalidRole,
    AccountNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::EndpointNotFound => "E0007",
            Self::ServiceUnavailable => "E0008",
            Self::RequestTimeout => "E0009",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1003",
            Self::TokenInvalid => "E1004",
            Self::RefreshTokenRevoked => "E1005",
            Self::AccessTokenRequired => "E1006",
            Self::UserNotFound => "E1007",
            Self::InsufficientPermissions => "E1008",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::ProfileAlreadyExists => "E2002",
            Self::ProfileNotPending => "E2003",
            Self::ProfileWithdrawn => "E2004",
            Self::NotProfileOwner => "E2005",
            Self::NoApprovedProfile => "E2006",

            // Interest
            Self::InterestNotFound => "E3001",
            Self::InterestAlreadyExists => "E3002",
            Self::CannotExpressInterestInOwnProfile => "E3003",
            Self::NotInterestOwner => "E3004",

            // Admin
            Self::InvalidRole => "E4001",
            Self::AccountNotFound => "E4002",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InternalError => ErrorKind::Internal,
            Self::ServiceUnavailable => ErrorKind::Unavailable,
            Self::RequestTimeout => ErrorKind::Timeout,
            Self::ValidationError | Self::InvalidRole => ErrorKind::Validation,
            Self::CannotExpressInterestInOwnProfile => ErrorKind::Validation,
            Self::NotFound | Self::EndpointNotFound | Self::ProfileNotFound
            | Self::NoApprovedProfile | Self::InterestNotFound | Self::AccountNotFound => ErrorKind::NotFound,
            Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid | Self::RefreshTokenRevoked | Self::AccessTokenRequired
            | Self::UserNotFound => ErrorKind::Unauthenticated,
            Self::InsufficientPermissions | Self::NotProfileOwner
            | Self::NotInterestOwner => ErrorKind::Forbidden,
            Self::EmailAlreadyExists | Self::ProfileAlreadyExists
            | Self::InterestAlreadyExists => ErrorKind::Conflict,
            Self::ProfileNotPending | Self::ProfileWithdrawn => ErrorKind::InvalidState,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Code this error answers with once it reaches the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }

    /// Replaces a unique-constraint violation with a domain error, leaving
    /// every other failure untouched.
    pub fn on_unique_violation(self, code: ErrorCode, message: &str) -> Self {
        if self.is_unique_violation() {
            AppError::new(code, message)
        } else {
            self
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if code.kind() == ErrorKind::Internal {
                    tracing::error!(error = %message, "internal server error");
                    (status, ApiErrorResponse::new(code.code(), "Internal server error"))
                } else {
                    let mut resp = ApiErrorResponse::new(code.code(), message);
                    if let Some(d) = details {
                        resp = resp.with_details(d.clone());
                    }
                    (status, resp)
                }
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "Internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "Resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "Internal server error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_invalid_state_answer_bad_request() {
        assert_eq!(ErrorCode::ProfileAlreadyExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InterestAlreadyExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ProfileNotPending.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn credential_failures_answer_unauthorized() {
        for code in [
            ErrorCode::AccessTokenRequired,
            ErrorCode::TokenInvalid,
            ErrorCode::TokenExpired,
            ErrorCode::UserNotFound,
            ErrorCode::InvalidCredentials,
        ] {
            assert_eq!(code.status_code(), StatusCode::UNAUTHORIZED, "{code:?}");
        }
        assert_eq!(ErrorCode::InsufficientPermissions.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unique_violation_is_rewritten() {
        let err = AppError::Database(diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key")),
        ));
        let mapped = err.on_unique_violation(ErrorCode::ProfileAlreadyExists, "User already has a profile");
        assert_eq!(mapped.code(), ErrorCode::ProfileAlreadyExists);

        let untouched = AppError::validation("bad").on_unique_violation(ErrorCode::ProfileAlreadyExists, "x");
        assert_eq!(untouched.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn timeouts_answer_with_an_envelope() {
        let response = AppError::new(ErrorCode::RequestTimeout, "Request timed out").into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "E0009");
    }

    #[tokio::test]
    async fn internal_messages_do_not_leak() {
        let response = AppError::internal("connection refused on 10.0.0.3").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("Internal server error"));
    }
}
