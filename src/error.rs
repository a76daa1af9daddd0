/// Error Handling Module
///
/// Layered error types for the token core and its HTTP host:
/// 1. Codec errors (access token signing and validation)
/// 2. Store errors (session persistence and identity lookup)
/// 3. Rotation errors (the only kinds surfaced by the rotation protocol)
/// 4. Configuration errors (fatal at startup)
/// 5. The HTTP-facing `AppError` with structured responses and logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::time::Duration;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Access token codec failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token algorithm is not accepted")]
    InvalidAlgorithm,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token {0} does not match configuration")]
    ClaimRejected(&'static str),
    #[error("token has expired")]
    Expired,
    #[error("token is missing required claim `{0}`")]
    MissingClaim(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Session store and identity directory failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("stored session changed concurrently")]
    Conflict,
    #[error("store does not support compare-and-save")]
    Unsupported,
}

/// Outcomes of a rejected login, refresh, logout or authentication
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("invalid access token: {0}")]
    InvalidAccessToken(#[source] CodecError),
    #[error("access token claims are malformed: {0}")]
    MalformedClaims(String),
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("subject is not known to the identity directory")]
    UnknownSubject,
    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("token issuance failed: {0}")]
    Issuance(#[source] CodecError),
}

impl RotationError {
    /// Only transient store failures are worth retrying; every other kind
    /// means the presented credential is invalid.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RotationError::StoreUnavailable(_))
    }
}

impl From<StoreError> for RotationError {
    fn from(err: StoreError) -> Self {
        RotationError::StoreUnavailable(err)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
    #[error("Config parse error: {0}")]
    ParseError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type returned by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error("Missing authentication token")]
    MissingToken,
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16, retryable: bool) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            retryable,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Rotation(e) => match e {
                RotationError::InvalidAccessToken(_) => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Invalid or expired token",
                ),
                RotationError::MalformedClaims(_) => (
                    StatusCode::UNAUTHORIZED,
                    "CLAIMS_MALFORMED",
                    "Token claims are malformed",
                ),
                RotationError::InvalidRefreshToken => (
                    StatusCode::UNAUTHORIZED,
                    "REFRESH_TOKEN_INVALID",
                    "Invalid or expired refresh token",
                ),
                RotationError::UnknownSubject => (
                    StatusCode::UNAUTHORIZED,
                    "UNKNOWN_SUBJECT",
                    "Unknown user",
                ),
                RotationError::StoreUnavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Session store temporarily unavailable",
                ),
                RotationError::Issuance(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                ),
            },
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "MISSING_TOKEN",
                "Missing authentication token",
            ),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, AppError::Rotation(e) if e.is_retryable())
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.parts();

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message.to_string(),
            code.to_string(),
            status.as_u16(),
            self.is_retryable(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Rotation(RotationError::StoreUnavailable(e)) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Session store error"
                );
            }
            AppError::Rotation(RotationError::Issuance(e)) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Token issuance error"
                );
            }
            AppError::Rotation(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Authentication error"
                );
            }
            AppError::MissingToken => {
                tracing::warn!(request_id = request_id, "Missing authentication token");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub subject_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            subject_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "subject_id": self.subject_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        if error.status_code().is_server_error() {
            tracing::error!(error = %error, context = ?context, "Operation failed");
        } else {
            tracing::warn!(error = %error, context = ?context, "Operation rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_errors_are_retryable() {
        assert!(RotationError::StoreUnavailable(StoreError::Conflict).is_retryable());
        assert!(!RotationError::InvalidRefreshToken.is_retryable());
        assert!(!RotationError::InvalidAccessToken(CodecError::Expired).is_retryable());
        assert!(!RotationError::MalformedClaims("sub".to_string()).is_retryable());
    }

    #[test]
    fn test_rotation_errors_map_to_unauthorized() {
        let err: AppError = RotationError::InvalidRefreshToken.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: AppError =
            RotationError::InvalidAccessToken(CodecError::InvalidSignature).into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err: AppError =
            RotationError::StoreUnavailable(StoreError::Timeout(Duration::from_millis(5))).into();
        let (status, body) = <AppError as ErrorHandler>::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "SERVICE_UNAVAILABLE");
        assert!(body.retryable);
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_response_hides_internal_details() {
        let err: AppError =
            RotationError::Issuance(CodecError::Signing("key material dump".to_string())).into();
        let (_, body) = <AppError as ErrorHandler>::error_response(&err, "req-2");

        assert_eq!(body.message, "Internal server error");
        assert!(!body.message.contains("key material"));
        assert!(!body.retryable);
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("token_refresh");
        assert_eq!(ctx.operation, "token_refresh");
        assert!(ctx.subject_id.is_none());

        let ctx = ctx.with_subject_id("u1");
        assert_eq!(ctx.subject_id.as_deref(), Some("u1"));
    }
}
