// ABOUTME: Application error taxonomy with HTTP status mapping
// ABOUTME: Maps domain failures to JSON error responses without leaking internals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Application errors
//!
//! Every failure a route can surface is one of these variants. The `error`
//! field of the JSON body is the machine-readable code clients switch on;
//! `message` is the human-readable explanation. Internal detail strings are
//! logged server-side and never placed in a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Convenience result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field (e.g. `location.lat`)
    pub field: String,
    /// What the field failed to satisfy
    pub message: String,
}

impl Violation {
    /// Creates a violation for the given field path
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type that maps to HTTP responses
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body failed validation; carries every violation found
    #[error("Validation failed")]
    Validation(Vec<Violation>),

    /// No bearer token on a route that requires one
    #[error("No authorization token provided")]
    MissingToken,

    /// Token verified but its expiry has passed
    #[error("Your session has expired. Please login again.")]
    TokenExpired,

    /// Token issued before the account's revocation watermark
    #[error("Your session has been revoked. Please login again.")]
    TokenRevoked,

    /// Malformed or otherwise unverifiable token
    #[error("Invalid or malformed authorization token")]
    TokenInvalid,

    /// Credential failure outside token verification (e.g. bad login)
    #[error("{message}")]
    Unauthorized {
        /// Machine-readable code
        error: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Authenticated but not allowed (role or ownership)
    #[error("{message}")]
    Forbidden {
        /// Machine-readable code
        error: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Malformed request outside the validation rule tables
    #[error("{message}")]
    BadRequest {
        /// Machine-readable code
        error: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Referenced resource does not exist
    #[error("{message}")]
    NotFound {
        /// Machine-readable code
        error: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Request conflicts with existing state (duplicate registration)
    #[error("{message}")]
    Conflict {
        /// Machine-readable code
        error: &'static str,
        /// Human-readable message
        message: String,
    },

    /// Unexpected or external-dependency failure; detail is logged only
    #[error("{message}")]
    Internal {
        /// Machine-readable code returned to the client
        error: &'static str,
        /// Generic message returned to the client
        message: &'static str,
        /// Underlying cause, logged server-side and never returned
        detail: String,
    },
}

impl AppError {
    /// Validation failure carrying all collected violations
    #[must_use]
    pub fn validation(details: Vec<Violation>) -> Self {
        Self::Validation(details)
    }

    /// 403 forbidden with a code and message
    #[must_use]
    pub fn forbidden(error: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            error,
            message: message.into(),
        }
    }

    /// 400 bad request with a code and message
    #[must_use]
    pub fn bad_request(error: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error,
            message: message.into(),
        }
    }

    /// 401 unauthorized with a code and message
    #[must_use]
    pub fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            error,
            message: message.into(),
        }
    }

    /// 404 not found with a code and message
    #[must_use]
    pub fn not_found(error: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            error,
            message: message.into(),
        }
    }

    /// 409 conflict with a code and message
    #[must_use]
    pub fn conflict(error: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            error,
            message: message.into(),
        }
    }

    /// 500 from a document-store failure
    #[must_use]
    pub fn database(detail: impl Into<String>) -> Self {
        Self::Internal {
            error: "Internal server error",
            message: "An unexpected error occurred",
            detail: detail.into(),
        }
    }

    /// 500 with route-specific code and generic client message
    #[must_use]
    pub fn internal(
        error: &'static str,
        message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self::Internal {
            error,
            message,
            detail: detail.into(),
        }
    }

    /// Relabels an internal error with route-specific code and message
    ///
    /// Non-internal errors pass through untouched, so validation, auth, and
    /// guard failures keep their own codes when bubbling up.
    #[must_use]
    pub fn with_label(self, error: &'static str, message: &'static str) -> Self {
        match self {
            Self::Internal { detail, .. } => Self::Internal {
                error,
                message,
                detail,
            },
            other => other,
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::MissingToken
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::TokenInvalid | Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code placed in the `error` field of the body
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation failed",
            Self::MissingToken => "Access token required",
            Self::TokenExpired => "Token expired",
            Self::TokenRevoked => "Token revoked",
            Self::TokenInvalid => "Invalid token",
            Self::Unauthorized { error, .. }
            | Self::Forbidden { error, .. }
            | Self::BadRequest { error, .. }
            | Self::NotFound { error, .. }
            | Self::Conflict { error, .. }
            | Self::Internal { error, .. } => error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            Self::Validation(details) => json!({
                "error": code,
                "message": self.to_string(),
                "details": details,
            }),
            Self::Internal { detail, message, .. } => {
                error!(error = code, detail = %detail, "internal error");
                json!({ "error": code, "message": message })
            }
            _ => json!({ "error": code, "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_maps_to_401_with_code() {
        let err = AppError::MissingToken;
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "Access token required");
    }

    #[test]
    fn expired_and_invalid_are_distinct() {
        assert_eq!(AppError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TokenExpired.code(), "Token expired");
        assert_eq!(AppError::TokenInvalid.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::TokenInvalid.code(), "Invalid token");
    }

    #[test]
    fn internal_error_hides_detail_from_code_and_message() {
        let err = AppError::internal(
            "Registration failed",
            "Unable to create user account",
            "connection refused on 10.0.0.3:5432",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "Registration failed");
        assert!(!err.to_string().contains("10.0.0.3"));
    }
}
