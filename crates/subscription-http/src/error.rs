// crates/subscription-http/src/error.rs
// ============================================================================
// Module: API Errors
// Description: HTTP error taxonomy and JSON envelope.
// Purpose: Map failures to stable status codes without leaking internals.
// Dependencies: axum, serde, thiserror
// ============================================================================

//! ## Overview
//! Every failed request answers `{"error": {"code": ..., "message": ...}}`.
//! Internal failures carry a fixed per-operation message; raw store error
//! text is logged, never returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Client-facing request failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Input was malformed or failed validation.
    #[error("{0}")]
    BadRequest(String),
    /// No record or route matched.
    #[error("{0}")]
    NotFound(String),
    /// A store call failed.
    #[error("{0}")]
    Internal(String),
    /// Failure outside the known taxonomy.
    #[error("internal server error")]
    Unknown,
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_SERVER",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Builds the response envelope for this error.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Top-level error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub error: ErrorBody,
}

/// Error code and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
