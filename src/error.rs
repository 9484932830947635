// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Application error type shared by the sync engine, the store and the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Exchanging the refresh token for an access token failed.
    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Track loading error: {0}")]
    Track(String),

    #[error("Invalid activity: {0}")]
    InvalidActivity(String),

    /// Activities reached the streak pass out of chronological order.
    #[error("Activity order violated: {current} follows {previous}")]
    OrderingViolation {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const STRAVA_TOKEN_ERROR: &'static str = "Strava token invalid or expired";
    pub const STRAVA_RATE_LIMIT: &'static str = "Strava rate limit exceeded";

    /// Whether this error means the stored Strava credentials are no longer usable.
    pub fn is_strava_token_error(&self) -> bool {
        match self {
            AppError::Credential(_) => true,
            AppError::StravaApi(msg) => msg == Self::STRAVA_TOKEN_ERROR,
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Credential(msg) | AppError::StravaApi(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::OrderingViolation { .. } | AppError::InvalidActivity(_) => {
                tracing::error!(error = %self, "Stored activity history is inconsistent");
                (StatusCode::INTERNAL_SERVER_ERROR, "inconsistent_history", None)
            }
            AppError::Track(msg) | AppError::Database(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, AppError>;
