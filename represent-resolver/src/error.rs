//! Error types for represent-resolver
//!
//! Source-level errors (`SourceError`, `GeocodeError`) stay inside the
//! pipeline; only `ResolveError` crosses the public boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Longest upstream body excerpt kept in errors and logs
const BODY_SAMPLE_CHARS: usize = 300;

/// Failure of a single upstream data source
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("No credential configured for {0}")]
    MissingCredential(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Source answered but with too little data to trust
    #[error("Insufficient data: {0}")]
    Insufficient(String),

    /// Background load task panicked or was aborted
    #[error("Load task failed: {0}")]
    Task(String),
}

impl SourceError {
    pub fn api(status: u16, body: &str) -> Self {
        SourceError::Api {
            status,
            body: body_sample(body),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Geocoding failure; terminal for the whole resolution
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Rejected before any network call
    #[error("Valid address is required: {0}")]
    InvalidAddress(String),

    #[error("No address match")]
    NoMatch,

    #[error("Address match has no usable coordinates")]
    MissingCoordinates,

    #[error("Unmappable state FIPS code: {0:?}")]
    UnknownState(Option<String>),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Public error of `Resolver::resolve`
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Address missing or too short; rejected before any network call
    #[error("Invalid argument: {0}")]
    InvalidInput(String),

    /// Address could not be geocoded to a state
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GeocodeError> for ResolveError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::InvalidAddress(msg) => ResolveError::InvalidInput(msg),
            other => {
                ResolveError::FailedPrecondition(format!("Could not geocode address: {}", other))
            }
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ResolveError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg),
            ResolveError::FailedPrecondition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "FAILED_PRECONDITION",
                msg,
            ),
            ResolveError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// First few hundred characters of an upstream body
pub fn body_sample(body: &str) -> String {
    match body.char_indices().nth(BODY_SAMPLE_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_sample_truncates() {
        let long = "x".repeat(1000);
        let sample = body_sample(&long);
        assert_eq!(sample.chars().count(), BODY_SAMPLE_CHARS + 1);
        assert_eq!(body_sample("short"), "short");
    }

    #[test]
    fn test_geocode_error_becomes_failed_precondition() {
        let err: ResolveError = GeocodeError::NoMatch.into();
        assert!(matches!(err, ResolveError::FailedPrecondition(_)));

        let err: ResolveError = GeocodeError::InvalidAddress("too short".into()).into();
        assert!(matches!(err, ResolveError::InvalidInput(_)));
    }

    #[test]
    fn test_status_codes() {
        let resp = ResolveError::InvalidInput("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ResolveError::FailedPrecondition("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let resp = ResolveError::Internal("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
