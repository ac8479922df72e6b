//! Error types for the cartes.io client.
//!
//! # Design
//! Validation failures are split out into `ValidationError` because they are
//! raised while a payload is being constructed, before a request exists.
//! `ApiError` wraps them alongside the failures that can only happen once a
//! request is on the wire: a non-2xx status, a timeout, or a broken
//! connection. A body that is not JSON is not an error at all; see
//! `http::parse_json_response`.

use thiserror::Error;

use crate::http::HttpMethod;

/// A payload field violated one of its declared constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A numeric field fell outside its allowed range.
    #[error("{field} must be in {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// NaN or an infinity was supplied for a numeric field.
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    /// A raw request parameter held NaN or an infinity.
    #[error("parameter '{key}' must be a finite number, got {value}")]
    NonFiniteParam { key: String, value: f64 },

    /// None of a set of alternative fields was supplied.
    #[error("either '{}' must be provided", .fields.join("' or '"))]
    MissingChoice { fields: &'static [&'static str] },

    /// A closed enumeration received a value outside its vocabulary.
    #[error("invalid {field} '{value}', expected one of: {}", .allowed.join(", "))]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

/// Errors returned by `CartesClient` operations and `request_json`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a non-2xx status. `body` keeps the raw
    /// response text for debugging.
    #[error("{method} {url} returned HTTP {status}")]
    HttpStatus {
        method: HttpMethod,
        url: String,
        status: u16,
        body: String,
    },

    /// No response arrived within the configured timeout.
    #[error("{method} {url} timed out")]
    Timeout { method: HttpMethod, url: String },

    /// The connection could not be established or broke mid-exchange.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by an `HttpStatus` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_choice_names_every_field() {
        let err = ValidationError::MissingChoice {
            fields: &["category", "category_name"],
        };
        assert_eq!(
            err.to_string(),
            "either 'category' or 'category_name' must be provided"
        );
    }

    #[test]
    fn out_of_range_message_includes_bounds() {
        let err = ValidationError::OutOfRange {
            field: "lat",
            value: 100.0,
            expected: "[-90, 90]",
        };
        assert_eq!(err.to_string(), "lat must be in [-90, 90], got 100");
    }

    #[test]
    fn http_status_exposes_code() {
        let err = ApiError::HttpStatus {
            method: HttpMethod::Get,
            url: "https://cartes.io/api/maps/x".to_string(),
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "GET https://cartes.io/api/maps/x returned HTTP 404"
        );
    }

    #[test]
    fn validation_error_converts_transparently() {
        let err: ApiError = ValidationError::NotFinite {
            field: "speed",
            value: f64::NAN,
        }
        .into();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("speed must be a finite number"));
    }
}
