//! Blocking client core for the cartes.io mapping API.
//!
//! # Overview
//! Turns validated payloads into exactly one HTTP request per operation and
//! normalizes whatever comes back: non-2xx statuses become typed errors and
//! non-JSON bodies are wrapped as `{"response": <text>}` instead of failing.
//!
//! # Design
//! - Payloads (`MapPayload`, `MarkerPayload`, `MarkerLocationPayload`) are
//!   validated when built, so bad coordinates never reach the network.
//! - `Params` keeps "absent" distinct from falsy values; only absent entries
//!   are dropped before sending.
//! - `HttpRequest::prepare` and `parse_json_response` are pure; the only I/O
//!   lives behind the `Transport` trait (`UreqTransport` by default).
//! - `CartesClient` is an explicit value built from `ClientConfig`. There is
//!   no global instance.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use client::{auth_headers, CartesClient};
pub use config::{ClientConfig, ConfigError, DEFAULT_BASE_URL};
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, JsonResponse};
pub use params::{ParamValue, Params};
pub use transport::{execute, request_json, Transport, UreqTransport, DEFAULT_TIMEOUT};
pub use types::{
    validate_latitude, validate_longitude, MapListParams, MapPayload, MarkerLocationPayload,
    MarkerLocationPayloadBuilder, MarkerPayload, MarkerPayloadBuilder, Permission, Privacy,
};
