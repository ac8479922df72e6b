//! HTTP request and response types, plus the pure halves of the executor.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. Building
//! an `HttpRequest` (parameter cleaning, header merge, query-vs-body
//! placement) and interpreting an `HttpResponse` (status check, JSON decode
//! with fallback) never touch the network; only a `Transport` does. That
//! keeps the normalization rules testable without a server.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::params::Params;

/// Decoded response body: a JSON object or array.
pub type JsonResponse = Value;

/// Header list in insertion order. Names compare case-insensitively.
pub type Headers = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `query` is only ever populated for GET and `body` only for the other
/// methods.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Clean `params`, merge `headers` over the JSON defaults and place the
    /// parameters according to `method`.
    pub fn prepare(
        method: HttpMethod,
        url: impl Into<String>,
        headers: Option<&[(String, String)]>,
        params: Option<&Params>,
    ) -> Result<Self, ApiError> {
        let empty = Params::new();
        let params = params.unwrap_or(&empty);
        params.check_finite()?;

        let (query, body) = match method {
            HttpMethod::Get => (params.to_query_pairs(), None),
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete => {
                let body = serde_json::to_string(&Value::Object(params.to_json_object()))?;
                (Vec::new(), Some(body))
            }
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            query,
            headers: build_headers(headers.unwrap_or_default()),
            body,
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded back into JSON, for assertions and logging.
    pub fn json_body(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON content negotiation headers with `extra` merged on top. A caller
/// header replaces a default of the same name regardless of case.
pub fn build_headers(extra: &[(String, String)]) -> Headers {
    let mut headers: Headers = vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ];
    for (name, value) in extra {
        match headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.clone(),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    headers
}

/// Map a non-2xx response to `ApiError::HttpStatus`.
pub fn check_status(request: &HttpRequest, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    log::error!(
        "Request error for {} {}: HTTP {}",
        request.method,
        request.url,
        response.status
    );
    Err(ApiError::HttpStatus {
        method: request.method,
        url: request.url.clone(),
        status: response.status,
        body: response.body.clone(),
    })
}

/// Decode a success body. Objects and arrays come back as-is; anything else
/// is wrapped as `{"response": <raw text>}` so the text is not lost.
pub fn parse_json_response(body: &str) -> JsonResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        Ok(_) => {
            log::warn!("API response was JSON but not an object or array");
            raw_response(body)
        }
        Err(err) => {
            log::warn!("API response was not valid JSON: {err}");
            raw_response(body)
        }
    }
}

fn raw_response(body: &str) -> Value {
    let mut object = Map::new();
    object.insert("response".to_string(), Value::String(body.to_string()));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ValidationError;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn non_finite_params_are_not_sent() {
        let params = Params::new().set("title", "Storms").set("lat", f64::NAN);
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let err = HttpRequest::prepare(method, "http://x/api/maps", None, Some(&params)).unwrap_err();
            assert!(matches!(
                err,
                ApiError::Validation(ValidationError::NonFiniteParam { ref key, .. }) if key == "lat"
            ));
        }
    }

    #[test]
    fn get_places_params_in_query() {
        let params = Params::new()
            .set("q", "sharks")
            .set_opt::<String>("format", None);
        let req = HttpRequest::prepare(
            HttpMethod::Get,
            "https://cartes.io/api/maps/search",
            None,
            Some(&params),
        )
        .unwrap();
        assert_eq!(req.query, vec![("q".to_string(), "sharks".to_string())]);
        assert!(req.body.is_none());
    }

    #[test]
    fn post_places_params_in_body() {
        let params = Params::new()
            .set("title", "My Map")
            .set_opt::<String>("slug", None);
        let req = HttpRequest::prepare(
            HttpMethod::Post,
            "https://cartes.io/api/maps",
            None,
            Some(&params),
        )
        .unwrap();
        assert!(req.query.is_empty());
        assert_eq!(req.json_body(), Some(json!({"title": "My Map"})));
    }

    #[test]
    fn delete_without_params_sends_empty_object() {
        let req = HttpRequest::prepare(HttpMethod::Delete, "https://x/api/maps/1/claim", None, None)
            .unwrap();
        assert_eq!(req.body.as_deref(), Some("{}"));
        assert!(req.query.is_empty());
    }

    #[test]
    fn default_headers_are_json() {
        let req = HttpRequest::prepare(HttpMethod::Get, "https://x/api/users", None, None).unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
        assert_eq!(req.header("Authorization"), None);
    }

    #[test]
    fn caller_headers_override_case_insensitively() {
        let extra = vec![
            ("accept".to_string(), "text/plain".to_string()),
            ("Authorization".to_string(), "Bearer k".to_string()),
        ];
        let headers = build_headers(&extra);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[1], ("Accept".to_string(), "text/plain".to_string()));
        assert_eq!(
            headers[2],
            ("Authorization".to_string(), "Bearer k".to_string())
        );
    }

    #[test]
    fn non_success_status_is_an_error() {
        let req = HttpRequest::prepare(HttpMethod::Get, "https://x/api/maps/nope", None, None)
            .unwrap();
        let err = check_status(&req, &response(404, "{\"message\":\"Not found\"}")).unwrap_err();
        match err {
            ApiError::HttpStatus {
                method,
                url,
                status,
                body,
            } => {
                assert_eq!(method, HttpMethod::Get);
                assert_eq!(url, "https://x/api/maps/nope");
                assert_eq!(status, 404);
                assert!(body.contains("Not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn any_2xx_is_success() {
        let req = HttpRequest::prepare(HttpMethod::Post, "https://x/api/maps", None, None).unwrap();
        assert!(check_status(&req, &response(201, "")).is_ok());
        assert!(check_status(&req, &response(204, "")).is_ok());
        assert!(check_status(&req, &response(302, "")).is_err());
    }

    #[test]
    fn object_and_array_bodies_decode() {
        assert_eq!(parse_json_response(r#"{"uuid":"abc"}"#), json!({"uuid": "abc"}));
        assert_eq!(parse_json_response("[1,2]"), json!([1, 2]));
    }

    #[test]
    fn malformed_body_falls_back_to_raw_text() {
        assert_eq!(
            parse_json_response("<html>oops</html>"),
            json!({"response": "<html>oops</html>"})
        );
        assert_eq!(parse_json_response(""), json!({"response": ""}));
    }

    #[test]
    fn scalar_json_falls_back_to_raw_text() {
        assert_eq!(parse_json_response("\"ok\""), json!({"response": "\"ok\""}));
    }
}
