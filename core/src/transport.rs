//! Blocking I/O for prepared requests.
//!
//! # Design
//! `Transport` is the only place the network is touched. The default
//! `UreqTransport` builds a fresh agent per call with the caller's timeout,
//! so no connection state survives between invocations. Tests substitute a
//! transport that records requests and replays canned responses.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{check_status, parse_json_response, HttpMethod, HttpRequest, HttpResponse, JsonResponse};
use crate::params::Params;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes one `HttpRequest` and returns the raw response, whatever its
/// status. Only failures to obtain a response are errors here.
pub trait Transport {
    fn send(&self, request: &HttpRequest, timeout: Duration) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a blocking ureq agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, timeout: Duration) -> Result<HttpResponse, ApiError> {
        // Status interpretation belongs to `check_status`, so 3xx/4xx/5xx
        // must come back as data rather than `Err` or a followed redirect.
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .new_agent();

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(agent.get(request.url.as_str()), request).call(),
            (HttpMethod::Delete, Some(body)) => decorate(agent.delete(request.url.as_str()), request)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Delete, None) => decorate(agent.delete(request.url.as_str()), request).call(),
            (HttpMethod::Post, Some(body)) => {
                decorate(agent.post(request.url.as_str()), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => decorate(agent.post(request.url.as_str()), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                decorate(agent.put(request.url.as_str()), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => decorate(agent.put(request.url.as_str()), request).send_empty(),
        };

        let mut response = result.map_err(|err| transport_error(request, err))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Bodies are read without a size cap.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(|err| transport_error(request, err))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport_error(request: &HttpRequest, err: ureq::Error) -> ApiError {
    log::error!("Request error for {} {}: {err}", request.method, request.url);
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout {
            method: request.method,
            url: request.url.clone(),
        },
        source => ApiError::Transport {
            method: request.method,
            url: request.url.clone(),
            source,
        },
    }
}

/// Send a prepared request and normalize the outcome: non-2xx becomes
/// `ApiError::HttpStatus`, the body is decoded with the raw-text fallback.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: &HttpRequest,
    timeout: Duration,
) -> Result<JsonResponse, ApiError> {
    log::debug!("{} {} (query: {:?})", request.method, request.url, request.query);
    let response = transport.send(request, timeout)?;
    log::debug!("{} {} -> HTTP {}", request.method, request.url, response.status);
    check_status(request, &response)?;
    Ok(parse_json_response(&response.body))
}

/// One-shot executor: prepare, send over ureq, classify and decode.
pub fn request_json(
    method: HttpMethod,
    url: &str,
    headers: Option<&[(String, String)]>,
    params: Option<&Params>,
    timeout: Option<Duration>,
) -> Result<JsonResponse, ApiError> {
    let request = HttpRequest::prepare(method, url, headers, params)?;
    execute(&UreqTransport, &request, timeout.unwrap_or(DEFAULT_TIMEOUT))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use serde_json::json;

    use super::*;

    struct Canned {
        status: u16,
        body: &'static str,
        seen: RefCell<Vec<(HttpRequest, Duration)>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn send(&self, request: &HttpRequest, timeout: Duration) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push((request.clone(), timeout));
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.to_string(),
            })
        }
    }

    /// Answer every connection on a loopback port with `response`, then close
    /// it. The counter tracks how many requests arrived.
    fn loopback(response: Vec<u8>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                read_request(&mut stream);
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(&response);
            }
        });
        (format!("http://{addr}/api"), hits)
    }

    fn read_request(stream: &mut TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            line.clear();
        }
        let mut body = vec![0; content_length];
        let _ = reader.read_exact(&mut body);
    }

    fn get(url: &str) -> HttpRequest {
        HttpRequest::prepare(HttpMethod::Get, url, None, None).unwrap()
    }

    #[test]
    fn execute_decodes_success() {
        let transport = Canned::new(200, r#"[{"id":1}]"#);
        let value = execute(&transport, &get("http://x/api/categories"), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(value, json!([{"id": 1}]));
        assert_eq!(transport.seen.borrow()[0].1, Duration::from_secs(10));
    }

    #[test]
    fn execute_surfaces_status_errors() {
        let transport = Canned::new(404, "");
        let err = execute(&transport, &get("http://x/api/maps/missing"), DEFAULT_TIMEOUT).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn execute_falls_back_on_text() {
        let transport = Canned::new(200, "https://cartes.io/static/abc.png");
        let value = execute(&transport, &get("http://x/api/maps/abc/images/static"), DEFAULT_TIMEOUT)
            .unwrap();
        assert_eq!(value, json!({"response": "https://cartes.io/static/abc.png"}));
    }

    #[test]
    fn request_json_reports_connection_failures() {
        // Nothing listens on the discard port.
        let err = request_json(
            HttpMethod::Get,
            "http://127.0.0.1:9/api/maps",
            None,
            None,
            Some(Duration::from_secs(2)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport { .. } | ApiError::Timeout { .. }
        ));
    }

    #[test]
    fn redirects_surface_as_status_errors() {
        let (base, hits) = loopback(
            b"HTTP/1.1 302 Found\r\nLocation: /api/elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_vec(),
        );
        let params = Params::new().set("title", "My Map");
        let err = request_json(
            HttpMethod::Post,
            &format!("{base}/maps"),
            None,
            Some(&params),
            Some(Duration::from_secs(5)),
        )
        .unwrap_err();

        assert!(
            matches!(err, ApiError::HttpStatus { status: 302, .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn large_bodies_are_read_in_full() {
        let text = "x".repeat(11 * 1024 * 1024);
        let body = format!(r#"["{text}"]"#);
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body.as_bytes());
        let (base, _) = loopback(response);

        let value = request_json(
            HttpMethod::Get,
            &format!("{base}/markers"),
            None,
            None,
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(value[0].as_str().map(str::len), Some(text.len()));
    }
}
