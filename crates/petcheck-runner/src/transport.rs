//! HTTP client capability the dispatcher is generic over
//!
//! Production code uses [`ReqwestTransport`]; tests plug in an in-memory
//! service. A transport only fails when no response exists at all: every
//! status code, 5xx included, comes back as an [`HttpReply`].

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderValue;

/// One outgoing request, path relative to the service base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `METHOD /path` label used in logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Raw reply: status and undecoded body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

pub trait Transport {
    /// Send one request and wait for the complete reply.
    ///
    /// # Errors
    ///
    /// Only when no HTTP response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        (**self).send(request)
    }
}

/// Blocking reqwest client bound to a base URL.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (TLS backend init).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = self.client.request(request.method.clone(), &url);

        for (k, v) in &request.headers {
            // Values with control characters never reach the server
            if HeaderValue::from_str(v).is_ok() {
                req = req.header(k.as_str(), v.as_str());
            }
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.body(body.to_string());
        }

        let resp = req.send().map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(classify)?;
        Ok(HttpReply { status, body })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut req = HttpRequest::new(Method::GET, "/pet/1");
        req.headers.push(("Accept".into(), "application/json".into()));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn label_combines_method_and_path() {
        let req = HttpRequest::new(Method::DELETE, "/pet/9");
        assert_eq!(req.label(), "DELETE /pet/9");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let t = ReqwestTransport::new("http://localhost:1/v2/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.base_url, "http://localhost:1/v2");
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        // Port 9 on localhost is discard; nothing listens there in CI.
        let t = ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = t.send(&HttpRequest::new(Method::GET, "/pet/1"));
        assert!(err.is_err());
    }
}
