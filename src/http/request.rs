//! Request abstraction handed to route handlers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Capture method, host, port, path and the full URL of a request
//! - Buffer the body and expose it as bytes, text or JSON
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The Host header wins over the configured origin when building the URL
//! - Body is read once by the server and shared immutably afterwards

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request};
use serde::de::DeserializeOwned;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

/// Buffered view of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: BTreeMap<String, String>,
    body: Bytes,
}

impl RequestInfo {
    /// Build from request parts and the fully read body. `origin` is used
    /// when the request carries no usable Host header.
    pub fn from_parts(parts: &Parts, body: Bytes, origin: &Url) -> Result<Self, url::ParseError> {
        let base = match parts.headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
            Some(host) if !host.is_empty() => Url::parse(&format!("{}://{}", origin.scheme(), host))?,
            _ => origin.clone(),
        };

        let target = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let url = base.join(target)?;

        // Repeated keys: last one wins.
        let query = url.query_pairs().into_owned().collect();

        Ok(Self {
            method: parts.method.clone(),
            url,
            headers: parts.headers.clone(),
            query,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Host without port; empty when the URL has none.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Explicit port, or the scheme default.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as JSON when it parses, as a JSON string otherwise; `Null` when
    /// empty.
    pub fn body_value(&self) -> serde_json::Value {
        if self.body.is_empty() {
            return serde_json::Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| serde_json::Value::String(self.text()))
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}
