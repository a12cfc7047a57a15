//! Response construction.
//!
//! # Responsibilities
//! - Turn a status and a serializable body into a response
//! - Apply the route's merged headers to outgoing responses
//!
//! # Design Decisions
//! - With `json_response` set the body is always JSON
//! - Otherwise strings go out raw and other values as JSON text
//! - Headers already set by the handler are never overwritten
//! - Content type is decided after route headers: handler, then route,
//!   then `application/json` for JSON bodies, then plain text

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

use crate::http::handler::HandlerResult;
use crate::routing::ResponseOptions;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Build a response for `body` under the effective `options`.
pub fn build_response<T>(status: StatusCode, body: &T, options: &ResponseOptions) -> HandlerResult
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(body)?;

    let mut response = if options.is_json() {
        Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&value)?))?
    } else {
        let text = match value {
            Value::Null => String::new(),
            Value::String(text) => text,
            other => other.to_string(),
        };
        Response::builder().status(status).body(Body::from(text))?
    };
    response.extensions_mut().insert(options.clone());

    Ok(response)
}

/// Add every header in `headers` the response does not already carry, then
/// default the content type.
///
/// The options recorded by [`build_response`] take precedence over the
/// route `options`.
pub fn apply_route_headers(response: &mut Response, headers: &HeaderMap, options: &ResponseOptions) {
    for name in headers.keys() {
        if response.headers().contains_key(name) {
            continue;
        }
        for value in headers.get_all(name) {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }

    if response.headers().contains_key(header::CONTENT_TYPE) {
        return;
    }

    let is_json = response
        .extensions()
        .get::<ResponseOptions>()
        .unwrap_or(options)
        .is_json();
    let content_type = if is_json {
        APPLICATION_JSON
    } else if response.body().size_hint().exact() != Some(0) {
        TEXT_PLAIN
    } else {
        return;
    };
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
}

/// Plain-text response used when no handler could produce one.
pub fn plain(status: StatusCode, message: &'static str) -> Response {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_response() {
        let mut response = build_response(StatusCode::CREATED, &json!({"id": 1}), &ResponseOptions::json()).unwrap();
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());

        apply_route_headers(&mut response, &HeaderMap::new(), &ResponseOptions::default());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_text(response).await, r#"{"id":1}"#);
    }

    #[tokio::test]
    async fn test_json_string_is_quoted() {
        let response = build_response(StatusCode::OK, "hi", &ResponseOptions::json()).unwrap();
        assert_eq!(body_text(response).await, r#""hi""#);
    }

    #[tokio::test]
    async fn test_plain_bodies() {
        let options = ResponseOptions::default();

        let text = build_response(StatusCode::OK, "hello", &options).unwrap();
        assert!(text.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(body_text(text).await, "hello");

        let object = build_response(StatusCode::OK, &json!({"a": true}), &options).unwrap();
        assert_eq!(body_text(object).await, r#"{"a":true}"#);

        let empty = build_response(StatusCode::NO_CONTENT, &(), &options).unwrap();
        assert_eq!(body_text(empty).await, "");
    }

    #[test]
    fn test_route_headers_do_not_override() {
        let mut response = build_response(StatusCode::OK, "x", &ResponseOptions::json()).unwrap();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        apply_route_headers(&mut response, &headers, &ResponseOptions::json());

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/problem+json");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");
    }

    #[test]
    fn test_per_call_options_decide_content_type() {
        let mut json = build_response(StatusCode::OK, "x", &ResponseOptions::json()).unwrap();
        apply_route_headers(&mut json, &HeaderMap::new(), &ResponseOptions::default());
        assert_eq!(json.headers()[header::CONTENT_TYPE], APPLICATION_JSON);

        let plain_options = ResponseOptions {
            json_response: Some(false),
        };
        let mut text = build_response(StatusCode::OK, "x", &plain_options).unwrap();
        apply_route_headers(&mut text, &HeaderMap::new(), &ResponseOptions::json());
        assert_eq!(text.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
    }

    #[test]
    fn test_default_content_type() {
        let mut text = build_response(StatusCode::OK, "hello", &ResponseOptions::default()).unwrap();
        apply_route_headers(&mut text, &HeaderMap::new(), &ResponseOptions::default());
        assert_eq!(text.headers()[header::CONTENT_TYPE], TEXT_PLAIN);

        let mut empty = build_response(StatusCode::OK, "", &ResponseOptions::default()).unwrap();
        apply_route_headers(&mut empty, &HeaderMap::new(), &ResponseOptions::default());
        assert!(empty.headers().get(header::CONTENT_TYPE).is_none());

        let mut raw = Response::new(Body::from("{}"));
        apply_route_headers(&mut raw, &HeaderMap::new(), &ResponseOptions::json());
        assert_eq!(raw.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
    }
}
