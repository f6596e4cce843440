//! # Request View
//!
//! Owned snapshot of an HTTP request in the shape validators see it.
//!
//! | attribute | value                                                          |
//! |-----------|----------------------------------------------------------------|
//! | `body`    | parsed JSON for JSON content types, else a UTF-8 string; `null` when empty or not read |
//! | `query`   | object of string values; repeated keys become arrays           |
//! | `params`  | object of path parameters captured by the router               |
//! | `headers` | object of lower-case header name → value                       |
//! | `method`  | request method as a string                                     |
//! | `path`    | request path                                                   |
//!
//! A body declared as JSON that does not parse is kept as its raw text, so
//! the configured `body` schema decides whether it is acceptable. The same
//! holds for a query string that cannot be decoded.
//!
//! Hosts can add further attributes with [`RequestView::insert_attribute`].

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, Query, RawPathParams, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ErrorBody;
use crate::request::RequestAttributes;

/// Largest body buffered for validation unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The request could not be turned into a [`RequestView`].
#[derive(Error, Debug)]
pub enum RequestViewError {
    /// Body exceeded the buffering limit (413).
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Body could not be read (400).
    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl IntoResponse for RequestViewError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::BodyTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::BodyRead(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };
        ErrorBody::response(status, code, self.to_string(), None)
    }
}

/// Snapshot of the validated parts of an HTTP request.
#[derive(Debug, Clone)]
pub struct RequestView {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    attributes: Map<String, Value>,
}

impl RequestView {
    /// Build a view with `query`, `headers`, `method` and `path` populated,
    /// an empty `params` object and a `null` body.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let mut attributes = Map::new();
        attributes.insert("body".to_string(), Value::Null);
        attributes.insert("query".to_string(), query_value(&uri));
        attributes.insert("params".to_string(), Value::Object(Map::new()));
        attributes.insert("headers".to_string(), Value::Object(headers_object(&headers)));
        attributes.insert("method".to_string(), Value::String(method.to_string()));
        attributes.insert("path".to_string(), Value::String(uri.path().to_string()));
        Self {
            method,
            uri,
            headers,
            attributes,
        }
    }

    /// Build a view from request parts, leaving `body` as `null`.
    ///
    /// Path parameters are read from the parts when the router captured any.
    pub async fn from_head(parts: &mut Parts) -> Self {
        let mut view = Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone());
        if let Ok(params) = RawPathParams::from_request_parts(parts, &()).await {
            let params = params
                .iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect();
            view.insert_attribute("params", Value::Object(params));
        }
        view
    }

    /// Build a view from request parts and an already-buffered body.
    pub async fn from_parts(parts: &mut Parts, body: &Bytes) -> Self {
        let mut view = Self::from_head(parts).await;
        view.insert_attribute("body", body_value(&parts.headers, body));
        view
    }

    /// Buffer `request`'s body (up to `limit` bytes), build a view, and hand
    /// back an equivalent request that can still be forwarded.
    ///
    /// # Errors
    ///
    /// [`RequestViewError::BodyTooLarge`] past `limit`,
    /// [`RequestViewError::BodyRead`] if the body stream fails.
    pub async fn from_request(
        request: Request,
        limit: usize,
    ) -> Result<(Self, Request), RequestViewError> {
        let (mut parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.is::<LengthLimitError>() {
                RequestViewError::BodyTooLarge { limit }
            } else {
                RequestViewError::BodyRead(inner.to_string())
            }
        })?;
        let view = Self::from_parts(&mut parts, &bytes).await;
        Ok((view, Request::from_parts(parts, Body::from(bytes))))
    }

    /// Build a view without touching the body, and hand back the request
    /// with its body stream unread.
    pub async fn from_request_head(request: Request) -> (Self, Request) {
        let (mut parts, body) = request.into_parts();
        let view = Self::from_head(&mut parts).await;
        (view, Request::from_parts(parts, body))
    }

    /// Set or replace an attribute.
    pub fn insert_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl RequestAttributes for RequestView {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Decoded query as an object; the raw query string if it does not decode.
fn query_value(uri: &Uri) -> Value {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => {
            let mut object = Map::new();
            for (key, value) in pairs {
                push_value(&mut object, key, Value::String(value));
            }
            Value::Object(object)
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "query string kept undecoded");
            Value::String(uri.query().unwrap_or_default().to_string())
        }
    }
}

fn headers_object(headers: &HeaderMap) -> Map<String, Value> {
    let mut object = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), Value::String(joined));
    }
    object
}

/// Insert `value` under `key`; a repeated key turns the entry into an array.
fn push_value(object: &mut Map<String, Value>, key: String, value: Value) {
    match object.get_mut(&key) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(key, value);
        }
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn body_value(headers: &HeaderMap, body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    let raw = || Value::String(String::from_utf8_lossy(body).into_owned());
    if !is_json_content_type(headers) {
        return raw();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "JSON body did not parse, validating raw text");
        raw()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn view(uri: &str) -> RequestView {
        RequestView::new(Method::GET, uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn query_values_are_strings() {
        let v = view("/orders?page=2&sort=asc");
        assert_eq!(v.attribute("query"), Some(&json!({"page": "2", "sort": "asc"})));
    }

    #[test]
    fn repeated_query_keys_become_arrays() {
        let v = view("/orders?tag=a&tag=b&tag=c");
        assert_eq!(v.attribute("query"), Some(&json!({"tag": ["a", "b", "c"]})));
    }

    #[test]
    fn empty_query_is_empty_object() {
        assert_eq!(view("/orders").attribute("query"), Some(&json!({})));
    }

    #[test]
    fn defaults_for_body_params_method_path() {
        let v = view("/orders/7");
        assert_eq!(v.attribute("body"), Some(&Value::Null));
        assert_eq!(v.attribute("params"), Some(&json!({})));
        assert_eq!(v.attribute("method"), Some(&json!("GET")));
        assert_eq!(v.attribute("path"), Some(&json!("/orders/7")));
    }

    #[test]
    fn duplicate_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("x-tenant", HeaderValue::from_static("acme"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        let v = RequestView::new(Method::GET, "/".parse().unwrap(), headers);
        assert_eq!(
            v.attribute("headers"),
            Some(&json!({"x-tenant": "acme", "accept": "text/plain, application/json"}))
        );
        assert_eq!(v.header("x-tenant"), Some("acme"));
        assert_eq!(v.headers().get_all("accept").iter().count(), 2);
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content_type(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json_content_type(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/merge-patch+json"),
        );
        assert!(is_json_content_type(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_content_type(&headers));
    }

    #[test]
    fn body_value_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(body_value(&headers, &Bytes::new()), Value::Null);
        assert_eq!(
            body_value(&headers, &Bytes::from_static(b"plain text")),
            json!("plain text")
        );

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(
            body_value(&headers, &Bytes::from_static(br#"{"id":1}"#)),
            json!({"id": 1})
        );
        assert_eq!(
            body_value(&headers, &Bytes::from_static(b"{nope")),
            json!("{nope")
        );
    }

    #[tokio::test]
    async fn from_request_keeps_body_for_forwarding() {
        let request = Request::builder()
            .method("POST")
            .uri("/items?dry_run=true")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"widget"}"#))
            .unwrap();
        let (view, request) = RequestView::from_request(request, DEFAULT_BODY_LIMIT)
            .await
            .unwrap();
        assert_eq!(view.attribute("body"), Some(&json!({"name": "widget"})));
        assert_eq!(view.method(), &Method::POST);
        assert_eq!(view.uri().query(), Some("dry_run=true"));

        let bytes = axum::body::to_bytes(request.into_body(), DEFAULT_BODY_LIMIT)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"name":"widget"}"#);
    }

    #[tokio::test]
    async fn from_request_enforces_limit() {
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .body(Body::from(vec![b'a'; 64]))
            .unwrap();
        let err = RequestView::from_request(request, 16).await.unwrap_err();
        assert!(matches!(err, RequestViewError::BodyTooLarge { limit: 16 }), "got: {err}");
    }

    #[tokio::test]
    async fn from_request_head_leaves_body_unread() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload?a=1")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (view, request) = RequestView::from_request_head(request).await;
        assert_eq!(view.attribute("body"), Some(&Value::Null));
        assert_eq!(view.attribute("query"), Some(&json!({"a": "1"})));

        let bytes = axum::body::to_bytes(request.into_body(), DEFAULT_BODY_LIMIT)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"{not json");
    }
}
