//! HTTP transport abstraction.
//!
//! A [`Transport`] performs one request and returns the decoded JSON body, or
//! a [`TransportError`] carrying the status and raw payload. It never
//! normalizes errors; that happens once, in the dispatcher.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use linkhop_core::TransportError;

pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::HttpTransport;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, RecordedCall};

/// Byte chunks of a streamed response body, in arrival order.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// HTTP methods the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-request extras: query parameters and additional headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Sends requests to the API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. `url` is a path relative to the API base or an
    /// absolute URL. A 2xx response with an empty body yields `Value::Null`.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, TransportError>;

    /// Open a streamed GET, yielding raw body chunks.
    async fn stream(&self, url: &str, options: &RequestOptions) -> Result<ByteStream, TransportError>;

    /// Obtain a fresh CSRF token before a state-changing session request.
    /// Transports without a cookie session have nothing to do.
    async fn prime_csrf(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn get(&self, url: &str, options: &RequestOptions) -> Result<Value, TransportError> {
        self.send(Method::Get, url, None, options).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, TransportError> {
        self.send(Method::Post, url, body, options).await
    }

    async fn put(
        &self,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, TransportError> {
        self.send(Method::Put, url, body, options).await
    }

    async fn delete(&self, url: &str, options: &RequestOptions) -> Result<Value, TransportError> {
        self.send(Method::Delete, url, None, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .query("page", 2)
            .header("X-Trace", "abc");
        assert_eq!(options.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(options.headers, vec![("X-Trace".to_string(), "abc".to_string())]);
    }

    #[tokio::test]
    async fn test_provided_methods_route_through_send() {
        let transport = MockTransport::new();
        transport.push_ok(Value::Null);
        transport.push_ok(Value::Null);
        transport.push_ok(Value::Null);
        transport.push_ok(Value::Null);

        let options = RequestOptions::default();
        let body = serde_json::json!({"a": 1});
        transport.get("/a", &options).await.unwrap();
        transport.post("/b", Some(&body), &options).await.unwrap();
        transport.put("/c", None, &options).await.unwrap();
        transport.delete("/d", &options).await.unwrap();

        let methods: Vec<Method> = transport.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec![Method::Get, Method::Post, Method::Put, Method::Delete]);
        assert_eq!(transport.calls()[1].body, Some(body));
    }
}
