//! Validate, send, validate: the single path every API call takes.
//!
//! 1. Validate the request data against the request schema, if any.
//! 2. Prime the CSRF cookie when the call asks for it.
//! 3. Send the (normalized) data through the transport.
//! 4. Validate the response against the response schema, if any.
//!
//! Any failure in those steps is normalized exactly once before it reaches
//! the caller, so repositories never handle errors themselves.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use linkhop_core::{ApiResult, Error, EventBus, Result, Schema};

use crate::normalizer::ErrorNormalizer;
use crate::transport::{ByteStream, Method, RequestOptions, Transport};

/// One API call: URL, method, optional data, schemas and transport options.
#[derive(Debug)]
pub struct ApiCall<'s> {
    method: Method,
    url: String,
    data: Result<Option<Value>>,
    request_schema: Option<&'s Schema>,
    response_schema: Option<&'s Schema>,
    options: RequestOptions,
    csrf: bool,
}

impl<'s> ApiCall<'s> {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: Ok(None),
            request_schema: None,
            response_schema: None,
            options: RequestOptions::default(),
            csrf: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Request body. A serialization failure surfaces when the call runs.
    pub fn data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).map(Some).map_err(Error::from);
        self
    }

    pub fn request_schema(mut self, schema: &'s Schema) -> Self {
        self.request_schema = Some(schema);
        self
    }

    pub fn response_schema(mut self, schema: &'s Schema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch a fresh CSRF cookie after the request validates, before sending.
    pub fn with_csrf(mut self) -> Self {
        self.csrf = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Runs [`ApiCall`]s against a transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    normalizer: ErrorNormalizer,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, bus: EventBus) -> Self {
        Self {
            transport,
            normalizer: ErrorNormalizer::new(bus),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn normalizer(&self) -> &ErrorNormalizer {
        &self.normalizer
    }

    /// Run `call` and deserialize the (validated) response into `T`.
    pub async fn call<T: DeserializeOwned>(&self, call: ApiCall<'_>) -> ApiResult<T> {
        let value = self.call_raw(call).await?;
        serde_json::from_value(value).map_err(|e| self.normalizer.normalize(Error::from(e)))
    }

    /// Run `call` and return the response as JSON.
    pub async fn call_raw(&self, call: ApiCall<'_>) -> ApiResult<Value> {
        let method = call.method;
        let url = call.url.clone();
        let start = Instant::now();
        debug!(subsystem = "dispatcher", method = %method, url = %url, "Dispatch start");

        let result = self.execute(call).await;

        debug!(
            subsystem = "dispatcher",
            method = %method,
            url = %url,
            duration_ms = start.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "Dispatch finished"
        );
        result.map_err(|e| self.normalizer.normalize(e))
    }

    /// Open a streamed GET; failures to open are normalized like any call.
    pub async fn stream(&self, url: &str, options: &RequestOptions) -> ApiResult<ByteStream> {
        debug!(subsystem = "dispatcher", url = url, "Stream open");
        self.transport
            .stream(url, options)
            .await
            .map_err(|e| self.normalizer.normalize(Error::from(e)))
    }

    /// Ask the transport for a fresh CSRF token.
    pub async fn prime_csrf(&self) -> ApiResult<()> {
        self.transport
            .prime_csrf()
            .await
            .map_err(|e| self.normalizer.normalize(Error::from(e)))
    }

    async fn execute(&self, call: ApiCall<'_>) -> Result<Value> {
        let data = call.data?;
        let data = match call.request_schema {
            Some(schema) => Some(schema.parse(data.as_ref().unwrap_or(&Value::Null))?),
            None => data,
        };

        if call.csrf {
            self.transport.prime_csrf().await?;
        }

        let response = self
            .transport
            .send(call.method, &call.url, data.as_ref(), &call.options)
            .await?;

        match call.response_schema {
            Some(schema) => Ok(schema.parse(&response)?),
            None => Ok(response),
        }
    }
}
