//! In-memory transport for tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use linkhop_core::{defaults, TransportError};

use super::{ByteStream, Method, RequestOptions, Transport};

/// One request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

/// Records every request and answers from a FIFO queue of results.
///
/// An empty queue answers with a connection failure. CSRF priming is
/// recorded as a GET of the cookie path and succeeds unless a failure was
/// queued with [`MockTransport::fail_csrf`].
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    streams: Mutex<VecDeque<Vec<Vec<u8>>>>,
    csrf_failures: Mutex<VecDeque<TransportError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.push(Ok(value));
    }

    pub fn push_err(&self, error: TransportError) {
        self.push(Err(error));
    }

    /// Queue a non-2xx response.
    pub fn push_status(&self, status: u16, body: Option<Value>) {
        self.push_err(TransportError::Http { status, body });
    }

    /// Queue the chunks for the next [`Transport::stream`] call.
    pub fn push_stream<I, C>(&self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(chunks.into_iter().map(Into::into).collect());
    }

    /// Make the next CSRF priming fail with `error`.
    pub fn fail_csrf(&self, error: TransportError) {
        self.csrf_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    fn push(&self, result: Result<Value, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn record(&self, method: Method, url: &str, body: Option<&Value>, options: &RequestOptions) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method,
                url: url.to_string(),
                body: body.cloned(),
                options: options.clone(),
            });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, TransportError> {
        self.record(method, url, body, options);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Connection(format!(
                    "no mock response queued for {} {}",
                    method, url
                )))
            })
    }

    async fn stream(&self, url: &str, options: &RequestOptions) -> Result<ByteStream, TransportError> {
        self.record(Method::Get, url, None, options);
        let chunks = self
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| {
                TransportError::Connection(format!("no mock stream queued for GET {}", url))
            })?;
        Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }

    async fn prime_csrf(&self) -> Result<(), TransportError> {
        self.record(
            Method::Get,
            defaults::CSRF_COOKIE_PATH,
            None,
            &RequestOptions::default(),
        );
        match self
            .csrf_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_queue_in_order() {
        let transport = MockTransport::new();
        transport.push_ok(json!({"id": 1}));
        transport.push_status(404, None);

        let options = RequestOptions::default();
        assert_eq!(transport.get("/a", &options).await.unwrap(), json!({"id": 1}));
        assert_eq!(
            transport.get("/b", &options).await.unwrap_err().status(),
            Some(404)
        );
        assert!(matches!(
            transport.get("/c", &options).await.unwrap_err(),
            TransportError::Connection(_)
        ));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.last_call().unwrap().url, "/c");
    }

    #[tokio::test]
    async fn test_csrf_priming_is_recorded() {
        let transport = MockTransport::new();
        transport.fail_csrf(TransportError::Connection("refused".into()));

        assert!(transport.prime_csrf().await.is_err());
        assert!(transport.prime_csrf().await.is_ok());
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, Method::Get);
        assert_eq!(calls[0].url, defaults::CSRF_COOKIE_PATH);
    }

    #[tokio::test]
    async fn test_stream_yields_queued_chunks() {
        let transport = MockTransport::new();
        transport.push_stream(vec!["{\"a\":", "1}\n"]);

        let stream = transport
            .stream("/feed", &RequestOptions::default())
            .await
            .unwrap();
        let chunks: Vec<Vec<u8>> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec![b"{\"a\":".to_vec(), b"1}\n".to_vec()]);
    }
}
