//! Subscription products, as a list or as a streamed NDJSON feed.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, trace};

use linkhop_core::{ApiResult, Error, NdjsonAccumulator, Product, Schema};

use super::optional_text;
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;
use crate::normalizer::ErrorNormalizer;
use crate::transport::{ByteStream, RequestOptions};

const PRODUCTS_URL: &str = "/api/v1/products";

static PRODUCT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", Schema::string().non_empty()),
        ("name", Schema::string()),
        ("description", optional_text()),
        ("price", Schema::integer().coerce()),
        ("currency", Schema::string().min_len(3).max_len(3)),
        ("interval", optional_text()),
        (
            "features",
            Schema::array(Schema::string()).default(Value::Array(Vec::new())),
        ),
    ])
});

static PRODUCTS: Lazy<Schema> = Lazy::new(|| Schema::array(PRODUCT.clone()));

/// Products as they arrive; each item is validated on its own.
pub type ProductStream = BoxStream<'static, ApiResult<Product>>;

#[derive(Debug, Clone, Copy)]
pub struct Products<'a> {
    client: &'a ApiClient,
}

impl<'a> Products<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Product>> {
        self.client
            .dispatcher()
            .call(ApiCall::get(PRODUCTS_URL).response_schema(&PRODUCTS))
            .await
    }

    /// Stream the catalogue line by line.
    ///
    /// A line that fails to parse or validate yields an error item; the
    /// stream continues with the next line.
    pub async fn stream(&self) -> ApiResult<ProductStream> {
        let dispatcher = self.client.dispatcher();
        let bytes = dispatcher
            .stream(PRODUCTS_URL, &RequestOptions::new().query("stream", "true"))
            .await?;
        debug!(subsystem = "products", op = "stream", "Product feed opened");

        let feed = Feed {
            bytes,
            lines: Some(NdjsonAccumulator::new()),
            ready: VecDeque::new(),
            normalizer: dispatcher.normalizer().clone(),
        };
        Ok(stream::unfold(feed, |mut feed| async move {
            let item = feed.next_item().await?;
            Some((item, feed))
        })
        .boxed())
    }
}

struct Feed {
    bytes: ByteStream,
    /// `None` once the body has ended.
    lines: Option<NdjsonAccumulator<Value>>,
    ready: VecDeque<ApiResult<Product>>,
    normalizer: ErrorNormalizer,
}

impl Feed {
    async fn next_item(&mut self) -> Option<ApiResult<Product>> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            let lines = self.lines.as_mut()?;
            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    for line in lines.push(&chunk) {
                        let item = self.validate(line);
                        self.ready.push_back(item);
                    }
                }
                Some(Err(e)) => {
                    self.lines = None;
                    let err = self.normalizer.normalize(Error::Transport(e));
                    self.ready.push_back(Err(err));
                }
                None => {
                    let lines = self.lines.take()?;
                    trace!(lines = lines.lines_parsed(), "Product feed ended");
                    if let Some(line) = lines.finish().transpose() {
                        let item = self.validate(line);
                        self.ready.push_back(item);
                    }
                }
            }
        }
    }

    fn validate(&self, line: linkhop_core::Result<Value>) -> ApiResult<Product> {
        line.and_then(|value| PRODUCT.parse(&value).map_err(Error::from))
            .and_then(|valid| serde_json::from_value(valid).map_err(Error::from))
            .map_err(|e| self.normalizer.normalize(e))
    }
}
