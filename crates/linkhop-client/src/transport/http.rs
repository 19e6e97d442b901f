//! reqwest-backed transport with cookie session and CSRF handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use linkhop_core::{Error, Result, TransportError};

use super::{ByteStream, Method, RequestOptions, Transport};
use crate::config::ClientConfig;
use crate::locale::Locale;

/// Transport talking to the API over HTTP.
///
/// Every request carries `Accept: application/json`,
/// `X-Requested-With: XMLHttpRequest`, the current locale as
/// `Accept-Language`, and the CSRF token read back from the session cookie.
pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
    csrf_cookie_name: String,
    csrf_header_name: String,
    csrf_cookie_path: String,
    locale: Locale,
}

impl HttpTransport {
    /// Create a transport for `config`, reading the locale from `locale` on every request.
    pub fn new(config: &ClientConfig, locale: Locale) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(Arc::clone(&jar));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "transport",
            base_url = %config.base_url,
            "Initializing HTTP transport"
        );

        Ok(Self {
            client,
            jar,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_cookie_name: config.csrf_cookie_name.clone(),
            csrf_header_name: config.csrf_header_name.clone(),
            csrf_cookie_path: config.csrf_cookie_path.clone(),
            locale,
        })
    }

    /// Current CSRF token for `url`, decoded from the session cookie.
    pub fn csrf_token(&self, url: &Url) -> Option<String> {
        let cookies = self.jar.cookies(url)?;
        let cookies = cookies.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name != self.csrf_cookie_name {
                return None;
            }
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        })
    }

    /// Resolve a path against the base URL; absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> std::result::Result<Url, TransportError> {
        let full = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        };
        Url::parse(&full).map_err(|e| TransportError::Connection(format!("Invalid URL {}: {}", full, e)))
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> std::result::Result<RequestBuilder, TransportError> {
        let url = self.resolve(url)?;
        let csrf = self.csrf_token(&url);

        let mut req = self
            .client
            .request(method.into(), url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ACCEPT_LANGUAGE, self.locale.get());

        if let Some(token) = csrf {
            req = req.header(self.csrf_header_name.as_str(), token);
        }
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        req: RequestBuilder,
    ) -> std::result::Result<Response, TransportError> {
        let start = Instant::now();
        let response = req.send().await.map_err(|e| {
            warn!(
                subsystem = "transport",
                method = %method,
                url = url,
                error = %e,
                "Request failed without response"
            );
            TransportError::Connection(e.to_string())
        })?;

        debug!(
            subsystem = "transport",
            method = %method,
            url = url,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        if !response.status().is_success() {
            let status = response.status();
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(http_error(status, &bytes));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("csrf_cookie_name", &self.csrf_cookie_name)
            .field("csrf_header_name", &self.csrf_header_name)
            .finish()
    }
}

/// Build the failure for a non-2xx response, keeping the payload when it is JSON.
fn http_error(status: StatusCode, bytes: &[u8]) -> TransportError {
    let body = if bytes.trim_ascii().is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
        )
    };
    TransportError::Http {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> std::result::Result<Value, TransportError> {
        let req = self.build_request(method, url, body, options)?;
        let response = self.execute(method, url, req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if bytes.trim_ascii().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn prime_csrf(&self) -> std::result::Result<(), TransportError> {
        debug!(subsystem = "transport", op = "prime_csrf", "Requesting CSRF cookie");
        self.send(Method::Get, &self.csrf_cookie_path, None, &RequestOptions::default())
            .await
            .map(|_| ())
    }

    async fn stream(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> std::result::Result<ByteStream, TransportError> {
        let req = self.build_request(Method::Get, url, None, options)?;
        let response = self.execute(Method::Get, url, req).await?;
        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::Connection(e.to_string()))
        });
        Ok(Box::pin(chunks))
    }
}
