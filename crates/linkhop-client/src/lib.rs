//! # linkhop-client
//!
//! Validated API access for the linkhop link-redirect service.
//!
//! This crate provides:
//! - HTTP transport with cookie session, CSRF priming and locale headers
//! - Request dispatcher validating data before sending and responses after
//! - Error normalization into [`UnifiedError`](linkhop_core::UnifiedError),
//!   broadcast as `http_error` on the event bus
//! - Feature repositories (auth, teams, redirects, rules, QR designs,
//!   webhooks, alerts, integrations, products)
//! - Route gates, listener groups and form helpers for UI hosts
//!
//! # Feature Flags
//!
//! - `mock`: expose [`MockTransport`](transport::MockTransport) to downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use linkhop_client::{ApiClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(ClientConfig::load()?)?;
//!     let page = client.redirects().list(1).await?;
//!     println!("{} redirects", page.meta.total);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod forms;
pub mod gates;
pub mod listeners;
pub mod locale;
pub mod navigation;
pub mod normalizer;
pub mod repositories;
pub mod transport;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError, ConfigResult};
pub use dispatcher::{ApiCall, Dispatcher};
pub use forms::{ensure_url_protocol, FormErrors};
pub use gates::{run_gates, AuthGate, Gate, GateOutcome, SubscriptionGate};
pub use listeners::{
    bootstrap_listeners, AnalyticsListeners, AnalyticsSink, ListenerGroup, LoggingListeners,
    NavigationGuard, NotificationLevel, NotificationListeners, Notifier,
};
pub use locale::Locale;
pub use navigation::{NavigationTarget, Navigator};
pub use normalizer::ErrorNormalizer;
pub use transport::{HttpTransport, Method, RequestOptions, Transport};
