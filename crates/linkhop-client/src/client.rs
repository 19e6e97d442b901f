//! The application context every feature receives.

use std::sync::Arc;

use tracing::info;

use linkhop_core::{EventBus, Result};

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::locale::Locale;
use crate::repositories::{
    Alerts, Auth, Integrations, Products, QrDesigns, Redirects, Rules, Teams, Webhooks,
};
use crate::transport::{HttpTransport, Transport};

/// Configured API client: config, event bus, locale and dispatcher.
///
/// Construct one per process and hand clones to whatever needs the API;
/// clones share the bus, the locale and the cookie session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    bus: EventBus,
    locale: Locale,
    dispatcher: Dispatcher,
}

impl ApiClient {
    /// Client talking HTTP to `config.base_url` with a fresh event bus.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let locale = Locale::new(config.locale.clone());
        let transport = HttpTransport::new(&config, locale.clone())?;
        info!(
            subsystem = "client",
            base_url = %config.base_url,
            locale = %config.locale,
            "API client ready"
        );
        Ok(Self::assemble(config, Arc::new(transport), EventBus::new(), locale))
    }

    /// Client over an arbitrary transport and an existing bus.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>, bus: EventBus) -> Self {
        let locale = Locale::new(config.locale.clone());
        Self::assemble(config, transport, bus, locale)
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn Transport>, bus: EventBus, locale: Locale) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(transport, bus.clone()),
            bus,
            locale,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }

    pub fn teams(&self) -> Teams<'_> {
        Teams::new(self)
    }

    pub fn redirects(&self) -> Redirects<'_> {
        Redirects::new(self)
    }

    pub fn rules(&self) -> Rules<'_> {
        Rules::new(self)
    }

    pub fn qr_designs(&self) -> QrDesigns<'_> {
        QrDesigns::new(self)
    }

    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(self)
    }

    pub fn alerts(&self) -> Alerts<'_> {
        Alerts::new(self)
    }

    pub fn integrations(&self) -> Integrations<'_> {
        Integrations::new(self)
    }

    pub fn products(&self) -> Products<'_> {
        Products::new(self)
    }
}
