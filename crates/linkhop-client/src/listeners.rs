//! Cross-cutting reactions to bus events.
//!
//! Each [`ListenerGroup`] registers a set of handlers on the bus. Groups
//! meant to live for the whole process are registered once at startup via
//! [`bootstrap_listeners`]; view-scoped listeners use
//! [`EventBus::subscribe`] instead.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, info, warn};

use linkhop_core::events::{
    ChangedTeam, ConfirmedOtp, CreatedAlert, CreatedEndpoint, CreatedIntegration, CreatedQrDesign,
    CreatedRedirect, CreatedTeam, CreatedWebhook, DeletedAlert, DeletedIntegration, DeletedWebhook,
    EnabledOtp, HttpError, LoggedIn, LoggedOut, Registered, TestedRule,
};
use linkhop_core::{ErrorKind, Event, EventBus, HandlerId};

use crate::navigation::{NavigationTarget, Navigator};

/// Expands `$func::<E>($args)` for every domain (non-error) event into a `Vec`.
macro_rules! each_domain_event {
    ($func:ident ( $($arg:expr),* )) => {
        vec![
            $func::<LoggedIn>($($arg),*),
            $func::<LoggedOut>($($arg),*),
            $func::<Registered>($($arg),*),
            $func::<EnabledOtp>($($arg),*),
            $func::<ConfirmedOtp>($($arg),*),
            $func::<ChangedTeam>($($arg),*),
            $func::<CreatedTeam>($($arg),*),
            $func::<CreatedRedirect>($($arg),*),
            $func::<CreatedEndpoint>($($arg),*),
            $func::<TestedRule>($($arg),*),
            $func::<CreatedQrDesign>($($arg),*),
            $func::<CreatedWebhook>($($arg),*),
            $func::<DeletedWebhook>($($arg),*),
            $func::<CreatedAlert>($($arg),*),
            $func::<DeletedAlert>($($arg),*),
            $func::<CreatedIntegration>($($arg),*),
            $func::<DeletedIntegration>($($arg),*),
        ]
    };
}

/// A named set of handlers registered together.
pub trait ListenerGroup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register every handler of the group and return their ids.
    fn register(&self, bus: &EventBus) -> Vec<HandlerId>;
}

/// Register process-lifetime groups. Call once at startup.
pub fn bootstrap_listeners(bus: &EventBus, groups: &[&dyn ListenerGroup]) -> Vec<HandlerId> {
    let mut ids = Vec::new();
    for group in groups {
        let registered = group.register(bus);
        debug!(
            subsystem = "events",
            component = group.name(),
            handler_count = registered.len(),
            "Listener group registered"
        );
        ids.extend(registered);
    }
    info!(subsystem = "events", handler_count = ids.len(), "Listeners bootstrapped");
    ids
}

// =============================================================================
// LOGGING
// =============================================================================

/// Traces every domain event and every request failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListeners;

fn log_event<E>(bus: &EventBus) -> HandlerId
where
    E: Event,
    E::Payload: Debug,
{
    bus.on::<E, _>(|payload| {
        info!(subsystem = "events", event = E::NAME, "Domain event");
        debug!(event = E::NAME, payload = ?payload, "Domain event payload");
    })
}

impl ListenerGroup for LoggingListeners {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn register(&self, bus: &EventBus) -> Vec<HandlerId> {
        let mut ids = each_domain_event!(log_event(bus));
        ids.push(bus.on::<HttpError, _>(|error| {
            warn!(
                subsystem = "events",
                event = HttpError::NAME,
                error_kind = %error.kind,
                status = error.status,
                message = error.message.key(),
                "Request failed"
            );
        }));
        ids
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Toast display of the host application.
pub trait Notifier: Send + Sync {
    /// Show the message for translation `key`.
    fn notify(&self, level: NotificationLevel, key: &str);
}

/// Success toasts for domain events, error toasts for failed requests.
///
/// Validation failures are left to the form that caused them.
#[derive(Clone)]
pub struct NotificationListeners {
    notifier: Arc<dyn Notifier>,
}

impl NotificationListeners {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

/// Translation key announcing a successful `E`, e.g. `notifications.created_redirect`.
pub fn success_key<E: Event>() -> String {
    format!("notifications.{}", E::NAME)
}

fn notify_success<E: Event>(bus: &EventBus, notifier: &Arc<dyn Notifier>) -> HandlerId {
    let notifier = Arc::clone(notifier);
    let key = success_key::<E>();
    bus.on::<E, _>(move |_| notifier.notify(NotificationLevel::Success, &key))
}

impl ListenerGroup for NotificationListeners {
    fn name(&self) -> &'static str {
        "notifications"
    }

    fn register(&self, bus: &EventBus) -> Vec<HandlerId> {
        let mut ids = each_domain_event!(notify_success(bus, &self.notifier));
        let notifier = Arc::clone(&self.notifier);
        ids.push(bus.on::<HttpError, _>(move |error| {
            if error.kind != ErrorKind::Validation {
                notifier.notify(NotificationLevel::Error, error.message.key());
            }
        }));
        ids
    }
}

// =============================================================================
// ANALYTICS
// =============================================================================

/// Product-analytics collector of the host application.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &'static str);
}

/// Forwards every domain event name to an [`AnalyticsSink`].
#[derive(Clone)]
pub struct AnalyticsListeners {
    sink: Arc<dyn AnalyticsSink>,
}

impl AnalyticsListeners {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }
}

fn track_event<E: Event>(bus: &EventBus, sink: &Arc<dyn AnalyticsSink>) -> HandlerId {
    let sink = Arc::clone(sink);
    bus.on::<E, _>(move |_| sink.track(E::NAME))
}

impl ListenerGroup for AnalyticsListeners {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn register(&self, bus: &EventBus) -> Vec<HandlerId> {
        each_domain_event!(track_event(bus, &self.sink))
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Redirects on 401 (when the view needs a session) and on 429.
#[derive(Clone)]
pub struct NavigationGuard {
    navigator: Arc<dyn Navigator>,
}

impl NavigationGuard {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl ListenerGroup for NavigationGuard {
    fn name(&self) -> &'static str {
        "navigation_guard"
    }

    fn register(&self, bus: &EventBus) -> Vec<HandlerId> {
        let navigator = Arc::clone(&self.navigator);
        vec![bus.on::<HttpError, _>(move |error| {
            let target = match error.status {
                Some(401) if navigator.requires_auth() => NavigationTarget::Login,
                Some(429) => NavigationTarget::RateLimited,
                _ => return,
            };
            debug!(subsystem = "events", component = "navigation_guard", target = %target, "Redirecting");
            navigator.navigate(target);
        })]
    }
}
