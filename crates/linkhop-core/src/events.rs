//! Typed publish/subscribe bus decoupling UI actions from their side effects.
//!
//! Every event is a marker type implementing [`Event`], which fixes its wire
//! name and payload type at compile time: `bus.emit::<CreatedRedirect>(&r)`
//! only accepts a [`Redirect`], and handlers registered with
//! `bus.on::<CreatedRedirect>(..)` receive `&Redirect`.
//!
//! Emission is synchronous and fire-and-forget. Handlers for an event run in
//! registration order; a panicking handler is caught and logged so the
//! remaining handlers still run. The registry lock is released before any
//! handler executes, so handlers may emit (nested emission runs inline) or
//! register further handlers. Nothing is queued: a handler registered after
//! an emission never sees it.
//!
//! The bus is a cheap `Clone` handle around shared state; construct one per
//! application and pass it to whatever needs it.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{debug, error, trace, warn};

use crate::error::UnifiedError;
use crate::models::{
    Alert, AnalyticsIntegration, Endpoint, Id, QrDesign, Redirect, RuleTestResult, Team, User,
    Webhook,
};

/// A named signal with a statically known payload type.
pub trait Event: 'static {
    /// Wire name, e.g. `"created_redirect"`.
    const NAME: &'static str;
    type Payload: Clone + Send + Sync + 'static;
}

macro_rules! events {
    ($( $(#[$meta:meta])* $ty:ident => $name:literal : $payload:ty ),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $ty;

            impl Event for $ty {
                const NAME: &'static str = $name;
                type Payload = $payload;
            }
        )*

        /// Names of every declared event.
        pub const EVENT_NAMES: &[&str] = &[$($name),*];
    };
}

events! {
    /// A user signed in.
    LoggedIn => "logged_in": User,
    LoggedOut => "logged_out": (),
    /// A new account was registered and signed in.
    Registered => "registered": User,
    EnabledOtp => "enabled_otp": (),
    ConfirmedOtp => "confirmed_otp": (),
    /// The active team changed; carries the new team id.
    ChangedTeam => "changed_team": Id,
    CreatedTeam => "created_team": Team,
    CreatedRedirect => "created_redirect": Redirect,
    CreatedEndpoint => "created_endpoint": Endpoint,
    TestedRule => "tested_rule": RuleTestResult,
    CreatedQrDesign => "created_qr_design": QrDesign,
    CreatedWebhook => "created_webhook": Webhook,
    /// Carries the deleted webhook id.
    DeletedWebhook => "deleted_webhook": Id,
    CreatedAlert => "created_alert": Alert,
    DeletedAlert => "deleted_alert": Id,
    CreatedIntegration => "created_integration": AnalyticsIntegration,
    DeletedIntegration => "deleted_integration": Id,
    /// A request failed; carries the normalized error.
    HttpError => "http_error": UnifiedError,
}

/// Identifies one registered handler, for [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type ErasedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

struct Registration {
    id: HandlerId,
    handler: ErasedHandler,
}

#[derive(Default)]
struct Registry {
    handlers: RwLock<HashMap<&'static str, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, name: &'static str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(name);
        }
        removed
    }
}

/// In-process event bus.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self
            .registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `E`. It stays registered until [`off`](Self::off).
    pub fn on<E, F>(&self, handler: F) -> HandlerId
    where
        E: Event,
        F: Fn(&E::Payload) + Send + Sync + 'static,
    {
        let id = HandlerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let erased: ErasedHandler = Arc::new(move |payload: &dyn Any| {
            if let Some(payload) = payload.downcast_ref::<E::Payload>() {
                handler(payload);
            }
        });
        self.registry
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(E::NAME)
            .or_default()
            .push(Registration {
                id,
                handler: erased,
            });
        trace!(event = E::NAME, "EventBus handler registered");
        id
    }

    /// Register an async handler. Each emission spawns it on the current
    /// tokio runtime; `emit` does not wait for it.
    pub fn on_async<E, F, Fut>(&self, handler: F) -> HandlerId
    where
        E: Event,
        F: Fn(E::Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on::<E, _>(move |payload| match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(handler(payload.clone()));
            }
            Err(_) => warn!(event = E::NAME, "No async runtime, async handler skipped"),
        })
    }

    /// Register a handler that is removed when the returned guard drops.
    ///
    /// Use for listeners tied to a UI region's lifetime.
    #[must_use = "the handler is removed as soon as the Subscription is dropped"]
    pub fn subscribe<E, F>(&self, handler: F) -> Subscription
    where
        E: Event,
        F: Fn(&E::Payload) + Send + Sync + 'static,
    {
        let id = self.on::<E, F>(handler);
        Subscription {
            registry: Arc::downgrade(&self.registry),
            name: E::NAME,
            id,
        }
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn off<E: Event>(&self, id: HandlerId) -> bool {
        self.registry.remove(E::NAME, id)
    }

    /// Invoke every handler registered for `E` and return how many ran.
    pub fn emit<E: Event>(&self, payload: &E::Payload) -> usize {
        let handlers: Vec<ErasedHandler> = self
            .registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(E::NAME)
            .map(|list| list.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default();

        debug!(
            event = E::NAME,
            handler_count = handlers.len(),
            "EventBus emit"
        );

        for handler in &handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(payload as &dyn Any)));
            if let Err(panic) = outcome {
                error!(
                    event = E::NAME,
                    error = %panic_message(panic.as_ref()),
                    "Event handler panicked"
                );
            }
        }
        handlers.len()
    }

    /// Number of handlers currently registered for `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.registry
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(E::NAME)
            .map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Guard returned by [`EventBus::subscribe`]; deregisters its handler on drop.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Registry>,
    name: &'static str,
    id: HandlerId,
}

impl Subscription {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Deregister now instead of at drop.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.name, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn redirect() -> Redirect {
        Redirect {
            id: 1,
            name: "Docs".to_string(),
            default_endpoint: "https://x.com".to_string(),
            short_url: None,
            endpoints: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_event_names_are_unique() {
        let unique: HashSet<&str> = EVENT_NAMES.iter().copied().collect();
        assert_eq!(unique.len(), EVENT_NAMES.len());
        assert!(EVENT_NAMES.contains(&"http_error"));
        assert_eq!(CreatedRedirect::NAME, "created_redirect");
    }

    #[test]
    fn test_two_handlers_receive_same_payload_instance() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            bus.on::<CreatedRedirect, _>(move |r| {
                seen.lock().unwrap().push(r as *const Redirect as usize);
            });
        }

        let payload = redirect();
        let ran = bus.emit::<CreatedRedirect>(&payload);

        let seen = seen.lock().unwrap();
        assert_eq!(ran, 2);
        assert_eq!(seen.len(), 2);
        let addr = &payload as *const Redirect as usize;
        assert!(seen.iter().all(|a| *a == addr));
    }

    #[test]
    fn test_panicking_handler_does_not_stop_siblings() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicU64::new(0));

        bus.on::<LoggedOut, _>(|_| panic!("toast renderer exploded"));
        let c = Arc::clone(&calls);
        bus.on::<LoggedOut, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.emit::<LoggedOut>(&()), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            bus.on::<ChangedTeam, _>(move |_| order.lock().unwrap().push(i));
        }
        bus.emit::<ChangedTeam>(&42);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_off_removes_handler() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let id = bus.on::<ChangedTeam, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.off::<ChangedTeam>(id));
        assert!(!bus.off::<ChangedTeam>(id));
        assert_eq!(bus.emit::<ChangedTeam>(&3), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_with_wrong_event_is_noop() {
        let bus = EventBus::new();
        let id = bus.on::<ChangedTeam, _>(|_| {});
        assert!(!bus.off::<LoggedOut>(id));
        assert_eq!(bus.handler_count::<ChangedTeam>(), 1);
    }

    #[test]
    fn test_subscription_deregisters_on_drop() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe::<DeletedWebhook, _>(|_| {});
            assert_eq!(bus.handler_count::<DeletedWebhook>(), 1);
        }
        assert_eq!(bus.handler_count::<DeletedWebhook>(), 0);

        let sub = bus.subscribe::<DeletedWebhook, _>(|_| {});
        sub.unsubscribe();
        assert_eq!(bus.handler_count::<DeletedWebhook>(), 0);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.subscribe::<LoggedOut, _>(|_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = EventBus::new();
        bus.emit::<ChangedTeam>(&1);

        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        bus.on::<ChangedTeam, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_nested_emission_runs_inline() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        let o = Arc::clone(&order);
        bus.on::<CreatedTeam, _>(move |team| {
            o.lock().unwrap().push("created_team");
            inner_bus.emit::<ChangedTeam>(&team.id);
            o.lock().unwrap().push("after_nested");
        });
        let o = Arc::clone(&order);
        bus.on::<ChangedTeam, _>(move |_| o.lock().unwrap().push("changed_team"));

        bus.emit::<CreatedTeam>(&Team {
            id: 9,
            name: "Ops".to_string(),
            personal_team: false,
            created_at: None,
        });
        assert_eq!(
            *order.lock().unwrap(),
            vec!["created_team", "changed_team", "after_nested"]
        );
    }

    #[test]
    fn test_events_are_isolated_by_name() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        bus.on::<DeletedAlert, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit::<DeletedWebhook>(&5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_async_handler_is_spawned() {
        let bus = EventBus::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        bus.on_async::<ChangedTeam, _, _>(move |team_id| {
            let tx = tx.clone();
            async move {
                tokio::task::yield_now().await;
                let _ = tx.send(team_id);
            }
        });

        assert_eq!(bus.emit::<ChangedTeam>(&77), 1);
        assert_eq!(rx.recv().await, Some(77));
    }

    #[test]
    fn test_async_handler_without_runtime_is_skipped() {
        let bus = EventBus::new();
        bus.on_async::<LoggedOut, _, _>(|_| async {});
        assert_eq!(bus.emit::<LoggedOut>(&()), 1);
    }

    #[test]
    fn test_debug_lists_handler_counts() {
        let bus = EventBus::new();
        bus.on::<LoggedOut, _>(|_| {});
        assert!(format!("{:?}", bus).contains("logged_out"));
    }
}
