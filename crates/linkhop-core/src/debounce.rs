//! Debouncing and last-write-wins helpers for input-driven requests.
//!
//! [`Debouncer`] collapses a burst of calls into one invocation after a quiet
//! period (trailing edge) or invokes on the first call and swallows the rest
//! of the burst (leading edge). A newer call supersedes the pending one; work
//! already started by an earlier invocation is never aborted, so callers that
//! assign results use [`Latest`] to keep only the newest response.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Which end of a burst triggers the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Invoke once, with the last arguments, after `wait` of silence.
    Trailing,
    /// Invoke immediately on the first call; ignore calls until `wait` of silence.
    Leading,
}

struct Inner<A> {
    func: Box<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    edge: Edge,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Debounced wrapper around `Fn(A)`. Requires a tokio runtime for timers.
pub struct Debouncer<A: Send + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F>(wait: Duration, edge: Edge, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                func: Box::new(func),
                wait,
                edge,
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn trailing<F>(wait: Duration, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(wait, Edge::Trailing, func)
    }

    pub fn leading<F>(wait: Duration, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::new(wait, Edge::Leading, func)
    }

    pub fn call(&self, args: A) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, debounced call invoked immediately");
            (self.inner.func)(args);
            return;
        };

        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let in_window = pending.as_ref().is_some_and(|h| !h.is_finished());
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let wait = self.inner.wait;
        match self.inner.edge {
            Edge::Trailing => {
                trace!(superseded = in_window, "Debounce rescheduled");
                let inner = Arc::clone(&self.inner);
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(wait).await;
                    (inner.func)(args);
                }));
            }
            Edge::Leading => {
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(wait).await;
                }));
                drop(pending);
                if !in_window {
                    (self.inner.func)(args);
                }
            }
        }
    }

    /// Drop the pending trailing invocation, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    /// Whether a timer is still running.
    pub fn is_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl<A: Send + 'static> Drop for Debouncer<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Ticket identifying one request in a last-write-wins sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Holds the result of the most recently *issued* request, discarding
/// results of requests superseded before they resolved.
#[derive(Debug, Default)]
pub struct Latest<T> {
    issued: AtomicU64,
    value: Mutex<Option<T>>,
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            value: Mutex::new(None),
        }
    }

    /// Issue a ticket before starting a request.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store `value` if `ticket` is still the newest. Returns whether it was stored.
    pub fn set(&self, ticket: Ticket, value: T) -> bool {
        if ticket.0 != self.issued.load(Ordering::SeqCst) {
            trace!(ticket = ticket.0, "Discarding superseded result");
            return false;
        }
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        true
    }

    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
