//! Route gates: asynchronous preconditions checked before a view opens.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::navigation::NavigationTarget;

/// Result of evaluating a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Precondition holds; continue.
    Allow,
    /// Precondition fails; send the user elsewhere.
    Redirect(NavigationTarget),
    /// Precondition fails and the failure is already handled elsewhere.
    Deny,
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateOutcome::Allow)
    }
}

#[async_trait]
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, client: &ApiClient) -> GateOutcome;
}

/// Requires a signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthGate;

#[async_trait]
impl Gate for AuthGate {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn check(&self, client: &ApiClient) -> GateOutcome {
        match client.auth().current_user().await {
            Ok(_) => GateOutcome::Allow,
            Err(e) if e.status == Some(401) => GateOutcome::Redirect(NavigationTarget::Login),
            Err(_) => GateOutcome::Redirect(NavigationTarget::Error),
        }
    }
}

/// Requires an active subscription for the current team.
///
/// A 401 while probing fails the gate without a redirect of its own; the
/// auth redirect is left to whoever handles `http_error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionGate;

#[async_trait]
impl Gate for SubscriptionGate {
    fn name(&self) -> &'static str {
        "subscription"
    }

    async fn check(&self, client: &ApiClient) -> GateOutcome {
        match client.redirects().subscription_status().await {
            Ok(status) if status.subscribed => GateOutcome::Allow,
            Ok(_) => GateOutcome::Redirect(NavigationTarget::Pricing),
            Err(e) if e.status == Some(401) => GateOutcome::Deny,
            Err(_) => GateOutcome::Redirect(NavigationTarget::Error),
        }
    }
}

/// Evaluate `gates` in order; the first one that does not allow decides.
pub async fn run_gates(client: &ApiClient, gates: &[&dyn Gate]) -> GateOutcome {
    for gate in gates {
        let outcome = gate.check(client).await;
        if !outcome.is_allowed() {
            warn!(subsystem = "gates", gate = gate.name(), outcome = ?outcome, "Gate blocked navigation");
            return outcome;
        }
        debug!(subsystem = "gates", gate = gate.name(), "Gate passed");
    }
    GateOutcome::Allow
}
