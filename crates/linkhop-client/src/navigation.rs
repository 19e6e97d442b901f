//! Navigation requests issued by gates and listeners.
//!
//! The SDK never routes on its own; it asks the host application's
//! [`Navigator`] to move to one of a fixed set of views.

use std::fmt;

/// Views the client may send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    /// Sign-in page.
    Login,
    /// "Too many requests" notice.
    RateLimited,
    /// Plan selection, for teams without a subscription.
    Pricing,
    /// Generic error view.
    Error,
}

impl NavigationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationTarget::Login => "login",
            NavigationTarget::RateLimited => "rate_limited",
            NavigationTarget::Pricing => "pricing",
            NavigationTarget::Error => "error",
        }
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router of the host application.
pub trait Navigator: Send + Sync {
    /// Move to `target`. Best effort; must not panic.
    fn navigate(&self, target: NavigationTarget);

    /// Whether the current view is only reachable when signed in.
    fn requires_auth(&self) -> bool;
}
