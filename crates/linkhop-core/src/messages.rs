//! Message keys for user-facing errors and their default English rendering.
//!
//! Errors carry a [`MessageKey`] rather than rendered text; the UI resolves
//! keys through its own [`MessageCatalog`] (translations live outside this
//! crate). [`DefaultCatalog`] is the English fallback used for logs and
//! `Display`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    Server,
    Network,
    Validation,
    Unknown,
}

impl MessageKey {
    /// Translation key, e.g. `"errors.unauthorized"`.
    pub fn key(&self) -> &'static str {
        match self {
            MessageKey::Unauthorized => "errors.unauthorized",
            MessageKey::Forbidden => "errors.forbidden",
            MessageKey::NotFound => "errors.not_found",
            MessageKey::TooManyRequests => "errors.too_many_requests",
            MessageKey::Server => "errors.server",
            MessageKey::Network => "errors.network",
            MessageKey::Validation => "errors.validation",
            MessageKey::Unknown => "errors.unknown",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolves message keys into display text.
pub trait MessageCatalog: Send + Sync {
    fn resolve(&self, key: MessageKey) -> Cow<'_, str>;
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl MessageCatalog for DefaultCatalog {
    fn resolve(&self, key: MessageKey) -> Cow<'_, str> {
        Cow::Borrowed(match key {
            MessageKey::Unauthorized => "You need to sign in to continue.",
            MessageKey::Forbidden => "You are not allowed to perform this action.",
            MessageKey::NotFound => "The requested resource could not be found.",
            MessageKey::TooManyRequests => "Too many requests. Please slow down and try again.",
            MessageKey::Server => "Something went wrong on our side. Please try again later.",
            MessageKey::Network => "The request could not be completed.",
            MessageKey::Validation => "The given data was invalid.",
            MessageKey::Unknown => "An unexpected error occurred.",
        })
    }
}
