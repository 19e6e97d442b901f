//! Shared handle to the current UI locale.

use std::sync::{Arc, PoisonError, RwLock};

/// Cheap `Clone` handle; every clone observes [`Locale::set`].
#[derive(Debug, Clone)]
pub struct Locale {
    current: Arc<RwLock<String>>,
}

impl Locale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(locale.into())),
        }
    }

    pub fn get(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, locale: impl Into<String>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = locale.into();
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(linkhop_core::defaults::LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let locale = Locale::default();
        let other = locale.clone();
        assert_eq!(other.get(), "en");
        locale.set("fr");
        assert_eq!(other.get(), "fr");
    }
}
