//! Helpers for forms that submit through the repositories.

use std::collections::BTreeMap;
use std::time::Duration;

use linkhop_core::{defaults, Debouncer, MessageKey, UnifiedError};

/// Prefix `https://` when the user typed no scheme.
///
/// Empty input stays empty; scheme-relative input (`//host`) gets `https:`.
pub fn ensure_url_protocol(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || has_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", trimmed)
    }
}

/// RFC 3986 `scheme:`. Without `//` the prefix must not look like a host
/// (`x.com:8080`) or a host with a port (`localhost:3000`).
fn has_scheme(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return false;
    }
    rest.starts_with("//")
        || (!scheme.contains('.') && !rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Debounced URL field: `on_normalized` receives the normalized text once
/// the user stops typing.
pub fn url_field_normalizer<F>(on_normalized: F) -> Debouncer<String>
where
    F: Fn(String) + Send + Sync + 'static,
{
    Debouncer::trailing(
        Duration::from_millis(defaults::URL_NORMALIZE_DEBOUNCE_MS),
        move |raw: String| on_normalized(ensure_url_protocol(&raw)),
    )
}

/// A failed submission split for display: messages next to their inputs and
/// messages for the form as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub form: Vec<String>,
    /// Message for non-validation failures, resolved by the UI's catalog.
    pub message: Option<MessageKey>,
}

impl FormErrors {
    pub fn field(&self, path: &str) -> Option<&[String]> {
        self.fields.get(path).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty() && self.message.is_none()
    }
}

impl From<&UnifiedError> for FormErrors {
    fn from(error: &UnifiedError) -> Self {
        if !error.is_validation() {
            return Self {
                message: Some(error.message),
                ..Self::default()
            };
        }
        let mut fields = error.details.clone().unwrap_or_default();
        let form = fields.remove("").unwrap_or_default();
        Self {
            fields,
            form,
            message: None,
        }
    }
}
