//! Centralized default constants for the linkhop client.
//!
//! Every crate references these instead of defining its own magic values.

// =============================================================================
// API
// =============================================================================

/// Default API base URL for local development.
pub const API_URL: &str = "http://localhost:8000";

/// Cookie the server sets with the CSRF token.
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Header the CSRF token is echoed back in.
pub const CSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Path that issues a fresh CSRF cookie.
pub const CSRF_COOKIE_PATH: &str = "/sanctum/csrf-cookie";

/// Locale used when the UI has not chosen one.
pub const LOCALE: &str = "en";

// =============================================================================
// VALIDATION
// =============================================================================

/// Key holding the message list at each node of a formatted validation tree.
pub const ERRORS_KEY: &str = "_errors";

/// HTTP status attached to client- and server-side validation failures.
pub const VALIDATION_STATUS: u16 = 422;

// =============================================================================
// EVENTS & TIMING
// =============================================================================

/// Quiet period for debounced rule testing as the user types.
pub const RULE_TEST_DEBOUNCE_MS: u64 = 500;

/// Quiet period for URL protocol normalization as the user types.
pub const URL_NORMALIZE_DEBOUNCE_MS: u64 = 300;

// =============================================================================
// PAGINATION
// =============================================================================

/// Number of page links shown around the current page.
pub const PAGER_MAX_PAGES: u32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_names_pair() {
        assert_eq!(CSRF_COOKIE, "XSRF-TOKEN");
        assert_eq!(CSRF_HEADER, "X-XSRF-TOKEN");
    }

    #[test]
    fn test_api_url_is_http() {
        assert!(API_URL.starts_with("http://") || API_URL.starts_with("https://"));
    }

    #[test]
    fn test_validation_status() {
        assert_eq!(VALIDATION_STATUS, 422);
    }
}
