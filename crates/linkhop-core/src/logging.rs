//! Structured logging field name constants for linkhop.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation can query the same names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Event handler panics, failed bootstrap |
//! | WARN  | Recoverable issue: HTTP error responses, gate denials |
//! | INFO  | Lifecycle events (client construction, login, logout) |
//! | DEBUG | Decision points: dispatch start/finish, event emission |
//! | TRACE | Per-item iteration (NDJSON lines, individual handlers) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "transport", "dispatcher", "events", "schema", "gates", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "http", "normalizer", "redirects", "navigation_guard"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_redirect", "switch_team", "prime_csrf"
pub const OPERATION: &str = "op";

// ─── Request fields ────────────────────────────────────────────────────────

/// HTTP method of an outgoing request.
pub const METHOD: &str = "method";

/// Request URL (relative to the configured base URL).
pub const URL: &str = "url";

/// HTTP status code of a response.
pub const STATUS: &str = "status";

/// Locale sent in `Accept-Language`.
pub const LOCALE: &str = "locale";

// ─── Event fields ──────────────────────────────────────────────────────────

/// Event bus event name (e.g. "created_redirect").
pub const EVENT: &str = "event";

/// Number of handlers invoked for an emission.
pub const HANDLER_COUNT: &str = "handler_count";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned by a list or stream.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Normalized error kind ("network", "server", "validation", "unknown").
pub const ERROR_KIND: &str = "error_kind";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";
