//! # linkhop-core
//!
//! Core types and building blocks for the linkhop client.
//!
//! This crate provides the pieces every feature of the client depends on:
//! declarative schema validation, the error taxonomy, the typed event bus,
//! and the small timing and paging helpers used by input-driven UI code.

pub mod debounce;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod messages;
pub mod models;
pub mod ndjson;
pub mod pagination;
pub mod schema;

// Re-export commonly used types at crate root
pub use debounce::{Debouncer, Edge, Latest, Ticket};
pub use error::{
    ApiResult, Error, ErrorKind, ErrorResponse, FieldErrors, Result, TransportError, UnifiedError,
};
pub use events::{Event, EventBus, HandlerId, Subscription};
pub use messages::{DefaultCatalog, MessageCatalog, MessageKey};
pub use models::*;
pub use ndjson::NdjsonAccumulator;
pub use pagination::{page_window, PageItem};
pub use schema::{flatten_to_dot_notation, Issue, IssueCode, PathSegment, Schema, ValidationError};
