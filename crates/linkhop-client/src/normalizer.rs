//! Classification of raw failures into [`UnifiedError`].

use serde_json::Value;
use tracing::warn;

use linkhop_core::events::HttpError;
use linkhop_core::schema::message_list;
use linkhop_core::{
    defaults, Error, ErrorKind, EventBus, FieldErrors, MessageKey, TransportError, UnifiedError,
};

/// Turns every raw [`Error`] into a [`UnifiedError`] and announces it on the bus.
#[derive(Debug, Clone)]
pub struct ErrorNormalizer {
    bus: EventBus,
}

impl ErrorNormalizer {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Classify `error`, emit [`HttpError`] and return the result.
    ///
    /// An already-normalized error is returned unchanged and is not re-emitted.
    pub fn normalize(&self, error: Error) -> UnifiedError {
        let error = match error {
            Error::Normalized(unified) => return unified,
            other => other,
        };

        let unified = classify(&error).with_cause(error);
        warn!(
            subsystem = "dispatcher",
            component = "normalizer",
            error_kind = %unified.kind,
            status = unified.status,
            error = %unified.cause().map(ToString::to_string).unwrap_or_default(),
            "Request failed"
        );
        self.bus.emit::<HttpError>(&unified);
        unified
    }
}

/// Pure classification, without side effects or cause attached.
pub fn classify(error: &Error) -> UnifiedError {
    match error {
        Error::Normalized(unified) => unified.clone(),
        Error::Transport(TransportError::Http { status, body }) => {
            classify_status(*status, body.as_ref())
        }
        Error::Validation(e) => UnifiedError::validation(e.field_errors()),
        _ => UnifiedError::unknown(),
    }
}

/// Map a non-2xx status to its kind and message.
pub fn classify_status(status: u16, body: Option<&Value>) -> UnifiedError {
    if status == defaults::VALIDATION_STATUS {
        return UnifiedError::validation(server_field_errors(body));
    }
    let (kind, message) = match status {
        401 => (ErrorKind::Network, MessageKey::Unauthorized),
        403 => (ErrorKind::Network, MessageKey::Forbidden),
        404 => (ErrorKind::Network, MessageKey::NotFound),
        429 => (ErrorKind::Network, MessageKey::TooManyRequests),
        s if s >= 500 => (ErrorKind::Server, MessageKey::Server),
        _ => (ErrorKind::Network, MessageKey::Network),
    };
    UnifiedError::new(kind, message).with_status(status)
}

/// Field errors from a 422 body: `{"errors": {"field": ["msg"] | "msg"}}`.
fn server_field_errors(body: Option<&Value>) -> FieldErrors {
    body.and_then(|b| b.get("errors"))
        .and_then(Value::as_object)
        .map(|errors| {
            errors
                .iter()
                .map(|(field, messages)| (field.clone(), message_list(messages)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use linkhop_core::Schema;
    use serde_json::json;

    fn http(status: u16, body: Option<Value>) -> Error {
        Error::Transport(TransportError::Http { status, body })
    }

    #[test]
    fn test_status_table() {
        let cases = [
            (401, ErrorKind::Network, MessageKey::Unauthorized),
            (403, ErrorKind::Network, MessageKey::Forbidden),
            (404, ErrorKind::Network, MessageKey::NotFound),
            (429, ErrorKind::Network, MessageKey::TooManyRequests),
            (400, ErrorKind::Network, MessageKey::Network),
            (409, ErrorKind::Network, MessageKey::Network),
            (500, ErrorKind::Server, MessageKey::Server),
            (502, ErrorKind::Server, MessageKey::Server),
            (599, ErrorKind::Server, MessageKey::Server),
        ];
        for (status, kind, message) in cases {
            let err = classify_status(status, None);
            assert_eq!(err.kind, kind, "status {}", status);
            assert_eq!(err.message, message, "status {}", status);
            assert_eq!(err.status, Some(status));
            assert_eq!(err.details, None);
        }
    }

    #[test]
    fn test_422_uses_server_errors() {
        let err = classify_status(422, Some(&json!({"errors": {"name": ["too short"], "url": "bad"}})));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status, Some(422));
        assert_eq!(err.field("name"), Some(&["too short".to_string()][..]));
        assert_eq!(err.field("url"), Some(&["bad".to_string()][..]));
    }

    #[test]
    fn test_422_without_errors_has_empty_details() {
        let err = classify_status(422, Some(&json!({"message": "nope"})));
        assert_eq!(err.details, Some(FieldErrors::new()));
        let err = classify_status(422, None);
        assert_eq!(err.details, Some(FieldErrors::new()));
    }

    #[test]
    fn test_schema_failure_is_flattened() {
        let schema = Schema::object([(
            "endpoints",
            Schema::array(Schema::object([("url", Schema::string().url())])),
        )]);
        let e = schema
            .parse(&json!({"endpoints": [{"url": "https://ok.io"}, {"url": "nope"}]}))
            .unwrap_err();
        let err = classify(&Error::Validation(e));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status, Some(422));
        assert_eq!(err.field("endpoints.1.url"), Some(&["Invalid url".to_string()][..]));
    }

    #[test]
    fn test_other_failures_are_unknown() {
        for error in [
            Error::Transport(TransportError::Connection("refused".into())),
            Error::Transport(TransportError::Decode("eof".into())),
            Error::Serialization("bad".into()),
            Error::Internal("boom".into()),
        ] {
            let err = classify(&error);
            assert_eq!(err.kind, ErrorKind::Unknown);
            assert_eq!(err.message, MessageKey::Unknown);
            assert_eq!(err.status, None);
        }
    }

    #[test]
    fn test_normalize_emits_http_error() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.on::<HttpError, _>(move |e| sink.lock().unwrap().push(e.clone()));

        let normalizer = ErrorNormalizer::new(bus);
        let err = normalizer.normalize(http(401, None));

        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.cause().is_some());
        assert_eq!(*seen.lock().unwrap(), vec![err]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.on::<HttpError, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let normalizer = ErrorNormalizer::new(bus);
        let once = normalizer.normalize(http(500, None));
        let twice = normalizer.normalize(Error::Normalized(once.clone()));

        assert_eq!(once, twice);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
