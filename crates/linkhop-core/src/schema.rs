//! Declarative schema validation for request and response payloads.
//!
//! A [`Schema`] describes the expected shape of a JSON value: fields,
//! optionality, nullability, literal and enum constraints, nested objects and
//! arrays, and discriminated unions. Parsing validates and normalizes in one
//! pass; coercions (ISO-8601 strings to canonical timestamps, `"yes"` to
//! `true`, numeric strings to numbers) run as part of validation.
//!
//! The same schema type is used for outbound request bodies and inbound
//! responses. Failures never stop at the first problem: every [`Issue`] is
//! collected with the path to the offending field.
//!
//! ```
//! use linkhop_core::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::object([
//!     ("name", Schema::string().min_len(2)),
//!     ("active", Schema::boolean().coerce().optional()),
//! ]);
//!
//! let parsed = schema.parse(&json!({"name": "Docs", "active": "yes"})).unwrap();
//! assert_eq!(parsed, json!({"name": "Docs", "active": true}));
//!
//! let err = schema.parse(&json!({"name": "D"})).unwrap_err();
//! assert_eq!(err.issues()[0].dotted_path(), "name");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::defaults::ERRORS_KEY;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

// =============================================================================
// ISSUES
// =============================================================================

/// One step in the path to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Machine-readable category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    Required,
    InvalidType,
    TooShort,
    TooLong,
    TooSmall,
    TooBig,
    InvalidUrl,
    InvalidEmail,
    InvalidDate,
    InvalidLiteral,
    InvalidEnumValue,
    InvalidDiscriminator,
}

/// A single validation failure at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub code: IssueCode,
    pub message: String,
}

impl Issue {
    /// Path joined with dots (`"endpoints.0.url"`). Empty for the root value.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Schema mismatch carrying every issue found.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            let path = issue.dotted_path();
            if path.is_empty() {
                write!(f, "{}{}", sep, issue.message)?;
            } else {
                write!(f, "{}{}: {}", sep, path, issue.message)?;
            }
        }
        Ok(())
    }
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Render the issues as a nested tree mirroring the input shape.
    ///
    /// Every node carries an `_errors` list; children are keyed by field name
    /// or array index: `{"_errors": [], "name": {"_errors": ["Required"]}}`.
    pub fn format(&self) -> Value {
        let mut root = empty_node();
        for issue in &self.issues {
            insert_issue(&mut root, &issue.path, &issue.message);
        }
        Value::Object(root)
    }

    /// Field-keyed messages with dotted paths.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        flatten_to_dot_notation(&self.format(), ERRORS_KEY)
    }
}

fn empty_node() -> Map<String, Value> {
    let mut node = Map::new();
    node.insert(ERRORS_KEY.to_string(), Value::Array(Vec::new()));
    node
}

fn insert_issue(node: &mut Map<String, Value>, path: &[PathSegment], message: &str) {
    match path.split_first() {
        None => {
            if let Some(Value::Array(list)) = node.get_mut(ERRORS_KEY) {
                list.push(Value::String(message.to_string()));
            }
        }
        Some((head, rest)) => {
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(empty_node()));
            if let Some(child) = child.as_object_mut() {
                insert_issue(child, rest, message);
            }
        }
    }
}

/// Flatten a nested error tree into dotted-path keys.
///
/// Descent stops at the first node whose `stop_key` list is non-empty; that
/// list becomes the value for the node's path. Objects and arrays are both
/// walked, array positions becoming numeric path segments. Messages on the
/// root node are reported under the empty key.
pub fn flatten_to_dot_notation(tree: &Value, stop_key: &str) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    flatten_into(tree, "", stop_key, &mut out);
    out
}

fn flatten_into(node: &Value, prefix: &str, stop_key: &str, out: &mut BTreeMap<String, Vec<String>>) {
    match node {
        Value::Object(map) => {
            if let Some(list) = map.get(stop_key) {
                let messages = message_list(list);
                if !messages.is_empty() {
                    out.insert(prefix.to_string(), messages);
                    return;
                }
            }
            for (key, child) in map {
                if key != stop_key {
                    flatten_into(child, &join_path(prefix, key), stop_key, out);
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &join_path(prefix, &index.to_string()), stop_key, out);
            }
        }
        _ => {}
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Normalize a message node (`"msg"` or `["a", "b"]`) into a list.
pub fn message_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Recognized string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Url,
    Email,
}

#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub format: Option<StringFormat>,
    pub trim: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub integer: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub coerce: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LengthRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

/// Discriminated union: the `tag` field selects which variant validates the value.
#[derive(Debug, Clone)]
pub struct TaggedUnion {
    pub tag: String,
    pub variants: Vec<(String, Schema)>,
}

/// Declarative description of an expected value.
///
/// Constraint modifiers (`min_len`, `url`, `coerce`, ...) apply to the
/// variant they make sense for and must be chained before `optional()`,
/// `nullable()` or `default()`.
#[derive(Debug, Clone)]
pub enum Schema {
    Any,
    String(StringRules),
    Number(NumberRules),
    Boolean { coerce: bool },
    Date,
    Literal(Value),
    Enum(Vec<String>),
    Array(Box<Schema>, LengthRules),
    Object(Vec<(String, Schema)>),
    Tagged(TaggedUnion),
    Optional(Box<Schema>),
    Nullable(Box<Schema>),
    Default(Box<Schema>, Value),
}

impl Schema {
    pub fn any() -> Self {
        Schema::Any
    }

    pub fn string() -> Self {
        Schema::String(StringRules::default())
    }

    pub fn number() -> Self {
        Schema::Number(NumberRules::default())
    }

    pub fn integer() -> Self {
        Schema::Number(NumberRules {
            integer: true,
            ..NumberRules::default()
        })
    }

    pub fn boolean() -> Self {
        Schema::Boolean { coerce: false }
    }

    /// ISO-8601 timestamp or `YYYY-MM-DD` date, normalized to RFC-3339 UTC.
    pub fn date() -> Self {
        Schema::Date
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Schema::Literal(value.into())
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn array(item: Schema) -> Self {
        Schema::Array(Box::new(item), LengthRules::default())
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn tagged<I, K>(tag: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Tagged(TaggedUnion {
            tag: tag.into(),
            variants: variants.into_iter().map(|(k, s)| (k.into(), s)).collect(),
        })
    }

    pub fn optional(self) -> Self {
        Schema::Optional(Box::new(self))
    }

    pub fn nullable(self) -> Self {
        Schema::Nullable(Box::new(self))
    }

    /// Substitute `value` when the field is absent.
    pub fn default(self, value: impl Into<Value>) -> Self {
        Schema::Default(Box::new(self), value.into())
    }

    /// Add fields to an object schema. Later fields replace earlier ones of the same name.
    pub fn extend<I, K>(self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        match self {
            Schema::Object(mut fields) => {
                for (name, schema) in extra {
                    let name = name.into();
                    fields.retain(|(existing, _)| *existing != name);
                    fields.push((name, schema));
                }
                Schema::Object(fields)
            }
            other => other,
        }
    }

    pub fn min_len(mut self, n: usize) -> Self {
        match &mut self {
            Schema::String(rules) => rules.min_len = Some(n),
            Schema::Array(_, rules) => rules.min_len = Some(n),
            _ => {}
        }
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        match &mut self {
            Schema::String(rules) => rules.max_len = Some(n),
            Schema::Array(_, rules) => rules.max_len = Some(n),
            _ => {}
        }
        self
    }

    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    pub fn url(self) -> Self {
        self.with_format(StringFormat::Url)
    }

    pub fn email(self) -> Self {
        self.with_format(StringFormat::Email)
    }

    fn with_format(mut self, format: StringFormat) -> Self {
        if let Schema::String(rules) = &mut self {
            rules.format = Some(format);
        }
        self
    }

    pub fn trim(mut self) -> Self {
        if let Schema::String(rules) = &mut self {
            rules.trim = true;
        }
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        if let Schema::Number(rules) = &mut self {
            rules.min = Some(n);
        }
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        if let Schema::Number(rules) = &mut self {
            rules.max = Some(n);
        }
        self
    }

    /// Accept string spellings for numbers and booleans.
    pub fn coerce(mut self) -> Self {
        match &mut self {
            Schema::Number(rules) => rules.coerce = true,
            Schema::Boolean { coerce } => *coerce = true,
            _ => {}
        }
        self
    }

    /// Validate and normalize `value`.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut path = Vec::new();
        let mut issues = Vec::new();
        let out = self.check(Some(value), &mut path, &mut issues);
        if issues.is_empty() {
            Ok(out.unwrap_or(Value::Null))
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Returns `None` when the value is absent and allowed to be.
    fn check(
        &self,
        value: Option<&Value>,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        match self {
            Schema::Optional(inner) => match value {
                None => None,
                Some(v) => inner.check(Some(v), path, issues),
            },
            Schema::Default(inner, fallback) => match value {
                None => Some(fallback.clone()),
                Some(v) => inner.check(Some(v), path, issues),
            },
            Schema::Nullable(inner) => match value {
                Some(Value::Null) => Some(Value::Null),
                other => inner.check(other, path, issues),
            },
            Schema::Any => value.cloned(),
            _ => {
                let Some(value) = value else {
                    push(issues, path, IssueCode::Required, "Required".to_string());
                    return None;
                };
                self.check_present(value, path, issues)
            }
        }
    }

    fn check_present(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        match self {
            Schema::String(rules) => check_string(rules, value, path, issues),
            Schema::Number(rules) => check_number(rules, value, path, issues),
            Schema::Boolean { coerce } => check_boolean(*coerce, value, path, issues),
            Schema::Date => check_date(value, path, issues),
            Schema::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    push(
                        issues,
                        path,
                        IssueCode::InvalidLiteral,
                        format!("Invalid literal value, expected {}", expected),
                    );
                    None
                }
            }
            Schema::Enum(options) => check_enum(options, value, path, issues),
            Schema::Array(item, rules) => {
                let Value::Array(items) = value else {
                    invalid_type(issues, path, "array", value);
                    return None;
                };
                check_length(rules.min_len, rules.max_len, items.len(), "Array", "element(s)", path, issues);
                let mut out = Vec::with_capacity(items.len());
                for (index, element) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    out.push(item.check(Some(element), path, issues).unwrap_or(Value::Null));
                    path.pop();
                }
                Some(Value::Array(out))
            }
            Schema::Object(fields) => {
                let Value::Object(map) = value else {
                    invalid_type(issues, path, "object", value);
                    return None;
                };
                let mut out = Map::new();
                for (name, schema) in fields {
                    path.push(PathSegment::Key(name.clone()));
                    if let Some(v) = schema.check(map.get(name), path, issues) {
                        out.insert(name.clone(), v);
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
            Schema::Tagged(union) => check_tagged(union, value, path, issues),
            // Wrappers are resolved in `check`.
            Schema::Any | Schema::Optional(_) | Schema::Nullable(_) | Schema::Default(..) => {
                self.check(Some(value), path, issues)
            }
        }
    }
}

fn push(issues: &mut Vec<Issue>, path: &[PathSegment], code: IssueCode, message: String) {
    issues.push(Issue {
        path: path.to_vec(),
        code,
        message,
    });
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(issues: &mut Vec<Issue>, path: &[PathSegment], expected: &str, value: &Value) {
    push(
        issues,
        path,
        IssueCode::InvalidType,
        format!("Expected {}, received {}", expected, type_name(value)),
    );
}

fn check_length(
    min: Option<usize>,
    max: Option<usize>,
    len: usize,
    noun: &str,
    unit: &str,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) {
    if let Some(min) = min {
        if len < min {
            push(
                issues,
                path,
                IssueCode::TooShort,
                format!("{} must contain at least {} {}", noun, min, unit),
            );
        }
    }
    if let Some(max) = max {
        if len > max {
            push(
                issues,
                path,
                IssueCode::TooLong,
                format!("{} must contain at most {} {}", noun, max, unit),
            );
        }
    }
}

fn check_string(
    rules: &StringRules,
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::String(raw) = value else {
        invalid_type(issues, path, "string", value);
        return None;
    };
    let s = if rules.trim { raw.trim() } else { raw.as_str() };
    let before = issues.len();
    check_length(
        rules.min_len,
        rules.max_len,
        s.chars().count(),
        "String",
        "character(s)",
        path,
        issues,
    );
    match rules.format {
        Some(StringFormat::Url) if !is_valid_url(s) => {
            push(issues, path, IssueCode::InvalidUrl, "Invalid url".to_string());
        }
        Some(StringFormat::Email) if !EMAIL_RE.is_match(s) => {
            push(issues, path, IssueCode::InvalidEmail, "Invalid email".to_string());
        }
        _ => {}
    }
    (issues.len() == before).then(|| Value::String(s.to_string()))
}

fn is_valid_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

fn check_number(
    rules: &NumberRules,
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if rules.coerce => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(n) = n.filter(|n| n.is_finite()) else {
        invalid_type(issues, path, if rules.integer { "integer" } else { "number" }, value);
        return None;
    };
    if rules.integer && n.fract() != 0.0 {
        push(
            issues,
            path,
            IssueCode::InvalidType,
            "Expected integer, received float".to_string(),
        );
        return None;
    }
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    if rules.integer && n >= i64::MAX as f64 {
        push(
            issues,
            path,
            IssueCode::TooBig,
            format!("Number must be less than or equal to {}", i64::MAX),
        );
        return None;
    }
    if rules.integer && n < i64::MIN as f64 {
        push(
            issues,
            path,
            IssueCode::TooSmall,
            format!("Number must be greater than or equal to {}", i64::MIN),
        );
        return None;
    }
    let before = issues.len();
    if let Some(min) = rules.min {
        if n < min {
            push(
                issues,
                path,
                IssueCode::TooSmall,
                format!("Number must be greater than or equal to {}", min),
            );
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            push(
                issues,
                path,
                IssueCode::TooBig,
                format!("Number must be less than or equal to {}", max),
            );
        }
    }
    if issues.len() != before {
        return None;
    }
    match value {
        Value::Number(num) if num.is_i64() || num.is_u64() => Some(value.clone()),
        _ if rules.integer => Some(Value::from(n as i64)),
        Value::Number(_) => Some(value.clone()),
        _ => Number::from_f64(n).map(Value::Number),
    }
}

fn check_boolean(
    coerce: bool,
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if coerce => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(n) if coerce => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    match parsed {
        Some(b) => Some(Value::Bool(b)),
        None => {
            invalid_type(issues, path, "boolean", value);
            None
        }
    }
}

/// Parse an ISO-8601 timestamp, a zone-less timestamp (taken as UTC), or a plain date.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn check_date(value: &Value, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<Value> {
    let Value::String(s) = value else {
        invalid_type(issues, path, "date", value);
        return None;
    };
    match parse_iso8601(s) {
        Some(dt) => Some(Value::String(
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )),
        None => {
            push(issues, path, IssueCode::InvalidDate, "Invalid date".to_string());
            None
        }
    }
}

fn quoted_options(options: &[String]) -> String {
    options
        .iter()
        .map(|o| format!("'{}'", o))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn check_enum(
    options: &[String],
    value: &Value,
    path: &[PathSegment],
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::String(s) = value else {
        invalid_type(issues, path, "string", value);
        return None;
    };
    if options.iter().any(|o| o == s) {
        Some(value.clone())
    } else {
        push(
            issues,
            path,
            IssueCode::InvalidEnumValue,
            format!(
                "Invalid enum value. Expected {}, received '{}'",
                quoted_options(options),
                s
            ),
        );
        None
    }
}

fn check_tagged(
    union: &TaggedUnion,
    value: &Value,
    path: &mut Vec<PathSegment>,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::Object(map) = value else {
        invalid_type(issues, path, "object", value);
        return None;
    };
    let selected = map
        .get(&union.tag)
        .and_then(Value::as_str)
        .and_then(|tag| union.variants.iter().find(|(name, _)| name == tag));
    match selected {
        Some((_, schema)) => schema.check(Some(value), path, issues),
        None => {
            let names: Vec<String> = union.variants.iter().map(|(n, _)| n.clone()).collect();
            path.push(PathSegment::Key(union.tag.clone()));
            push(
                issues,
                path,
                IssueCode::InvalidDiscriminator,
                format!(
                    "Invalid discriminator value. Expected {}",
                    quoted_options(&names)
                ),
            );
            path.pop();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redirect_schema() -> Schema {
        Schema::object([
            ("name", Schema::string().min_len(2)),
            ("default_endpoint", Schema::string().url()),
            ("notes", Schema::string().optional()),
            ("archived_at", Schema::date().nullable().optional()),
        ])
    }

    #[test]
    fn test_valid_object_passes_through() {
        let out = redirect_schema()
            .parse(&json!({"name": "Docs", "default_endpoint": "https://x.com"}))
            .unwrap();
        assert_eq!(out, json!({"name": "Docs", "default_endpoint": "https://x.com"}));
    }

    #[test]
    fn test_missing_required_field_reports_path() {
        let err = redirect_schema()
            .parse(&json!({"default_endpoint": "https://x.com"}))
            .unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].dotted_path(), "name");
        assert_eq!(err.issues()[0].code, IssueCode::Required);
        assert_eq!(err.issues()[0].message, "Required");
    }

    #[test]
    fn test_collects_every_issue() {
        let err = redirect_schema()
            .parse(&json!({"name": "x", "default_endpoint": "not a url"}))
            .unwrap_err();
        let codes: Vec<IssueCode> = err.issues().iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![IssueCode::TooShort, IssueCode::InvalidUrl]);
    }

    #[test]
    fn test_unknown_keys_are_stripped() {
        let out = redirect_schema()
            .parse(&json!({"name": "Docs", "default_endpoint": "https://x.com", "extra": 1}))
            .unwrap();
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn test_nullable_accepts_null_and_rejects_for_plain_field() {
        let out = redirect_schema()
            .parse(&json!({"name": "Docs", "default_endpoint": "https://x.com", "archived_at": null}))
            .unwrap();
        assert_eq!(out["archived_at"], Value::Null);

        let err = redirect_schema()
            .parse(&json!({"name": null, "default_endpoint": "https://x.com"}))
            .unwrap_err();
        assert_eq!(err.issues()[0].message, "Expected string, received null");
    }

    #[test]
    fn test_date_coercion_matches_direct_parse() {
        let schema = Schema::object([("created_at", Schema::date())]);
        let raw = "2024-03-01T12:30:45.250+02:00";
        let out = schema.parse(&json!({"created_at": raw})).unwrap();

        let parsed: DateTime<Utc> = serde_json::from_value(out["created_at"].clone()).unwrap();
        let direct = DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc);
        assert_eq!(parsed, direct);
    }

    #[test]
    fn test_date_only_string_is_midnight_utc() {
        let out = Schema::date().parse(&json!("2024-03-01")).unwrap();
        assert_eq!(out, json!("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn test_invalid_date_references_path() {
        let schema = Schema::object([(
            "alerts",
            Schema::array(Schema::object([("fired_at", Schema::date())])),
        )]);
        let err = schema
            .parse(&json!({"alerts": [{"fired_at": "2024-01-01"}, {"fired_at": "yesterday"}]}))
            .unwrap_err();
        assert_eq!(err.issues()[0].dotted_path(), "alerts.1.fired_at");
        assert_eq!(err.issues()[0].code, IssueCode::InvalidDate);
    }

    #[test]
    fn test_boolean_coercion() {
        let schema = Schema::boolean().coerce();
        for truthy in ["1", "true", "yes", "ON"] {
            assert_eq!(schema.parse(&json!(truthy)).unwrap(), json!(true));
        }
        for falsy in ["0", "false", "no"] {
            assert_eq!(schema.parse(&json!(falsy)).unwrap(), json!(false));
        }
        assert_eq!(schema.parse(&json!(1)).unwrap(), json!(true));
        assert!(schema.parse(&json!("maybe")).is_err());
        assert!(Schema::boolean().parse(&json!("true")).is_err());
    }

    #[test]
    fn test_number_rules() {
        assert_eq!(Schema::integer().coerce().parse(&json!("42")).unwrap(), json!(42));
        assert!(Schema::integer().parse(&json!(1.5)).is_err());
        let err = Schema::number().min(1.0).parse(&json!(0)).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::TooSmall);
    }

    #[test]
    fn test_integer_out_of_range_is_rejected() {
        let schema = Schema::object([("count", Schema::integer().coerce())]);

        let err = schema.parse(&json!({"count": "1e30"})).unwrap_err();
        assert_eq!(err.issues()[0].dotted_path(), "count");
        assert_eq!(err.issues()[0].code, IssueCode::TooBig);

        let err = schema.parse(&json!({"count": 1e30})).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::TooBig);

        let err = schema.parse(&json!({"count": "-1e30"})).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::TooSmall);

        assert_eq!(
            schema.parse(&json!({"count": 3.0})).unwrap(),
            json!({"count": 3})
        );
        assert_eq!(
            schema.parse(&json!({"count": i64::MIN})).unwrap(),
            json!({"count": i64::MIN})
        );
    }

    #[test]
    fn test_enum_and_literal() {
        let schema = Schema::enumeration(["GET", "POST"]);
        assert!(schema.parse(&json!("GET")).is_ok());
        let err = schema.parse(&json!("PUT")).unwrap_err();
        assert_eq!(
            err.issues()[0].message,
            "Invalid enum value. Expected 'GET' | 'POST', received 'PUT'"
        );

        assert!(Schema::literal("country").parse(&json!("device")).is_err());
    }

    #[test]
    fn test_default_fills_absent_field() {
        let schema = Schema::object([("active", Schema::boolean().default(true))]);
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"active": true}));
    }

    #[test]
    fn test_tagged_union_selects_variant() {
        let schema = Schema::tagged(
            "type",
            [
                (
                    "country",
                    Schema::object([
                        ("type", Schema::literal("country")),
                        ("value", Schema::string().min_len(2).max_len(2)),
                    ]),
                ),
                (
                    "device",
                    Schema::object([
                        ("type", Schema::literal("device")),
                        ("value", Schema::enumeration(["mobile", "desktop"])),
                    ]),
                ),
            ],
        );
        assert!(schema.parse(&json!({"type": "country", "value": "NL"})).is_ok());
        let err = schema
            .parse(&json!({"type": "device", "value": "toaster"}))
            .unwrap_err();
        assert_eq!(err.issues()[0].dotted_path(), "value");

        let err = schema.parse(&json!({"type": "weather"})).unwrap_err();
        assert_eq!(err.issues()[0].dotted_path(), "type");
        assert_eq!(err.issues()[0].code, IssueCode::InvalidDiscriminator);
    }

    #[test]
    fn test_extend_replaces_fields() {
        let base = Schema::object([("name", Schema::string())]);
        let extended = base.extend([("name", Schema::string().optional())]);
        assert!(extended.parse(&json!({})).is_ok());
    }

    #[test]
    fn test_email_and_trim() {
        let schema = Schema::string().trim().email();
        assert_eq!(
            schema.parse(&json!("  a@b.io ")).unwrap(),
            json!("a@b.io")
        );
        assert!(schema.parse(&json!("nope")).is_err());
    }

    #[test]
    fn test_format_tree() {
        let err = redirect_schema().parse(&json!({"name": 1})).unwrap_err();
        let tree = err.format();
        assert_eq!(tree["_errors"], json!([]));
        assert_eq!(tree["name"]["_errors"], json!(["Expected string, received number"]));
        assert_eq!(tree["default_endpoint"]["_errors"], json!(["Required"]));
    }

    #[test]
    fn test_flatten_nested_arrays() {
        let tree = json!({"a": [{"b": [{"_errors": ["E"]}]}]});
        let flat = flatten_to_dot_notation(&tree, "_errors");
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a.0.b.0"], vec!["E".to_string()]);
    }

    #[test]
    fn test_flatten_skips_empty_lists() {
        let tree = json!({"_errors": [], "a": {"_errors": [], "b": {"_errors": ["x", "y"]}}});
        let flat = flatten_to_dot_notation(&tree, "_errors");
        assert_eq!(flat["a.b"], vec!["x".to_string(), "y".to_string()]);
        assert!(!flat.contains_key(""));
    }

    #[test]
    fn test_field_errors_from_issues() {
        let err = redirect_schema()
            .parse(&json!({"name": "x", "default_endpoint": "https://x.com"}))
            .unwrap_err();
        let fields = err.field_errors();
        assert_eq!(
            fields["name"],
            vec!["String must contain at least 2 character(s)".to_string()]
        );
    }

    #[test]
    fn test_root_issue_reported_under_empty_key() {
        let err = redirect_schema().parse(&json!("nope")).unwrap_err();
        let fields = err.field_errors();
        assert_eq!(fields[""], vec!["Expected object, received string".to_string()]);
    }

    #[test]
    fn test_display_lists_issues() {
        let err = redirect_schema().parse(&json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: name: Required; default_endpoint: Required"
        );
    }

    #[test]
    fn test_message_list_accepts_string_or_array() {
        assert_eq!(message_list(&json!("one")), vec!["one".to_string()]);
        assert_eq!(
            message_list(&json!(["a", "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
