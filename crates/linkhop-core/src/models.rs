//! Domain models returned by the linkhop API.
//!
//! These are the typed views of already-validated responses: every struct is
//! deserialized from JSON that passed its response schema, so dates arrive as
//! canonical RFC-3339 strings and booleans as real booleans.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side numeric identifier.
pub type Id = u64;

// =============================================================================
// ACCOUNT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub current_team_id: Option<Id>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Secret and provisioning URI returned when enabling one-time passwords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpSetup {
    pub secret: String,
    pub qr_code_url: String,
}

/// Recovery codes issued once an OTP setup is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpConfirmation {
    #[serde(default)]
    pub recovery_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub personal_team: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// REDIRECTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub id: Id,
    pub name: String,
    pub default_endpoint: String,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Alternative destination chosen when all of its rules match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Id,
    pub redirect_id: Id,
    pub url: String,
    #[serde(default)]
    pub rules: Vec<RuleCondition>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Whether the current team may create more redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

// =============================================================================
// RULES
// =============================================================================

/// Closed set of rule kinds an endpoint can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Country,
    Device,
    Language,
    OperatingSystem,
    Referrer,
    QueryParameter,
    TimeRange,
    IpRange,
}

impl RuleKind {
    pub const ALL: [RuleKind; 8] = [
        RuleKind::Country,
        RuleKind::Device,
        RuleKind::Language,
        RuleKind::OperatingSystem,
        RuleKind::Referrer,
        RuleKind::QueryParameter,
        RuleKind::TimeRange,
        RuleKind::IpRange,
    ];

    /// Wire name, also the path segment of `/api/v1/rules/{rule}/test`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Country => "country",
            RuleKind::Device => "device",
            RuleKind::Language => "language",
            RuleKind::OperatingSystem => "operating_system",
            RuleKind::Referrer => "referrer",
            RuleKind::QueryParameter => "query_parameter",
            RuleKind::TimeRange => "time_range",
            RuleKind::IpRange => "ip_range",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single matching condition, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    /// ISO 3166-1 alpha-2 country codes.
    Country { value: Vec<String> },
    /// `mobile`, `tablet` or `desktop`.
    Device { value: Vec<String> },
    /// ISO 639-1 language codes.
    Language { value: Vec<String> },
    OperatingSystem { value: Vec<String> },
    Referrer { value: String },
    QueryParameter { key: String, value: String },
    /// `HH:MM` wall-clock bounds, inclusive.
    TimeRange { start: String, end: String },
    /// CIDR notation.
    IpRange { value: String },
}

impl RuleCondition {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleCondition::Country { .. } => RuleKind::Country,
            RuleCondition::Device { .. } => RuleKind::Device,
            RuleCondition::Language { .. } => RuleKind::Language,
            RuleCondition::OperatingSystem { .. } => RuleKind::OperatingSystem,
            RuleCondition::Referrer { .. } => RuleKind::Referrer,
            RuleCondition::QueryParameter { .. } => RuleKind::QueryParameter,
            RuleCondition::TimeRange { .. } => RuleKind::TimeRange,
            RuleCondition::IpRange { .. } => RuleKind::IpRange,
        }
    }
}

/// Rule type advertised by `GET /api/v1/rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleType {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTestResult {
    pub matches: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

// =============================================================================
// QR DESIGNS, WEBHOOKS, ALERTS, INTEGRATIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrDesign {
    pub id: Id,
    pub name: String,
    pub foreground: String,
    pub background: String,
    #[serde(default)]
    pub dot_style: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Id,
    pub redirect_id: Id,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Event type a webhook can subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEventType {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Email,
    Slack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Id,
    #[serde(default)]
    pub redirect_id: Option<Id>,
    pub threshold: u64,
    pub channel: AlertChannel,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationProvider {
    GoogleAnalytics,
    Plausible,
    Matomo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsIntegration {
    pub id: Id,
    pub provider: IntegrationProvider,
    pub measurement_id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// BILLING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in the smallest currency unit.
    pub price: i64,
    pub currency: String,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

// =============================================================================
// PAGINATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// A page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_condition_tagging() {
        let rule: RuleCondition =
            serde_json::from_value(json!({"type": "country", "value": ["NL", "BE"]})).unwrap();
        assert_eq!(rule.kind(), RuleKind::Country);

        let json = serde_json::to_value(RuleCondition::QueryParameter {
            key: "utm_source".to_string(),
            value: "newsletter".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "query_parameter");
        assert_eq!(json["key"], "utm_source");
    }

    #[test]
    fn test_rule_kind_wire_names_match_serde() {
        for kind in RuleKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, json!(kind.as_str()));
        }
    }

    #[test]
    fn test_redirect_defaults() {
        let redirect: Redirect = serde_json::from_value(json!({
            "id": 7,
            "name": "Docs",
            "default_endpoint": "https://x.com",
            "created_at": "2024-03-01T00:00:00Z"
        }))
        .unwrap();
        assert!(redirect.endpoints.is_empty());
        assert!(redirect.short_url.is_none());
    }

    #[test]
    fn test_paginated_shape() {
        let page: Paginated<Team> = serde_json::from_value(json!({
            "data": [{"id": 1, "name": "Ops"}],
            "meta": {"current_page": 1, "last_page": 3, "per_page": 15, "total": 40}
        }))
        .unwrap();
        assert_eq!(page.data[0].name, "Ops");
        assert_eq!(page.meta.last_page, 3);
    }
}
