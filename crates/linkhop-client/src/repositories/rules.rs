//! Endpoint rules: the closed set of rule kinds and rule testing.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{trace, warn};

use linkhop_core::events::TestedRule;
use linkhop_core::{
    defaults, ApiResult, Debouncer, Latest, RuleCondition, RuleKind, RuleTestResult, RuleType,
    Schema,
};

use super::optional_text;
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

/// Value schema for one rule kind, tag included.
fn condition_variant(kind: RuleKind) -> Schema {
    let tag = ("type", Schema::literal(kind.as_str()));
    let values = || Schema::array(Schema::string().trim().non_empty()).non_empty();
    let text = || Schema::string().trim().non_empty();
    match kind {
        RuleKind::Country | RuleKind::Device | RuleKind::Language | RuleKind::OperatingSystem => {
            Schema::object([tag, ("value", values())])
        }
        RuleKind::Referrer | RuleKind::IpRange => Schema::object([tag, ("value", text())]),
        RuleKind::QueryParameter => Schema::object([
            tag,
            ("key", text()),
            ("value", Schema::string()),
        ]),
        RuleKind::TimeRange => Schema::object([tag, ("start", text()), ("end", text())]),
    }
}

/// Tagged union over every rule kind, discriminated by `type`.
pub(crate) static RULE_CONDITION: Lazy<Schema> = Lazy::new(|| {
    Schema::tagged(
        "type",
        RuleKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), condition_variant(*kind))),
    )
});

static RULE_TYPES: Lazy<Schema> = Lazy::new(|| {
    Schema::array(Schema::object([
        (
            "type",
            Schema::enumeration(RuleKind::ALL.iter().map(RuleKind::as_str)),
        ),
        ("name", Schema::string()),
        ("description", optional_text()),
    ]))
});

static TEST_RULE: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("condition", RULE_CONDITION.clone()),
        ("url", Schema::string().url().optional()),
        ("ip", Schema::string().optional()),
        ("user_agent", Schema::string().optional()),
        ("referrer", Schema::string().optional()),
        ("accept_language", Schema::string().optional()),
    ])
});

static RULE_TEST_RESULT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("matches", Schema::boolean().coerce()),
        ("reason", optional_text()),
    ])
});

/// A rule plus the simulated visit to evaluate it against.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestRuleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Rules<'a> {
    client: &'a ApiClient,
}

impl<'a> Rules<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Rule kinds the server offers, with display names.
    pub async fn list(&self) -> ApiResult<Vec<RuleType>> {
        self.client
            .dispatcher()
            .call(ApiCall::get("/api/v1/rules").response_schema(&RULE_TYPES))
            .await
    }

    /// Evaluate a rule of `kind` against a simulated visit.
    pub async fn test(&self, kind: RuleKind, input: &TestRuleInput) -> ApiResult<RuleTestResult> {
        let result: RuleTestResult = self
            .client
            .dispatcher()
            .call(
                ApiCall::post(format!("/api/v1/rules/{}/test", kind))
                    .data(input)
                    .request_schema(&TEST_RULE)
                    .response_schema(&RULE_TEST_RESULT),
            )
            .await?;
        self.client.events().emit::<TestedRule>(&result);
        Ok(result)
    }
}

/// Live preview for the rule editor.
///
/// Edits are debounced; each settled edit starts a test request and only the
/// response to the newest request is kept.
pub struct RuleTester {
    debouncer: Debouncer<(RuleKind, TestRuleInput)>,
    latest: Arc<Latest<ApiResult<RuleTestResult>>>,
}

impl RuleTester {
    pub fn new(client: ApiClient) -> Self {
        let latest = Arc::new(Latest::new());
        let slot = Arc::clone(&latest);
        let debouncer = Debouncer::trailing(
            Duration::from_millis(defaults::RULE_TEST_DEBOUNCE_MS),
            move |(kind, input): (RuleKind, TestRuleInput)| {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    warn!(subsystem = "rules", "No async runtime, rule test skipped");
                    return;
                };
                let client = client.clone();
                let slot = Arc::clone(&slot);
                let ticket = slot.ticket();
                runtime.spawn(async move {
                    let result = client.rules().test(kind, &input).await;
                    if !slot.set(ticket, result) {
                        trace!(subsystem = "rules", kind = %kind, "Stale rule test result dropped");
                    }
                });
            },
        );
        Self { debouncer, latest }
    }

    /// Record an edit of the rule under test.
    pub fn update(&self, kind: RuleKind, input: TestRuleInput) {
        self.debouncer.call((kind, input));
    }

    /// Result of the newest completed test, if any.
    pub fn result(&self) -> Option<ApiResult<RuleTestResult>> {
        self.latest.get()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::repositories::testing::{client, record};

    #[test]
    fn test_every_kind_has_a_variant() {
        let samples = [
            json!({"type": "country", "value": ["NL"]}),
            json!({"type": "device", "value": ["mobile"]}),
            json!({"type": "language", "value": ["nl", "en"]}),
            json!({"type": "operating_system", "value": ["ios"]}),
            json!({"type": "referrer", "value": "news.ycombinator.com"}),
            json!({"type": "query_parameter", "key": "utm_source", "value": "mail"}),
            json!({"type": "time_range", "start": "09:00", "end": "17:00"}),
            json!({"type": "ip_range", "value": "10.0.0.0/8"}),
        ];
        for sample in samples {
            let parsed = RULE_CONDITION.parse(&sample).unwrap();
            assert_eq!(parsed, sample);
            let condition: RuleCondition = serde_json::from_value(parsed).unwrap();
            assert_eq!(condition.kind().as_str(), sample["type"]);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected_at_tag() {
        let err = RULE_CONDITION
            .parse(&json!({"type": "weather", "value": "sunny"}))
            .unwrap_err();
        let fields = err.field_errors();
        assert!(fields["type"][0].starts_with("Invalid discriminator value"));
    }

    #[test]
    fn test_variant_fields_are_checked() {
        let err = RULE_CONDITION
            .parse(&json!({"type": "country", "value": []}))
            .unwrap_err();
        assert!(err.field_errors().contains_key("value"));
    }

    #[tokio::test]
    async fn test_rule_test_posts_to_kind_url() {
        let (client, transport) = client();
        let seen = record::<TestedRule>(&client);
        transport.push_ok(json!({"matches": true}));

        let result = client
            .rules()
            .test(
                RuleKind::Country,
                &TestRuleInput {
                    condition: Some(RuleCondition::Country {
                        value: vec!["NL".into()],
                    }),
                    ip: Some("145.1.2.3".into()),
                    ..TestRuleInput::default()
                },
            )
            .await
            .unwrap();

        assert!(result.matches);
        assert_eq!(seen.lock().unwrap().len(), 1);
        let call = transport.last_call().unwrap();
        assert_eq!(call.url, "/api/v1/rules/country/test");
        assert_eq!(
            call.body,
            Some(json!({"condition": {"type": "country", "value": ["NL"]}, "ip": "145.1.2.3"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rule_tester_debounces_edits() {
        let (client, transport) = client();
        transport.push_ok(json!({"matches": false, "reason": "country"}));
        let tester = RuleTester::new(client);

        for country in ["N", "NL", "NL"] {
            tester.update(
                RuleKind::Country,
                TestRuleInput {
                    condition: Some(RuleCondition::Country {
                        value: vec![country.into()],
                    }),
                    ..TestRuleInput::default()
                },
            );
        }
        assert!(tester.result().is_none());
        tokio::time::sleep(Duration::from_millis(defaults::RULE_TEST_DEBOUNCE_MS + 100)).await;

        assert_eq!(transport.call_count(), 1);
        let result = tester.result().unwrap().unwrap();
        assert!(!result.matches);
        assert_eq!(result.reason.as_deref(), Some("country"));
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_kind() {
        let (client, transport) = client();
        transport.push_ok(json!([{"type": "weather", "name": "Weather"}]));

        let err = client.rules().list().await.unwrap_err();
        assert!(err.field("0.type").is_some());
    }
}
