//! Redirects and their conditional endpoints.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use linkhop_core::events::{CreatedEndpoint, CreatedRedirect};
use linkhop_core::{
    ApiResult, Endpoint, Id, Paginated, Redirect, RuleCondition, Schema, SubscriptionStatus,
};

use super::rules::RULE_CONDITION;
use super::{id, optional_text, paginated, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;
use crate::transport::RequestOptions;

pub(crate) static ENDPOINT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("redirect_id", id()),
        ("url", Schema::string()),
        (
            "rules",
            Schema::array(RULE_CONDITION.clone()).default(Value::Array(Vec::new())),
        ),
        ("created_at", timestamp()),
    ])
});

pub(crate) static REDIRECT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("name", Schema::string()),
        ("default_endpoint", Schema::string()),
        ("short_url", optional_text()),
        (
            "endpoints",
            Schema::array(ENDPOINT.clone()).default(Value::Array(Vec::new())),
        ),
        ("created_at", Schema::date()),
        ("updated_at", timestamp()),
    ])
});

static REDIRECT_PAGE: Lazy<Schema> = Lazy::new(|| paginated(REDIRECT.clone()));

static CREATE_REDIRECT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("name", Schema::string().trim().min_len(2).max_len(255)),
        ("default_endpoint", Schema::string().trim().url()),
    ])
});

static CREATE_ENDPOINT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("url", Schema::string().trim().url()),
        (
            "rules",
            Schema::array(RULE_CONDITION.clone()).default(Value::Array(Vec::new())),
        ),
    ])
});

static SUBSCRIPTION_STATUS: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("subscribed", Schema::boolean().coerce()),
        ("plan", optional_text()),
        ("ends_at", timestamp()),
    ])
});

/// New-redirect form state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRedirectInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_endpoint: Option<String>,
}

/// New-endpoint form state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEndpointInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleCondition>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Redirects<'a> {
    client: &'a ApiClient,
}

impl<'a> Redirects<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page (1-based) of the team's redirects.
    pub async fn list(&self, page: u32) -> ApiResult<Paginated<Redirect>> {
        self.client
            .dispatcher()
            .call(
                ApiCall::get("/api/v1/redirects")
                    .options(RequestOptions::new().query("page", page.max(1)))
                    .response_schema(&REDIRECT_PAGE),
            )
            .await
    }

    pub async fn get(&self, redirect_id: Id) -> ApiResult<Redirect> {
        self.client
            .dispatcher()
            .call(ApiCall::get(format!("/api/v1/redirects/{}", redirect_id)).response_schema(&REDIRECT))
            .await
    }

    pub async fn create(&self, input: &CreateRedirectInput) -> ApiResult<Redirect> {
        let redirect: Redirect = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/api/v1/redirects")
                    .data(input)
                    .request_schema(&CREATE_REDIRECT)
                    .response_schema(&REDIRECT),
            )
            .await?;
        self.client.events().emit::<CreatedRedirect>(&redirect);
        Ok(redirect)
    }

    pub async fn create_endpoint(
        &self,
        redirect_id: Id,
        input: &CreateEndpointInput,
    ) -> ApiResult<Endpoint> {
        let endpoint: Endpoint = self
            .client
            .dispatcher()
            .call(
                ApiCall::post(format!("/api/v1/redirects/{}/endpoints", redirect_id))
                    .data(input)
                    .request_schema(&CREATE_ENDPOINT)
                    .response_schema(&ENDPOINT),
            )
            .await?;
        self.client.events().emit::<CreatedEndpoint>(&endpoint);
        Ok(endpoint)
    }

    /// Whether the current team may create redirects.
    pub async fn subscription_status(&self) -> ApiResult<SubscriptionStatus> {
        self.client
            .dispatcher()
            .call(ApiCall::get("/api/v1/redirects/subscription").response_schema(&SUBSCRIPTION_STATUS))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use linkhop_core::ErrorKind;
    use serde_json::json;

    use crate::repositories::testing::{client, count, record};

    fn redirect_json() -> Value {
        json!({
            "id": 12,
            "name": "Test",
            "default_endpoint": "https://x.com",
            "short_url": "https://lh.to/abc",
            "created_at": "2024-05-01T12:00:00.000000Z"
        })
    }

    #[tokio::test]
    async fn test_create_success_emits_once() {
        let (client, transport) = client();
        let seen = record::<CreatedRedirect>(&client);
        transport.push_ok(redirect_json());

        let redirect = client
            .redirects()
            .create(&CreateRedirectInput {
                name: Some("Test".into()),
                default_endpoint: Some("https://x.com".into()),
            })
            .await
            .unwrap();

        assert_eq!(redirect.id, 12);
        assert!(redirect.endpoints.is_empty());
        assert_eq!(seen.lock().unwrap().as_slice(), &[redirect]);
    }

    #[tokio::test]
    async fn test_create_server_validation_emits_nothing() {
        let (client, transport) = client();
        let created = count::<CreatedRedirect>(&client);
        transport.push_status(422, Some(json!({"errors": {"name": ["too short"]}})));

        let err = client
            .redirects()
            .create(&CreateRedirectInput {
                name: Some("Test".into()),
                default_endpoint: Some("https://x.com".into()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(
            err.details,
            Some(linkhop_core::FieldErrors::from([(
                "name".to_string(),
                vec!["too short".to_string()]
            )]))
        );
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_client_validation() {
        let (client, transport) = client();
        let err = client
            .redirects()
            .create(&CreateRedirectInput {
                name: Some("T".into()),
                default_endpoint: Some("x.com".into()),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.field("name"),
            Some(&["String must contain at least 2 character(s)".to_string()][..])
        );
        assert_eq!(err.field("default_endpoint"), Some(&["Invalid url".to_string()][..]));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_list_sends_page_and_parses_meta() {
        let (client, transport) = client();
        transport.push_ok(json!({
            "data": [redirect_json()],
            "meta": {"current_page": 2, "last_page": 4, "per_page": 15, "total": 50}
        }));

        let page = client.redirects().list(2).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.last_page, 4);
        assert_eq!(
            transport.last_call().unwrap().options.query,
            vec![("page".to_string(), "2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_endpoint_defaults_rules() {
        let (client, transport) = client();
        let created = count::<CreatedEndpoint>(&client);
        transport.push_ok(json!({"id": 1, "redirect_id": 12, "url": "https://nl.x.com"}));

        let endpoint = client
            .redirects()
            .create_endpoint(
                12,
                &CreateEndpointInput {
                    url: Some("https://nl.x.com".into()),
                    rules: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(endpoint.redirect_id, 12);
        let call = transport.last_call().unwrap();
        assert_eq!(call.url, "/api/v1/redirects/12/endpoints");
        assert_eq!(call.body, Some(json!({"url": "https://nl.x.com", "rules": []})));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_endpoint_reports_nested_rule_path() {
        let (client, _transport) = client();
        let err = client
            .redirects()
            .create_endpoint(
                12,
                &CreateEndpointInput {
                    url: Some("https://nl.x.com".into()),
                    rules: Some(vec![
                        RuleCondition::Country {
                            value: vec!["NL".into()],
                        },
                        RuleCondition::Referrer {
                            value: "  ".into(),
                        },
                    ]),
                },
            )
            .await
            .unwrap_err();

        assert!(err.field("rules.1.value").is_some());
    }

    #[tokio::test]
    async fn test_subscription_status() {
        let (client, transport) = client();
        transport.push_ok(json!({"subscribed": 1, "plan": "pro", "ends_at": null}));

        let status = client.redirects().subscription_status().await.unwrap();
        assert!(status.subscribed);
        assert_eq!(status.plan.as_deref(), Some("pro"));
    }
}
