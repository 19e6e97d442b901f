//! Outgoing webhooks attached to redirects.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use linkhop_core::events::{CreatedWebhook, DeletedWebhook};
use linkhop_core::{ApiResult, Id, Schema, Webhook, WebhookEventType};

use super::{id, optional_text, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

static WEBHOOK: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("redirect_id", id()),
        ("url", Schema::string()),
        (
            "events",
            Schema::array(Schema::string()).default(Value::Array(Vec::new())),
        ),
        ("created_at", timestamp()),
    ])
});

static EVENT_TYPES: Lazy<Schema> = Lazy::new(|| {
    Schema::array(Schema::object([
        ("key", Schema::string()),
        ("description", optional_text()),
    ]))
});

static CREATE_WEBHOOK: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("url", Schema::string().trim().url()),
        ("events", Schema::array(Schema::string().non_empty()).non_empty()),
    ])
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateWebhookInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Keys from [`Webhooks::events`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Webhooks<'a> {
    client: &'a ApiClient,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Event types a webhook can subscribe to.
    pub async fn events(&self) -> ApiResult<Vec<WebhookEventType>> {
        self.client
            .dispatcher()
            .call(ApiCall::get("/api/v1/webhooks/events").response_schema(&EVENT_TYPES))
            .await
    }

    pub async fn create(&self, redirect_id: Id, input: &CreateWebhookInput) -> ApiResult<Webhook> {
        let webhook: Webhook = self
            .client
            .dispatcher()
            .call(
                ApiCall::post(format!("/api/v1/redirects/{}/webhooks", redirect_id))
                    .data(input)
                    .request_schema(&CREATE_WEBHOOK)
                    .response_schema(&WEBHOOK),
            )
            .await?;
        self.client.events().emit::<CreatedWebhook>(&webhook);
        Ok(webhook)
    }

    pub async fn delete(&self, webhook_id: Id) -> ApiResult<()> {
        self.client
            .dispatcher()
            .call_raw(ApiCall::delete(format!("/api/v1/webhooks/{}", webhook_id)))
            .await?;
        self.client.events().emit::<DeletedWebhook>(&webhook_id);
        Ok(())
    }
}
