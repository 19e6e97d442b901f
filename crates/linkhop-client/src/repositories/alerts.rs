//! Traffic alerts.

use once_cell::sync::Lazy;
use serde::Serialize;

use linkhop_core::events::{CreatedAlert, DeletedAlert};
use linkhop_core::{Alert, AlertChannel, ApiResult, Id, Schema};

use super::{id, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

const CHANNELS: [&str; 2] = ["email", "slack"];

static ALERT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("redirect_id", id().nullable().optional()),
        ("threshold", Schema::integer().coerce().min(0.0)),
        ("channel", Schema::enumeration(CHANNELS)),
        ("created_at", timestamp()),
    ])
});

static CREATE_ALERT: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("redirect_id", id().nullable().optional()),
        ("threshold", Schema::integer().coerce().min(1.0)),
        ("channel", Schema::enumeration(CHANNELS)),
    ])
});

/// Alert form state. Without a redirect the alert covers the whole team.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateAlertInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_id: Option<Id>,
    /// Visits per hour that trigger the alert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<AlertChannel>,
}

#[derive(Debug, Clone, Copy)]
pub struct Alerts<'a> {
    client: &'a ApiClient,
}

impl<'a> Alerts<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, input: &CreateAlertInput) -> ApiResult<Alert> {
        let alert: Alert = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/api/v1/alerts")
                    .data(input)
                    .request_schema(&CREATE_ALERT)
                    .response_schema(&ALERT),
            )
            .await?;
        self.client.events().emit::<CreatedAlert>(&alert);
        Ok(alert)
    }

    pub async fn delete(&self, alert_id: Id) -> ApiResult<()> {
        self.client
            .dispatcher()
            .call_raw(ApiCall::delete(format!("/api/v1/alerts/{}", alert_id)))
            .await?;
        self.client.events().emit::<DeletedAlert>(&alert_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::repositories::testing::{client, record};

    #[tokio::test]
    async fn test_create_team_wide_alert() {
        let (client, transport) = client();
        let seen = record::<CreatedAlert>(&client);
        transport.push_ok(json!({"id": 5, "redirect_id": null, "threshold": "100", "channel": "slack"}));

        let alert = client
            .alerts()
            .create(&CreateAlertInput {
                redirect_id: None,
                threshold: Some(100),
                channel: Some(AlertChannel::Slack),
            })
            .await
            .unwrap();

        assert_eq!(alert.threshold, 100);
        assert_eq!(alert.redirect_id, None);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(
            transport.last_call().unwrap().body,
            Some(json!({"threshold": 100, "channel": "slack"}))
        );
    }

    #[tokio::test]
    async fn test_zero_threshold_is_rejected() {
        let (client, _transport) = client();
        let err = client
            .alerts()
            .create(&CreateAlertInput {
                threshold: Some(0),
                channel: Some(AlertChannel::Email),
                ..CreateAlertInput::default()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.field("threshold"),
            Some(&["Number must be greater than or equal to 1".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_delete_emits_id() {
        let (client, transport) = client();
        let seen = record::<DeletedAlert>(&client);
        transport.push_ok(serde_json::Value::Null);

        client.alerts().delete(5).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }
}
