//! Third-party analytics integrations.

use once_cell::sync::Lazy;
use serde::Serialize;

use linkhop_core::events::{CreatedIntegration, DeletedIntegration};
use linkhop_core::{AnalyticsIntegration, ApiResult, Id, IntegrationProvider, Schema};

use super::{id, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

const PROVIDERS: [&str; 3] = ["google_analytics", "plausible", "matomo"];
const INTEGRATIONS_URL: &str = "/api/v1/analytics/integrations";

static INTEGRATION: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("provider", Schema::enumeration(PROVIDERS)),
        ("measurement_id", Schema::string()),
        ("active", Schema::boolean().coerce().optional()),
        ("created_at", timestamp()),
    ])
});

static INTEGRATIONS: Lazy<Schema> = Lazy::new(|| Schema::array(INTEGRATION.clone()));

static CREATE_INTEGRATION: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("provider", Schema::enumeration(PROVIDERS)),
        ("measurement_id", Schema::string().trim().non_empty().max_len(255)),
    ])
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateIntegrationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<IntegrationProvider>,
    /// Property / site id at the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Integrations<'a> {
    client: &'a ApiClient,
}

impl<'a> Integrations<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<AnalyticsIntegration>> {
        self.client
            .dispatcher()
            .call(ApiCall::get(INTEGRATIONS_URL).response_schema(&INTEGRATIONS))
            .await
    }

    pub async fn create(&self, input: &CreateIntegrationInput) -> ApiResult<AnalyticsIntegration> {
        let integration: AnalyticsIntegration = self
            .client
            .dispatcher()
            .call(
                ApiCall::post(INTEGRATIONS_URL)
                    .data(input)
                    .request_schema(&CREATE_INTEGRATION)
                    .response_schema(&INTEGRATION),
            )
            .await?;
        self.client.events().emit::<CreatedIntegration>(&integration);
        Ok(integration)
    }

    pub async fn delete(&self, integration_id: Id) -> ApiResult<()> {
        self.client
            .dispatcher()
            .call_raw(ApiCall::delete(format!("{}/{}", INTEGRATIONS_URL, integration_id)))
            .await?;
        self.client.events().emit::<DeletedIntegration>(&integration_id);
        Ok(())
    }
}
