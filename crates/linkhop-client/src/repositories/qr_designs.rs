//! Saved QR-code styles.

use once_cell::sync::Lazy;
use serde::Serialize;

use linkhop_core::events::CreatedQrDesign;
use linkhop_core::{ApiResult, QrDesign, Schema};

use super::{id, optional_text, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

const DOT_STYLES: [&str; 4] = ["square", "dots", "rounded", "classy"];

static QR_DESIGN: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("name", Schema::string()),
        ("foreground", Schema::string()),
        ("background", Schema::string()),
        ("dot_style", optional_text()),
        ("logo_url", optional_text()),
        ("created_at", timestamp()),
    ])
});

static CREATE_QR_DESIGN: Lazy<Schema> = Lazy::new(|| {
    let color = || Schema::string().trim().min_len(4).max_len(9);
    Schema::object([
        ("name", Schema::string().trim().non_empty().max_len(255)),
        ("foreground", color()),
        ("background", color()),
        ("dot_style", Schema::enumeration(DOT_STYLES).optional()),
        ("logo_url", Schema::string().url().nullable().optional()),
    ])
});

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateQrDesignInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hex color, e.g. `#000000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct QrDesigns<'a> {
    client: &'a ApiClient,
}

impl<'a> QrDesigns<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, input: &CreateQrDesignInput) -> ApiResult<QrDesign> {
        let design: QrDesign = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/api/v1/qr-designs")
                    .data(input)
                    .request_schema(&CREATE_QR_DESIGN)
                    .response_schema(&QR_DESIGN),
            )
            .await?;
        self.client.events().emit::<CreatedQrDesign>(&design);
        Ok(design)
    }
}
