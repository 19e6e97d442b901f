//! Feature repositories.
//!
//! Each operation is a fixed URL, method, request schema and response schema
//! handed to the [`Dispatcher`](crate::dispatcher::Dispatcher), followed by
//! its domain event once the call has succeeded. Inputs are all-`Option`
//! structs mirroring form state; the request schema decides what is required.

use linkhop_core::Schema;

pub mod alerts;
pub mod auth;
pub mod integrations;
pub mod products;
pub mod qr_designs;
pub mod redirects;
pub mod rules;
pub mod teams;
pub mod webhooks;

pub use alerts::{Alerts, CreateAlertInput};
pub use auth::{Auth, ConfirmOtpInput, LoginInput, RegisterInput};
pub use integrations::{CreateIntegrationInput, Integrations};
pub use products::{ProductStream, Products};
pub use qr_designs::{CreateQrDesignInput, QrDesigns};
pub use redirects::{CreateEndpointInput, CreateRedirectInput, Redirects};
pub use rules::{RuleTester, Rules, TestRuleInput};
pub use teams::{CreateTeamInput, Teams};
pub use webhooks::{CreateWebhookInput, Webhooks};

/// Server identifier.
fn id() -> Schema {
    Schema::integer().min(0.0)
}

/// Timestamp that may be absent or null.
fn timestamp() -> Schema {
    Schema::date().nullable().optional()
}

/// Text that may be absent or null.
fn optional_text() -> Schema {
    Schema::string().nullable().optional()
}

/// Laravel-style paginated envelope around `item`.
fn paginated(item: Schema) -> Schema {
    Schema::object([
        ("data", Schema::array(item)),
        (
            "meta",
            Schema::object([
                ("current_page", Schema::integer().min(1.0)),
                ("last_page", Schema::integer().min(0.0)),
                ("per_page", Schema::integer().min(0.0)),
                ("total", Schema::integer().min(0.0)),
            ]),
        ),
    ])
}
