//! Session and account security.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use linkhop_core::events::{ConfirmedOtp, EnabledOtp, LoggedIn, LoggedOut, Registered};
use linkhop_core::{ApiResult, OtpConfirmation, OtpSetup, Schema, User};

use super::{id, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

pub(crate) static USER: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("name", Schema::string()),
        ("email", Schema::string()),
        ("current_team_id", id().nullable().optional()),
        ("two_factor_enabled", Schema::boolean().coerce().optional()),
        ("email_verified_at", timestamp()),
        ("created_at", timestamp()),
    ])
});

static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("email", Schema::string().trim().email()),
        ("password", Schema::string().non_empty()),
        ("remember", Schema::boolean().coerce().optional()),
    ])
});

static REGISTER: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("name", Schema::string().trim().min_len(2).max_len(255)),
        ("email", Schema::string().trim().email()),
        ("password", Schema::string().min_len(8)),
        ("password_confirmation", Schema::string().min_len(8)),
    ])
});

static OTP_SETUP: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("secret", Schema::string().non_empty()),
        ("qr_code_url", Schema::string()),
    ])
});

static CONFIRM_OTP: Lazy<Schema> =
    Lazy::new(|| Schema::object([("code", Schema::string().trim().min_len(6).max_len(6))]));

static OTP_CONFIRMATION: Lazy<Schema> = Lazy::new(|| {
    Schema::object([(
        "recovery_codes",
        Schema::array(Schema::string()).default(Value::Array(Vec::new())),
    )])
});

/// Sign-in form state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

/// Code from the authenticator app.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfirmOtpInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Authentication operations.
#[derive(Debug, Clone, Copy)]
pub struct Auth<'a> {
    client: &'a ApiClient,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, input: &LoginInput) -> ApiResult<User> {
        let user: User = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/login")
                    .data(input)
                    .with_csrf()
                    .request_schema(&LOGIN)
                    .response_schema(&USER),
            )
            .await?;
        info!(subsystem = "auth", op = "login", user_id = user.id, "Signed in");
        self.client.events().emit::<LoggedIn>(&user);
        Ok(user)
    }

    pub async fn register(&self, input: &RegisterInput) -> ApiResult<User> {
        let user: User = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/register")
                    .data(input)
                    .with_csrf()
                    .request_schema(&REGISTER)
                    .response_schema(&USER),
            )
            .await?;
        info!(subsystem = "auth", op = "register", user_id = user.id, "Registered");
        self.client.events().emit::<Registered>(&user);
        Ok(user)
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.client
            .dispatcher()
            .call_raw(ApiCall::post("/logout"))
            .await?;
        info!(subsystem = "auth", op = "logout", "Signed out");
        self.client.events().emit::<LoggedOut>(&());
        Ok(())
    }

    /// Start one-time-password setup; returns the shared secret.
    pub async fn enable_otp(&self) -> ApiResult<OtpSetup> {
        let setup: OtpSetup = self
            .client
            .dispatcher()
            .call(ApiCall::post("/user/otp").response_schema(&OTP_SETUP))
            .await?;
        self.client.events().emit::<EnabledOtp>(&());
        Ok(setup)
    }

    pub async fn confirm_otp(&self, input: &ConfirmOtpInput) -> ApiResult<OtpConfirmation> {
        let confirmation: OtpConfirmation = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/user/otp/confirm")
                    .data(input)
                    .request_schema(&CONFIRM_OTP)
                    .response_schema(&OTP_CONFIRMATION),
            )
            .await?;
        self.client.events().emit::<ConfirmedOtp>(&());
        Ok(confirmation)
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.client
            .dispatcher()
            .call(ApiCall::get("/api/user").response_schema(&USER))
            .await
    }
}
