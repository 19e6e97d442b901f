//! Teams and the active-team switch.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;

use linkhop_core::events::{ChangedTeam, CreatedTeam};
use linkhop_core::{ApiResult, Id, Schema, Team};

use super::{id, timestamp};
use crate::client::ApiClient;
use crate::dispatcher::ApiCall;

pub(crate) static TEAM: Lazy<Schema> = Lazy::new(|| {
    Schema::object([
        ("id", id()),
        ("name", Schema::string()),
        ("personal_team", Schema::boolean().coerce().optional()),
        ("created_at", timestamp()),
    ])
});

static TEAMS: Lazy<Schema> = Lazy::new(|| Schema::array(TEAM.clone()));

static CREATE_TEAM: Lazy<Schema> =
    Lazy::new(|| Schema::object([("name", Schema::string().trim().min_len(2).max_len(255))]));

static SWITCH_TEAM: Lazy<Schema> = Lazy::new(|| Schema::object([("team_id", id())]));

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateTeamInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Teams<'a> {
    client: &'a ApiClient,
}

impl<'a> Teams<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Team>> {
        self.client
            .dispatcher()
            .call(ApiCall::get("/api/v1/teams").response_schema(&TEAMS))
            .await
    }

    /// Make `team_id` the active team for the session.
    pub async fn switch(&self, team_id: Id) -> ApiResult<()> {
        self.client
            .dispatcher()
            .call_raw(
                ApiCall::put("/current-team")
                    .data(&json!({ "team_id": team_id }))
                    .request_schema(&SWITCH_TEAM),
            )
            .await?;
        self.client.events().emit::<ChangedTeam>(&team_id);
        Ok(())
    }

    pub async fn create(&self, input: &CreateTeamInput) -> ApiResult<Team> {
        let team: Team = self
            .client
            .dispatcher()
            .call(
                ApiCall::post("/teams")
                    .data(input)
                    .request_schema(&CREATE_TEAM)
                    .response_schema(&TEAM),
            )
            .await?;
        self.client.events().emit::<CreatedTeam>(&team);
        Ok(team)
    }
}
