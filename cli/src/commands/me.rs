//! Me command - the profile behind the API key

use anyhow::Context;
use cartes_core::CartesClient;
use serde_json::Value;

use crate::cli::MeAction;

/// Handle me subcommands
pub fn me(client: &CartesClient, action: MeAction) -> anyhow::Result<Value> {
    match action {
        MeAction::Get { api_key } => client.me_get(&api_key).context("Error getting current user"),
        MeAction::Update {
            api_key,
            username,
            is_public,
        } => client
            .me_update(&api_key, username.as_deref(), is_public)
            .context("Error updating current user"),
    }
}
