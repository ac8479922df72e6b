//! User command - public profiles

use anyhow::Context;
use cartes_core::CartesClient;
use serde_json::Value;

use crate::cli::UserAction;

/// Handle user subcommands
pub fn user(client: &CartesClient, action: UserAction) -> anyhow::Result<Value> {
    match action {
        UserAction::List => client.user_list(None).context("Error listing users"),
        UserAction::Get {
            username,
            with_relations,
        } => client
            .user_get(&username, &with_relations, None)
            .with_context(|| format!("Error getting user \"{username}\"")),
    }
}
