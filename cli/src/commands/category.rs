//! Category command - browse marker categories

use anyhow::Context;
use cartes_core::CartesClient;
use serde_json::Value;

use crate::cli::CategoryAction;

/// Handle category subcommands
pub fn category(client: &CartesClient, action: CategoryAction) -> anyhow::Result<Value> {
    match action {
        CategoryAction::List => client.category_list(None).context("Error listing categories"),
        CategoryAction::Search { query } => client
            .category_search(&query, None)
            .context("Error searching categories"),
        CategoryAction::Related { category_id } => client
            .category_related(category_id, None)
            .with_context(|| format!("Error getting related categories for {category_id}")),
    }
}
