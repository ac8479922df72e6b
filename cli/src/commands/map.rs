//! Map command - create, edit, share and inspect maps

use anyhow::Context;
use cartes_core::{CartesClient, MapListParams, MapPayload};
use serde_json::Value;

use super::with_opt;
use crate::cli::{MapAction, MapFields};

/// Handle map subcommands
pub fn map(client: &CartesClient, action: MapAction) -> anyhow::Result<Value> {
    match action {
        MapAction::List {
            order_by,
            query,
            response_format,
            with_mine,
            ids,
            category_ids,
            with_relations,
            api_key,
        } => {
            let filters = MapListParams {
                ids,
                category_ids,
                with_mine,
                with_relations,
                order_by,
                query,
                response_format,
            };
            client
                .map_list(&filters, api_key.as_deref())
                .context("Error listing maps")
        }
        MapAction::Search { query } => client
            .map_search(&query, None)
            .context("Error searching maps"),
        MapAction::Get { map_id } => client
            .map_get(&map_id, None)
            .with_context(|| format!("Error getting map \"{map_id}\"")),
        MapAction::StaticImage { map_id, zoom } => client
            .map_static_image(&map_id, zoom, None)
            .with_context(|| format!("Error getting static image for map \"{map_id}\"")),
        MapAction::Create { fields, api_key } => {
            let title = fields.title.clone().unwrap_or_default();
            client
                .map_create(&payload(fields), api_key.as_deref())
                .with_context(|| format!("Error creating map \"{title}\""))
        }
        MapAction::Edit {
            map_id,
            map_token,
            fields,
            api_key,
        } => client
            .map_edit(&map_id, &payload(fields), map_token.as_deref(), api_key.as_deref())
            .with_context(|| format!("Error editing map \"{map_id}\"")),
        MapAction::Delete {
            map_id,
            map_token,
            api_key,
        } => client
            .map_delete(&map_id, Some(&map_token), api_key.as_deref())
            .with_context(|| format!("Error deleting map \"{map_id}\"")),
        MapAction::Claim {
            map_id,
            map_token,
            api_key,
        } => client
            .map_claim(&map_id, &map_token, &api_key)
            .with_context(|| format!("Error claiming map \"{map_id}\"")),
        MapAction::Unclaim { map_id, api_key } => client
            .map_unclaim(&map_id, &api_key)
            .with_context(|| format!("Error un-claiming map \"{map_id}\"")),
        MapAction::UserList { map_id, api_key } => client
            .map_user_list(&map_id, &api_key)
            .with_context(|| format!("Error listing users for map \"{map_id}\"")),
        MapAction::UserAdd {
            map_id,
            username,
            can_create_markers,
            api_key,
        } => client
            .map_user_add(&map_id, &username, can_create_markers, &api_key)
            .with_context(|| format!("Error adding user \"{username}\" to map \"{map_id}\"")),
        MapAction::UserDelete {
            map_id,
            username,
            api_key,
        } => client
            .map_user_delete(&map_id, &username, &api_key)
            .with_context(|| format!("Error removing user \"{username}\" from map \"{map_id}\"")),
    }
}

fn payload(fields: MapFields) -> MapPayload {
    let payload = with_opt(MapPayload::new(), fields.title, MapPayload::title);
    let payload = with_opt(payload, fields.slug, MapPayload::slug);
    let payload = with_opt(payload, fields.description, MapPayload::description);
    let payload = with_opt(payload, fields.privacy, MapPayload::privacy);
    with_opt(payload, fields.users_can_create_markers, MapPayload::users_can_create_markers)
}
