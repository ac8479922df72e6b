//! Marker command - place markers and track their locations

use anyhow::Context;
use cartes_core::{ApiError, CartesClient, MarkerLocationPayload, MarkerPayload, MarkerPayloadBuilder};
use serde_json::Value;

use super::with_opt;
use crate::cli::MarkerAction;

/// Handle marker subcommands
pub fn marker(client: &CartesClient, action: MarkerAction) -> anyhow::Result<Value> {
    match action {
        MarkerAction::List {
            map_id,
            show_expired,
            response_format,
        } => client
            .marker_list(&map_id, show_expired, response_format.as_deref(), None)
            .context("Error listing markers"),
        MarkerAction::Create {
            map_id,
            map_token,
            lat,
            lng,
            category,
            category_name,
            description,
            api_key,
        } => {
            let builder = with_opt(
                MarkerPayload::builder(map_token, lat, lng),
                category,
                MarkerPayloadBuilder::category,
            );
            let builder = with_opt(builder, category_name, |b, name| b.category_name(name));
            let builder = with_opt(builder, description, |b, text| b.description(text));
            builder
                .build()
                .map_err(ApiError::from)
                .and_then(|payload| client.marker_create(&map_id, &payload, api_key.as_deref()))
                .with_context(|| format!("Error creating marker at ({lat}, {lng})"))
        }
        MarkerAction::Edit {
            map_id,
            marker_id,
            marker_token,
            description,
            api_key,
        } => client
            .marker_edit(
                &map_id,
                &marker_id,
                Some(&marker_token),
                description.as_deref(),
                api_key.as_deref(),
            )
            .with_context(|| format!("Error editing marker {marker_id}")),
        MarkerAction::Delete {
            map_id,
            marker_id,
            marker_token,
            api_key,
        } => client
            .marker_delete(&map_id, &marker_id, Some(&marker_token), api_key.as_deref())
            .with_context(|| format!("Error deleting marker {marker_id}")),
        MarkerAction::Spam {
            map_id,
            marker_id,
            is_spam,
            map_token,
            api_key,
        } => client
            .marker_spam(&map_id, &marker_id, is_spam, map_token.as_deref(), api_key.as_deref())
            .with_context(|| format!("Error marking marker {marker_id} as spam")),
        MarkerAction::LocationList { map_id, marker_id } => client
            .marker_location_list(&map_id, &marker_id, None)
            .with_context(|| format!("Error listing locations for marker {marker_id}")),
        MarkerAction::LocationCreate {
            map_id,
            marker_id,
            lat,
            lng,
            marker_token,
            zoom,
            elevation,
            heading,
            pitch,
            roll,
            speed,
            api_key,
        } => {
            let builder = MarkerLocationPayload::builder(lat, lng);
            let builder = with_opt(builder, zoom, |b, v| b.zoom(v));
            let builder = with_opt(builder, elevation, |b, v| b.elevation(v));
            let builder = with_opt(builder, heading, |b, v| b.heading(v));
            let builder = with_opt(builder, pitch, |b, v| b.pitch(v));
            let builder = with_opt(builder, roll, |b, v| b.roll(v));
            let builder = with_opt(builder, speed, |b, v| b.speed(v));
            builder
                .build()
                .map_err(ApiError::from)
                .and_then(|payload| {
                    client.marker_location_create(
                        &map_id,
                        &marker_id,
                        &payload,
                        marker_token.as_deref(),
                        api_key.as_deref(),
                    )
                })
                .with_context(|| format!("Error creating location for marker {marker_id}"))
        }
    }
}
