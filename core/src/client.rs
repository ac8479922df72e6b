//! Stateless client for the cartes.io API.
//!
//! # Design
//! `CartesClient` holds only its configuration and a `Transport`. Every
//! operation maps its arguments onto a `Params` bag, prepares exactly one
//! `HttpRequest` and hands it to `transport::execute`. Nothing is cached or
//! retried, and nothing survives between calls.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, JsonResponse};
use crate::params::Params;
use crate::transport::{execute, Transport, UreqTransport};
use crate::types::{MapListParams, MapPayload, MarkerLocationPayload, MarkerPayload};

/// Bearer header for an API key. A missing or empty key yields no headers.
pub fn auth_headers(api_key: Option<&str>) -> Headers {
    match api_key {
        Some(key) if !key.is_empty() => {
            vec![("Authorization".to_string(), format!("Bearer {key}"))]
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct CartesClient<T = UreqTransport> {
    base_url: String,
    timeout: Duration,
    transport: T,
}

impl CartesClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(
            ClientConfig {
                base_url: base_url.to_string(),
                ..ClientConfig::default()
            },
            UreqTransport,
        )
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport)
    }
}

impl Default for CartesClient<UreqTransport> {
    fn default() -> Self {
        Self::from_config(ClientConfig::default())
    }
}

impl<T: Transport> CartesClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn call(
        &self,
        method: HttpMethod,
        path: &str,
        api_key: Option<&str>,
        params: Option<Params>,
    ) -> Result<JsonResponse, ApiError> {
        let headers = auth_headers(api_key);
        let request = HttpRequest::prepare(method, self.url(path), Some(&headers), params.as_ref())?;
        execute(&self.transport, &request, self.timeout)
    }

    // -----------------------------------------------------------------------
    // Maps
    // -----------------------------------------------------------------------

    /// `GET /maps`: public maps, filtered by `filters`.
    pub fn map_list(&self, filters: &MapListParams, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, "/maps", api_key, Some(filters.to_params()))
    }

    /// `GET /maps/search?q=`
    pub fn map_search(&self, query: &str, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set("q", query);
        self.call(HttpMethod::Get, "/maps/search", api_key, Some(params))
    }

    /// `GET /maps/{id}`
    pub fn map_get(&self, map_id: &str, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, &format!("/maps/{map_id}"), api_key, None)
    }

    /// `POST /maps`. The response carries the new map's edit token.
    pub fn map_create(&self, payload: &MapPayload, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        let params = payload.apply(Params::new());
        self.call(HttpMethod::Post, "/maps", api_key, Some(params))
    }

    /// `PUT /maps/{id}`. Anonymous maps need `map_token`; owned maps can use
    /// the API key instead.
    pub fn map_edit(
        &self,
        map_id: &str,
        payload: &MapPayload,
        map_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = payload.apply(Params::new().set_opt("map_token", map_token));
        self.call(HttpMethod::Put, &format!("/maps/{map_id}"), api_key, Some(params))
    }

    /// `DELETE /maps/{id}`, authorized by `map_token` or the owner's API key.
    pub fn map_delete(
        &self,
        map_id: &str,
        map_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set_opt("map_token", map_token);
        self.call(HttpMethod::Delete, &format!("/maps/{map_id}"), api_key, Some(params))
    }

    /// `GET /maps/{id}/images/static`. The service answers with a bare URL,
    /// which comes back wrapped as `{"response": ...}`.
    pub fn map_static_image(
        &self,
        map_id: &str,
        zoom: Option<u8>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set_opt("zoom", zoom);
        self.call(
            HttpMethod::Get,
            &format!("/maps/{map_id}/images/static"),
            api_key,
            Some(params),
        )
    }

    /// `POST /maps/{id}/claim`: attach an anonymous map to the account behind
    /// `api_key`.
    pub fn map_claim(&self, map_id: &str, map_token: &str, api_key: &str) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set("map_token", map_token);
        self.call(
            HttpMethod::Post,
            &format!("/maps/{map_id}/claim"),
            Some(api_key),
            Some(params),
        )
    }

    /// `DELETE /maps/{id}/claim`
    pub fn map_unclaim(&self, map_id: &str, api_key: &str) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Delete, &format!("/maps/{map_id}/claim"), Some(api_key), None)
    }

    /// `GET /maps/{id}/users`
    pub fn map_user_list(&self, map_id: &str, api_key: &str) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, &format!("/maps/{map_id}/users"), Some(api_key), None)
    }

    /// `POST /maps/{id}/users`: share the map with `username`.
    pub fn map_user_add(
        &self,
        map_id: &str,
        username: &str,
        can_create_markers: Option<bool>,
        api_key: &str,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new()
            .set("username", username)
            .set_opt("can_create_markers", can_create_markers);
        self.call(
            HttpMethod::Post,
            &format!("/maps/{map_id}/users"),
            Some(api_key),
            Some(params),
        )
    }

    /// `DELETE /maps/{id}/users/{username}`
    pub fn map_user_delete(&self, map_id: &str, username: &str, api_key: &str) -> Result<JsonResponse, ApiError> {
        self.call(
            HttpMethod::Delete,
            &format!("/maps/{map_id}/users/{username}"),
            Some(api_key),
            None,
        )
    }

    // -----------------------------------------------------------------------
    // Markers
    // -----------------------------------------------------------------------

    /// `GET /maps/{id}/markers`. `response_format` selects e.g. `geojson`.
    pub fn marker_list(
        &self,
        map_id: &str,
        show_expired: Option<bool>,
        response_format: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new()
            .set_opt("show_expired", show_expired)
            .set_opt("format", response_format);
        self.call(HttpMethod::Get, &format!("/maps/{map_id}/markers"), api_key, Some(params))
    }

    /// `POST /maps/{id}/markers`. Category id and name are both passed
    /// through when set; the service decides which wins.
    pub fn marker_create(
        &self,
        map_id: &str,
        payload: &MarkerPayload,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = payload.apply(Params::new());
        self.call(HttpMethod::Post, &format!("/maps/{map_id}/markers"), api_key, Some(params))
    }

    /// `PUT /maps/{id}/markers/{markerId}`
    pub fn marker_edit(
        &self,
        map_id: &str,
        marker_id: &str,
        marker_token: Option<&str>,
        description: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new()
            .set_opt("token", marker_token)
            .set_opt("description", description);
        self.call(
            HttpMethod::Put,
            &format!("/maps/{map_id}/markers/{marker_id}"),
            api_key,
            Some(params),
        )
    }

    /// `DELETE /maps/{id}/markers/{markerId}`
    pub fn marker_delete(
        &self,
        map_id: &str,
        marker_id: &str,
        marker_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set_opt("token", marker_token);
        self.call(
            HttpMethod::Delete,
            &format!("/maps/{map_id}/markers/{marker_id}"),
            api_key,
            Some(params),
        )
    }

    /// `PUT /maps/{id}/markers/{markerId}`: flag or unflag a marker as spam.
    /// `is_spam = false` is sent explicitly.
    pub fn marker_spam(
        &self,
        map_id: &str,
        marker_id: &str,
        is_spam: bool,
        map_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new()
            .set_opt("map_token", map_token)
            .set("is_spam", is_spam);
        self.call(
            HttpMethod::Put,
            &format!("/maps/{map_id}/markers/{marker_id}"),
            api_key,
            Some(params),
        )
    }

    /// `GET /maps/{id}/markers/{markerId}/locations`
    pub fn marker_location_list(
        &self,
        map_id: &str,
        marker_id: &str,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        self.call(
            HttpMethod::Get,
            &format!("/maps/{map_id}/markers/{marker_id}/locations"),
            api_key,
            None,
        )
    }

    /// `POST /maps/{id}/markers/{markerId}/locations`: append a position to the marker's track.
    pub fn marker_location_create(
        &self,
        map_id: &str,
        marker_id: &str,
        payload: &MarkerLocationPayload,
        marker_token: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = payload.apply(Params::new().set_opt("token", marker_token));
        self.call(
            HttpMethod::Post,
            &format!("/maps/{map_id}/markers/{marker_id}/locations"),
            api_key,
            Some(params),
        )
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// `GET /categories`
    pub fn category_list(&self, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, "/categories", api_key, None)
    }

    /// `GET /categories/search?q=`
    pub fn category_search(&self, query: &str, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set("q", query);
        self.call(HttpMethod::Get, "/categories/search", api_key, Some(params))
    }

    /// `GET /categories/{id}/related`
    pub fn category_related(&self, category_id: i64, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        self.call(
            HttpMethod::Get,
            &format!("/categories/{category_id}/related"),
            api_key,
            None,
        )
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// `GET /users`: public users.
    pub fn user_list(&self, api_key: Option<&str>) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, "/users", api_key, None)
    }

    /// `GET /users/{username}`, expanding `with_relations` (e.g. `maps`).
    pub fn user_get(
        &self,
        username: &str,
        with_relations: &[String],
        api_key: Option<&str>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new().set_list("with[]", with_relations);
        self.call(HttpMethod::Get, &format!("/users/{username}"), api_key, Some(params))
    }

    // -----------------------------------------------------------------------
    // Authenticated user
    // -----------------------------------------------------------------------

    /// `GET /user`
    pub fn me_get(&self, api_key: &str) -> Result<JsonResponse, ApiError> {
        self.call(HttpMethod::Get, "/user", Some(api_key), None)
    }

    /// `PUT /user`. Only the fields that are set are changed.
    pub fn me_update(
        &self,
        api_key: &str,
        username: Option<&str>,
        is_public: Option<bool>,
    ) -> Result<JsonResponse, ApiError> {
        let params = Params::new()
            .set_opt("username", username)
            .set_opt("is_public", is_public);
        self.call(HttpMethod::Put, "/user", Some(api_key), Some(params))
    }
}
