//! In-memory stand-in for the cartes.io HTTP API.
//!
//! Every route the client can hit is served from a shared store, with the
//! same auth rules as the real service: a bearer key for claim, map-user and
//! profile routes, and per-resource edit tokens for anonymous maps and
//! markers. Each incoming request is recorded before routing so tests can
//! inspect exactly what went over the wire.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The only API key the mock accepts.
pub const API_KEY: &str = "test-api-key";

/// Username that `API_KEY` authenticates as.
pub const API_USER: &str = "alice";

// ---------------------------------------------------------------------------
// Request log
// ---------------------------------------------------------------------------

/// One request as received by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Parsed JSON body, or the raw text as a JSON string if it was not JSON.
    /// `None` when the body was empty.
    pub body: Option<Value>,
}

/// Shared, append-only log of received requests.
#[derive(Clone, Debug, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    fn push(&self, request: RecordedRequest) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }

    pub fn entries(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<RecordedRequest> {
        self.entries().pop()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let body = (!bytes.is_empty()).then(|| {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    });
    log.push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header(header::AUTHORIZATION),
        content_type: header(header::CONTENT_TYPE),
        body,
    });
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct MapRecord {
    pub uuid: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub privacy: String,
    pub users_can_create_markers: String,
    pub user: Option<String>,
    #[serde(skip)]
    pub token: String,
    #[serde(skip)]
    pub members: Vec<MapMember>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MapMember {
    pub username: String,
    pub can_create_markers: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub zoom: Option<f64>,
    pub elevation: Option<f64>,
    pub heading: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Marker {
    pub id: u64,
    pub description: Option<String>,
    pub category: Category,
    pub location: Location,
    pub is_spam: bool,
    #[serde(skip)]
    pub token: String,
    #[serde(skip)]
    pub locations: Vec<Location>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub is_public: bool,
}

#[derive(Debug)]
pub struct Store {
    pub maps: HashMap<String, MapRecord>,
    pub markers: HashMap<String, Vec<Marker>>,
    pub categories: Vec<Category>,
    pub users: Vec<UserRecord>,
    /// Index into `users` of the account behind `API_KEY`.
    pub me: usize,
    next_marker_id: u64,
}

impl Default for Store {
    fn default() -> Self {
        let category = |id: i64, name: &str| Category {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
        };
        let user = |username: &str, is_public: bool| UserRecord {
            username: username.to_string(),
            is_public,
        };
        Self {
            maps: HashMap::new(),
            markers: HashMap::new(),
            categories: vec![category(1, "Sharks"), category(2, "Wildlife"), category(3, "Traffic")],
            users: vec![user(API_USER, true), user("bob", true), user("carol", false)],
            me: 0,
            next_marker_id: 1,
        }
    }
}

impl Store {
    fn category_by_name(&mut self, name: &str) -> Category {
        if let Some(existing) = self.categories.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            return existing.clone();
        }
        let id = self.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Category {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
        };
        self.categories.push(created.clone());
        created
    }

    fn me(&self) -> &UserRecord {
        &self.users[self.me]
    }
}

pub type Db = Arc<RwLock<Store>>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with_log(RequestLog::default())
}

pub fn app_with_log(log: RequestLog) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/maps", get(list_maps).post(create_map))
        .route("/api/maps/search", get(search_maps))
        .route("/api/maps/{id}", get(get_map).put(edit_map).delete(delete_map))
        .route("/api/maps/{id}/images/static", get(static_image))
        .route("/api/maps/{id}/claim", post(claim_map).delete(unclaim_map))
        .route("/api/maps/{id}/users", get(list_map_users).post(add_map_user))
        .route("/api/maps/{id}/users/{username}", delete(remove_map_user))
        .route("/api/maps/{id}/markers", get(list_markers).post(create_marker))
        .route("/api/maps/{id}/markers/{marker_id}", put(edit_marker).delete(delete_marker))
        .route(
            "/api/maps/{id}/markers/{marker_id}/locations",
            get(list_locations).post(create_location),
        )
        .route("/api/categories", get(list_categories))
        .route("/api/categories/search", get(search_categories))
        .route("/api/categories/{id}/related", get(related_categories))
        .route("/api/users", get(list_users))
        .route("/api/users/{username}", get(get_user))
        .route("/api/user", get(get_me).put(update_me))
        .fallback(|| async { ApiFailure(StatusCode::NOT_FOUND, "Not found.") })
        .with_state(db)
        .layer(middleware::from_fn_with_state(log, record))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// A server running on a background thread.
#[derive(Clone, Debug)]
pub struct MockServer {
    /// API root, e.g. `http://127.0.0.1:41234/api`.
    pub base_url: String,
    pub log: RequestLog,
}

/// Start the mock server on a random loopback port on its own thread with a
/// current-thread runtime, so blocking clients can call it from the test
/// thread.
///
/// The runtime and listener are set up before the thread starts, so setup
/// failures are returned here. An error from the running server is printed
/// to stderr.
pub fn spawn() -> std::io::Result<MockServer> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let listener = {
        let _guard = rt.enter();
        TcpListener::from_std(std_listener)?
    };

    let log = RequestLog::default();
    let router = app_with_log(log.clone());
    std::thread::spawn(move || {
        if let Err(err) = rt.block_on(async move { axum::serve(listener, router).await }) {
            eprintln!("mock server on {addr} stopped: {err}");
        }
    });

    Ok(MockServer {
        base_url: format!("http://{addr}/api"),
        log,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiFailure(StatusCode, &'static str);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type Reply = Result<Response, ApiFailure>;

fn reply(status: StatusCode, value: Value) -> Reply {
    Ok((status, Json(value)).into_response())
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticated(headers: &HeaderMap) -> bool {
    bearer(headers) == Some(API_KEY)
}

fn require_auth(headers: &HeaderMap) -> Result<(), ApiFailure> {
    if authenticated(headers) {
        Ok(())
    } else {
        Err(ApiFailure(StatusCode::UNAUTHORIZED, "Unauthenticated."))
    }
}

fn text<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

fn number(body: &Value, key: &str) -> Option<f64> {
    body.get(key).and_then(Value::as_f64)
}

fn map_not_found() -> ApiFailure {
    ApiFailure(StatusCode::NOT_FOUND, "Map not found.")
}

/// The caller may edit `map` with its edit token or as its owner.
fn may_edit_map(map: &MapRecord, store: &Store, token: Option<&str>, headers: &HeaderMap) -> bool {
    token == Some(map.token.as_str())
        || (authenticated(headers) && map.user.as_deref() == Some(store.me().username.as_str()))
}

fn map_with_token(map: &MapRecord) -> Value {
    let mut value = to_json(map);
    value["token"] = Value::String(map.token.clone());
    value
}

fn validate_choice(body: &Value, key: &str, allowed: &[&str]) -> Result<(), ApiFailure> {
    match text(body, key) {
        Some(v) if !allowed.contains(&v) => Err(ApiFailure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The given data was invalid.",
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

async fn list_maps(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let store = db.read().await;
    let with_mine = query.get("withMine").map(String::as_str) == Some("true") && authenticated(&headers);
    let needle = query.get("query").map(|q| q.to_lowercase());
    let maps: Vec<Value> = store
        .maps
        .values()
        .filter(|m| {
            m.privacy == "public"
                || (with_mine && m.user.as_deref() == Some(store.me().username.as_str()))
        })
        .filter(|m| match &needle {
            Some(n) => m.title.as_deref().unwrap_or("").to_lowercase().contains(n),
            None => true,
        })
        .map(to_json)
        .collect();
    reply(StatusCode::OK, Value::Array(maps))
}

async fn search_maps(State(db): State<Db>, Query(query): Query<HashMap<String, String>>) -> Reply {
    let Some(q) = query.get("q").map(|q| q.to_lowercase()) else {
        return Err(ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "The q field is required."));
    };
    let store = db.read().await;
    let maps: Vec<Value> = store
        .maps
        .values()
        .filter(|m| m.privacy == "public")
        .filter(|m| m.title.as_deref().unwrap_or("").to_lowercase().contains(&q))
        .map(to_json)
        .collect();
    reply(StatusCode::OK, Value::Array(maps))
}

async fn create_map(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    validate_choice(&body, "privacy", &["public", "unlisted", "private"])?;
    validate_choice(&body, "users_can_create_markers", &["yes", "no", "only_logged_in"])?;

    let mut store = db.write().await;
    let owner = authenticated(&headers).then(|| store.me().username.clone());
    let map = MapRecord {
        uuid: Uuid::new_v4().to_string(),
        title: text(&body, "title").map(str::to_string),
        slug: text(&body, "slug").map(str::to_string),
        description: text(&body, "description").map(str::to_string),
        privacy: text(&body, "privacy").unwrap_or("public").to_string(),
        users_can_create_markers: text(&body, "users_can_create_markers")
            .unwrap_or("only_logged_in")
            .to_string(),
        user: owner,
        token: Uuid::new_v4().simple().to_string(),
        members: Vec::new(),
    };
    let value = map_with_token(&map);
    store.markers.insert(map.uuid.clone(), Vec::new());
    store.maps.insert(map.uuid.clone(), map);
    reply(StatusCode::CREATED, value)
}

async fn get_map(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let store = db.read().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    reply(StatusCode::OK, to_json(map))
}

async fn edit_map(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    validate_choice(&body, "privacy", &["public", "unlisted", "private"])?;
    validate_choice(&body, "users_can_create_markers", &["yes", "no", "only_logged_in"])?;

    let mut store = db.write().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    if !may_edit_map(map, &store, text(&body, "map_token"), &headers) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
    }
    let map = store.maps.get_mut(&id).ok_or_else(map_not_found)?;
    for (key, field) in [
        ("title", &mut map.title),
        ("slug", &mut map.slug),
        ("description", &mut map.description),
    ] {
        if let Some(v) = text(&body, key) {
            *field = Some(v.to_string());
        }
    }
    if let Some(v) = text(&body, "privacy") {
        map.privacy = v.to_string();
    }
    if let Some(v) = text(&body, "users_can_create_markers") {
        map.users_can_create_markers = v.to_string();
    }
    reply(StatusCode::OK, to_json(map))
}

async fn delete_map(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    if !may_edit_map(map, &store, text(&body, "map_token"), &headers) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
    }
    store.maps.remove(&id);
    store.markers.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Answers with a bare URL in `text/plain`, like the real endpoint.
async fn static_image(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let store = db.read().await;
    if !store.maps.contains_key(&id) {
        return Err(map_not_found());
    }
    let zoom = query.get("zoom").map(String::as_str).unwrap_or("10");
    let url = format!("https://cartes.io/storage/static/{id}-z{zoom}.png");
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], url).into_response())
}

async fn claim_map(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let me = store.me().username.clone();
    let map = store.maps.get_mut(&id).ok_or_else(map_not_found)?;
    if text(&body, "map_token") != Some(map.token.as_str()) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "Invalid map token."));
    }
    map.user = Some(me);
    reply(StatusCode::OK, to_json(map))
}

async fn unclaim_map(State(db): State<Db>, Path(id): Path<String>, headers: HeaderMap) -> Reply {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let me = store.me().username.clone();
    let map = store.maps.get_mut(&id).ok_or_else(map_not_found)?;
    if map.user.as_deref() != Some(me.as_str()) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "You do not own this map."));
    }
    map.user = None;
    reply(StatusCode::OK, to_json(map))
}

fn owned_map_mut<'a>(store: &'a mut Store, id: &str) -> Result<&'a mut MapRecord, ApiFailure> {
    let me = store.me().username.clone();
    let map = store.maps.get_mut(id).ok_or_else(map_not_found)?;
    if map.user.as_deref() != Some(me.as_str()) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "You do not own this map."));
    }
    Ok(map)
}

async fn list_map_users(State(db): State<Db>, Path(id): Path<String>, headers: HeaderMap) -> Reply {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let map = owned_map_mut(&mut store, &id)?;
    reply(StatusCode::OK, to_json(&map.members))
}

async fn add_map_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    require_auth(&headers)?;
    let Some(username) = text(&body, "username").map(str::to_string) else {
        return Err(ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "The username field is required."));
    };
    let mut store = db.write().await;
    if !store.users.iter().any(|u| u.username == username) {
        return Err(ApiFailure(StatusCode::NOT_FOUND, "User not found."));
    }
    let map = owned_map_mut(&mut store, &id)?;
    let member = MapMember {
        username,
        can_create_markers: body
            .get("can_create_markers")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };
    map.members.retain(|m| m.username != member.username);
    map.members.push(member.clone());
    reply(StatusCode::CREATED, to_json(&member))
}

async fn remove_map_user(
    State(db): State<Db>,
    Path((id, username)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiFailure> {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let map = owned_map_mut(&mut store, &id)?;
    let before = map.members.len();
    map.members.retain(|m| m.username != username);
    if map.members.len() == before {
        return Err(ApiFailure(StatusCode::NOT_FOUND, "User is not on this map."));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn marker_not_found() -> ApiFailure {
    ApiFailure(StatusCode::NOT_FOUND, "Marker not found.")
}

async fn list_markers(State(db): State<Db>, Path(id): Path<String>) -> Reply {
    let store = db.read().await;
    let markers = store.markers.get(&id).ok_or_else(map_not_found)?;
    let visible: Vec<Value> = markers.iter().filter(|m| !m.is_spam).map(to_json).collect();
    reply(StatusCode::OK, Value::Array(visible))
}

async fn create_marker(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = db.write().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    let allowed = match map.users_can_create_markers.as_str() {
        "yes" => true,
        "only_logged_in" => authenticated(&headers) || text(&body, "map_token") == Some(map.token.as_str()),
        _ => may_edit_map(map, &store, text(&body, "map_token"), &headers),
    };
    if !allowed {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
    }

    let (Some(lat), Some(lng)) = (number(&body, "lat"), number(&body, "lng")) else {
        return Err(ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "lat and lng are required."));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "Coordinates out of range."));
    }
    let by_id = body
        .get("category")
        .and_then(Value::as_i64)
        .and_then(|cid| store.categories.iter().find(|c| c.id == cid).cloned());
    let category = match (by_id, text(&body, "category_name")) {
        (Some(category), _) => category,
        (None, Some(name)) => store.category_by_name(name),
        (None, None) => {
            return Err(ApiFailure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "The category field is required when category name is not present.",
            ))
        }
    };

    let location = Location {
        lat,
        lng,
        ..Location::default()
    };
    let marker = Marker {
        id: store.next_marker_id,
        description: text(&body, "description").map(str::to_string),
        category,
        location: location.clone(),
        is_spam: false,
        token: Uuid::new_v4().simple().to_string(),
        locations: vec![location],
    };
    store.next_marker_id += 1;

    let mut value = to_json(&marker);
    value["token"] = Value::String(marker.token.clone());
    store.markers.entry(id).or_default().push(marker);
    reply(StatusCode::CREATED, value)
}

async fn edit_marker(
    State(db): State<Db>,
    Path((id, marker_id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = db.write().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    let map_editor = may_edit_map(map, &store, text(&body, "map_token"), &headers);
    let marker = store
        .markers
        .get_mut(&id)
        .and_then(|markers| markers.iter_mut().find(|m| m.id == marker_id))
        .ok_or_else(marker_not_found)?;

    if let Some(is_spam) = body.get("is_spam").and_then(Value::as_bool) {
        if !map_editor {
            return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
        }
        marker.is_spam = is_spam;
    } else {
        if text(&body, "token") != Some(marker.token.as_str()) && !map_editor {
            return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
        }
        if let Some(description) = text(&body, "description") {
            marker.description = Some(description.to_string());
        }
    }
    reply(StatusCode::OK, to_json(marker))
}

async fn delete_marker(
    State(db): State<Db>,
    Path((id, marker_id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let map = store.maps.get(&id).ok_or_else(map_not_found)?;
    let map_editor = may_edit_map(map, &store, text(&body, "map_token"), &headers);
    let markers = store.markers.get_mut(&id).ok_or_else(map_not_found)?;
    let index = markers
        .iter()
        .position(|m| m.id == marker_id)
        .ok_or_else(marker_not_found)?;
    if text(&body, "token") != Some(markers[index].token.as_str()) && !map_editor {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
    }
    markers.remove(index);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_locations(State(db): State<Db>, Path((id, marker_id)): Path<(String, u64)>) -> Reply {
    let store = db.read().await;
    let marker = store
        .markers
        .get(&id)
        .and_then(|markers| markers.iter().find(|m| m.id == marker_id))
        .ok_or_else(marker_not_found)?;
    reply(StatusCode::OK, to_json(&marker.locations))
}

async fn create_location(
    State(db): State<Db>,
    Path((id, marker_id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = db.write().await;
    let marker = store
        .markers
        .get_mut(&id)
        .and_then(|markers| markers.iter_mut().find(|m| m.id == marker_id))
        .ok_or_else(marker_not_found)?;
    if text(&body, "token") != Some(marker.token.as_str()) && !authenticated(&headers) {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "This action is unauthorized."));
    }
    let (Some(lat), Some(lng)) = (number(&body, "lat"), number(&body, "lng")) else {
        return Err(ApiFailure(StatusCode::UNPROCESSABLE_ENTITY, "lat and lng are required."));
    };
    let location = Location {
        lat,
        lng,
        zoom: number(&body, "zoom"),
        elevation: number(&body, "elevation"),
        heading: number(&body, "heading"),
        pitch: number(&body, "pitch"),
        roll: number(&body, "roll"),
        speed: number(&body, "speed"),
    };
    marker.location = location.clone();
    marker.locations.push(location.clone());
    reply(StatusCode::CREATED, to_json(&location))
}

// ---------------------------------------------------------------------------
// Categories and users
// ---------------------------------------------------------------------------

async fn list_categories(State(db): State<Db>) -> Reply {
    let store = db.read().await;
    reply(StatusCode::OK, to_json(&store.categories))
}

async fn search_categories(State(db): State<Db>, Query(query): Query<HashMap<String, String>>) -> Reply {
    let q = query.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    let store = db.read().await;
    let found: Vec<Value> = store
        .categories
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&q))
        .map(to_json)
        .collect();
    reply(StatusCode::OK, Value::Array(found))
}

async fn related_categories(State(db): State<Db>, Path(id): Path<i64>) -> Reply {
    let store = db.read().await;
    if !store.categories.iter().any(|c| c.id == id) {
        return Err(ApiFailure(StatusCode::NOT_FOUND, "Category not found."));
    }
    let related: Vec<Value> = store
        .categories
        .iter()
        .filter(|c| c.id != id)
        .map(to_json)
        .collect();
    reply(StatusCode::OK, Value::Array(related))
}

async fn list_users(State(db): State<Db>) -> Reply {
    let store = db.read().await;
    let public: Vec<Value> = store.users.iter().filter(|u| u.is_public).map(to_json).collect();
    reply(StatusCode::OK, Value::Array(public))
}

async fn get_user(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Reply {
    let store = db.read().await;
    let user = store
        .users
        .iter()
        .find(|u| u.username == username && u.is_public)
        .ok_or(ApiFailure(StatusCode::NOT_FOUND, "User not found."))?;
    let mut value = to_json(user);
    if query.iter().any(|(k, v)| k == "with[]" && v == "maps") {
        let maps: Vec<Value> = store
            .maps
            .values()
            .filter(|m| m.user.as_deref() == Some(username.as_str()) && m.privacy == "public")
            .map(to_json)
            .collect();
        value["maps"] = Value::Array(maps);
    }
    reply(StatusCode::OK, value)
}

async fn get_me(State(db): State<Db>, headers: HeaderMap) -> Reply {
    require_auth(&headers)?;
    let store = db.read().await;
    reply(StatusCode::OK, to_json(store.me()))
}

async fn update_me(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let me = store.me;
    if let Some(username) = text(&body, "username") {
        store.users[me].username = username.to_string();
    }
    if let Some(is_public) = body.get("is_public").and_then(Value::as_bool) {
        store.users[me].is_public = is_public;
    }
    reply(StatusCode::OK, to_json(store.me()))
}
