use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_log, RequestLog, API_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn with_key(mut request: Request<String>) -> Request<String> {
    request.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("Bearer {API_KEY}").parse().unwrap(),
    );
    request
}

async fn create_map(app: &Router, body: Value) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/maps", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- maps ---

#[tokio::test]
async fn list_maps_empty() {
    let resp = app().oneshot(get("/api/maps")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn create_map_returns_token() {
    let app = app();
    let map = create_map(&app, json!({"title": "Sharks"})).await;
    assert_eq!(map["title"], "Sharks");
    assert_eq!(map["privacy"], "public");
    assert!(map["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(map["uuid"].as_str().is_some());
}

#[tokio::test]
async fn create_map_rejects_bad_privacy() {
    let resp = app()
        .oneshot(json_request("POST", "/api/maps", json!({"privacy": "secret"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_map_not_found() {
    let resp = app().oneshot(get("/api/maps/does-not-exist")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Map not found.");
}

#[tokio::test]
async fn edit_map_requires_token() {
    let app = app();
    let map = create_map(&app, json!({"title": "Before"})).await;
    let uri = format!("/api/maps/{}", map["uuid"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({"title": "After"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({"title": "After", "map_token": map["token"]}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "After");
}

#[tokio::test]
async fn search_matches_public_titles() {
    let app = app();
    create_map(&app, json!({"title": "Great White Sightings"})).await;
    create_map(&app, json!({"title": "Hidden", "privacy": "private"})).await;

    let resp = app.clone().oneshot(get("/api/maps/search?q=white")).await.unwrap();
    let found = body_json(resp).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let resp = app.oneshot(get("/api/maps/search?q=hidden")).await.unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn static_image_is_plain_text() {
    let app = app();
    let map = create_map(&app, json!({})).await;
    let uri = format!("/api/maps/{}/images/static?zoom=5", map["uuid"].as_str().unwrap());
    let resp = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "text/plain"
    );
    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(text.ends_with("-z5.png"));
}

#[tokio::test]
async fn claim_needs_bearer_and_token() {
    let app = app();
    let map = create_map(&app, json!({})).await;
    let uri = format!("/api/maps/{}/claim", map["uuid"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({"map_token": map["token"]})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(with_key(json_request("POST", &uri, json!({"map_token": "wrong"}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(with_key(json_request("POST", &uri, json!({"map_token": map["token"]}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user"], "alice");

    let resp = app
        .oneshot(with_key(json_request("DELETE", &uri, json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user"], Value::Null);
}

#[tokio::test]
async fn map_users_lifecycle() {
    let app = app();
    let map = create_map(&app, json!({})).await;
    let id = map["uuid"].as_str().unwrap();
    app.clone()
        .oneshot(with_key(json_request(
            "POST",
            &format!("/api/maps/{id}/claim"),
            json!({"map_token": map["token"]}),
        )))
        .await
        .unwrap();

    let users = format!("/api/maps/{id}/users");
    let resp = app
        .clone()
        .oneshot(with_key(json_request(
            "POST",
            &users,
            json!({"username": "bob", "can_create_markers": true}),
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.clone().oneshot(with_key(get(&users))).await.unwrap();
    assert_eq!(
        body_json(resp).await,
        json!([{"username": "bob", "can_create_markers": true}])
    );

    let resp = app
        .clone()
        .oneshot(with_key(json_request("DELETE", &format!("{users}/bob"), json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(with_key(json_request("DELETE", &format!("{users}/bob"), json!({}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- markers ---

#[tokio::test]
async fn marker_lifecycle() {
    let app = app();
    let map = create_map(&app, json!({"users_can_create_markers": "yes"})).await;
    let id = map["uuid"].as_str().unwrap();
    let markers = format!("/api/maps/{id}/markers");

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &markers,
            json!({"lat": 12.5, "lng": -45.25, "category_name": "Whales"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let marker = body_json(resp).await;
    assert_eq!(marker["category"]["name"], "Whales");
    assert_eq!(marker["location"]["lat"], 12.5);
    let marker_uri = format!("{markers}/{}", marker["id"]);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &marker_uri,
            json!({"token": marker["token"], "description": "seen twice"}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["description"], "seen twice");

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{marker_uri}/locations"),
            json!({"token": marker["token"], "lat": 13.0, "lng": -45.0, "speed": 3.5}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(get(&format!("{marker_uri}/locations")))
        .await
        .unwrap();
    let locations = body_json(resp).await;
    assert_eq!(locations.as_array().unwrap().len(), 2);
    assert_eq!(locations[1]["speed"], 3.5);

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &marker_uri, json!({"token": marker["token"]})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get(&markers)).await.unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn marker_needs_category() {
    let app = app();
    let map = create_map(&app, json!({"users_can_create_markers": "yes"})).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/maps/{}/markers", map["uuid"].as_str().unwrap()),
            json!({"lat": 1.0, "lng": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn spam_flag_hides_marker() {
    let app = app();
    let map = create_map(&app, json!({"users_can_create_markers": "yes"})).await;
    let markers = format!("/api/maps/{}/markers", map["uuid"].as_str().unwrap());
    let marker = body_json(
        app.clone()
            .oneshot(json_request("POST", &markers, json!({"lat": 0.0, "lng": 0.0, "category": 1})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(marker["category"]["name"], "Sharks");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("{markers}/{}", marker["id"]),
            json!({"is_spam": true, "map_token": map["token"]}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get(&markers)).await.unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}

// --- categories and users ---

#[tokio::test]
async fn categories_search_and_related() {
    let app = app();
    let resp = app.clone().oneshot(get("/api/categories/search?q=wild")).await.unwrap();
    assert_eq!(body_json(resp).await[0]["name"], "Wildlife");

    let resp = app.clone().oneshot(get("/api/categories/1/related")).await.unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

    let resp = app.oneshot(get("/api/categories/99/related")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_hide_private_profiles() {
    let app = app();
    let resp = app.clone().oneshot(get("/api/users")).await.unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

    let resp = app.oneshot(get("/api/users/carol")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_requires_bearer() {
    let app = app();
    let resp = app.clone().oneshot(get("/api/user")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(with_key(json_request("PUT", "/api/user", json!({"is_public": false}))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"username": "alice", "is_public": false}));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let resp = app().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Not found.");
}

// --- request log ---

#[tokio::test]
async fn requests_are_recorded() {
    let log = RequestLog::default();
    let app = app_with_log(log.clone());
    app.clone()
        .oneshot(with_key(get("/api/maps?withMine=true&ids%5B%5D=a")))
        .await
        .unwrap();
    app.oneshot(json_request("POST", "/api/maps", json!({"title": "T"})))
        .await
        .unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].method, "GET");
    assert_eq!(entries[0].query.as_deref(), Some("withMine=true&ids%5B%5D=a"));
    assert_eq!(entries[0].authorization.as_deref(), Some("Bearer test-api-key"));
    assert_eq!(entries[0].body, None);
    assert_eq!(entries[1].content_type.as_deref(), Some("application/json"));
    assert_eq!(entries[1].body, Some(json!({"title": "T"})));
}

// --- background server ---

#[test]
fn spawned_server_answers_over_tcp() {
    use std::io::{Read, Write};

    let server = mock_server::spawn().unwrap();
    let addr = server
        .base_url
        .trim_start_matches("http://")
        .trim_end_matches("/api");
    let mut stream = std::net::TcpStream::connect(addr).unwrap();
    write!(
        stream,
        "GET /api/categories HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();

    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    assert!(reply.contains("Sharks"));
    assert_eq!(server.log.last().unwrap().path, "/api/categories");
}
