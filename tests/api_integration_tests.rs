//! HTTP-level tests for the rentals API.

#[path = "test_utils/mod.rs"]
mod test_utils;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use rentals::server::create_app;
use serde_json::{Value, json};
use test_utils::{setup_test_state, spawn_test_app, test_config};
use tower::ServiceExt;

const PASSWORD: &str = "Harvest#2025";

async fn app(require_auth_for_writes: bool) -> Router {
    let state = setup_test_state(test_config(require_auth_for_writes))
        .await
        .unwrap();
    create_app(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, value)
}

fn listing_body(name: &str, category: &str, rent: f64) -> Value {
    json!({
        "name": name,
        "brand": "John Deere",
        "price": rent * 300.0,
        "rent": rent,
        "category": category,
        "type": "medium",
        "description": "Well maintained, serviced every season",
        "image": "https://img.example.com/listing.jpg"
    })
}

async fn register_and_login(app: &Router) -> String {
    let (status, _, _) = send(
        app,
        Method::POST,
        "/user/add",
        None,
        Some(json!({ "name": "Asha", "email": "asha@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        app,
        Method::POST,
        "/user/authenticate",
        None,
        Some(json!({ "email": "asha@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn writes_without_token_are_unauthorized() {
    let app = app(true).await;

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/equipment/add",
        None,
        Some(listing_body("Tractor", "tractors", 150.0)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert!(headers.get("x-trace-id").is_some());

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/equipment/delete/00000000-0000-0000-0000-000000000000",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_listing_lifecycle_over_http() {
    let app = app(true).await;
    let token = register_and_login(&app).await;

    let (status, _, created) = send(
        &app,
        Method::POST,
        "/equipment/add",
        Some(&token),
        Some(listing_body("5075E Tractor", "tractors", 150.0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["type"], "medium");
    assert_eq!(created["complete"], true);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, all) = send(&app, Method::GET, "/equipment/getall", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _, updated) = send(
        &app,
        Method::PUT,
        &format!("/equipment/update/{id}"),
        Some(&token),
        Some(json!({ "rent": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rent"], 50.0);
    assert_eq!(updated["name"], "5075E Tractor");

    let (status, _, fetched) = send(
        &app,
        Method::GET,
        &format!("/equipment/getbyid/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["rent"], 50.0);

    let (status, _, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/equipment/delete/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id.as_str());

    let (status, _, body) = send(
        &app,
        Method::GET,
        &format!("/equipment/getbyid/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, _, all) = send(&app, Method::GET, "/equipment/getall", None, None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn writes_are_open_when_auth_is_disabled() {
    let app = app(false).await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/equipment/add",
        None,
        Some(listing_body("Disc Plow", "plows", 40.0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_listing_returns_field_details() {
    let app = app(false).await;
    let mut body = listing_body("Tractor", "boats", -1.0);
    body["description"] = json!("short");

    let (status, _, error) = send(&app, Method::POST, "/equipment/add", None, Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_FAILED");
    assert!(error["details"]["category"].is_string());
    assert!(error["details"]["rent"].is_string());
    assert!(error["details"]["description"].is_string());
}

#[tokio::test]
async fn malformed_json_and_ids_are_validation_failures() {
    let app = app(false).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/equipment/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, Method::GET, "/equipment/getbyid/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let app = app(false).await;
    let (_, _, created) = send(
        &app,
        Method::POST,
        "/equipment/add",
        None,
        Some(listing_body("Disc Plow", "plows", 40.0)),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _, _) = send(
        &app,
        Method::PUT,
        &format!("/equipment/update/{id}"),
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn credentials_errors_map_to_403_and_409() {
    let app = app(true).await;
    register_and_login(&app).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/user/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "Wrong#Pass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/user/authenticate",
        None,
        Some(json!({ "email": "ghost@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/user/add",
        None,
        Some(json!({ "name": "Asha Two", "email": "ASHA@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn registration_never_returns_the_password() {
    let app = app(true).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/user/add",
        None,
        Some(json!({ "name": "Asha", "email": "asha@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "asha@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn session_endpoint_reflects_the_token() {
    let app = app(true).await;
    let token = register_and_login(&app).await;

    let (status, _, body) = send(&app, Method::GET, "/user/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "asha@example.com");
    assert!(body["expiresAt"].is_string());

    let (status, _, _) = send(&app, Method::GET, "/user/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn browse_filters_searches_and_sorts() {
    let app = app(false).await;
    for (name, category, rent) in [
        ("John Deere Tractor", "tractors", 150.0),
        ("Compact Tractor", "tractors", 90.0),
        ("Disc Plow", "plows", 40.0),
    ] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/equipment/add",
            None,
            Some(listing_body(name, category, rent)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/equipment/browse?category=tractors&sort=price-low",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|listing| listing["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Compact Tractor", "John Deere Tractor"]);

    let (_, _, body) = send(
        &app,
        Method::GET,
        "/equipment/browse?category=all&search=DEERE",
        None,
        None,
    )
    .await;
    // Every sample listing carries the "John Deere" brand.
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _, summary) = send(
        &app,
        Method::GET,
        "/equipment/browse/summary?category=tractors",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["count"], 2);
    assert_eq!(summary["lowestRent"], 90.0);
    assert_eq!(summary["highestRent"], 150.0);

    let (_, _, summary) = send(
        &app,
        Method::GET,
        "/equipment/browse/summary?search=harvester",
        None,
        None,
    )
    .await;
    assert_eq!(summary["count"], 0);
    assert!(summary["lowestRent"].is_null());

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/equipment/browse?sort=cheapest",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn estimate_clamps_days() {
    let app = app(false).await;
    let (_, _, created) = send(
        &app,
        Method::POST,
        "/equipment/add",
        None,
        Some(listing_body("Disc Plow", "plows", 40.0)),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    for (days, expected_total, expected_days) in [
        ("3", 120.0, 3),
        ("0", 40.0, 1),
        ("abc", 40.0, 1),
        ("2.5", 80.0, 2),
        ("3days", 120.0, 3),
    ] {
        let (status, _, quote) = send(
            &app,
            Method::GET,
            &format!("/equipment/estimate/{id}?days={days}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["total"], expected_total);
        assert_eq!(quote["days"], expected_days);
    }

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/equipment/estimate/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_by_email_is_empty_and_validates_input() {
    let app = app(false).await;
    send(
        &app,
        Method::POST,
        "/equipment/add",
        None,
        Some(listing_body("Disc Plow", "plows", 40.0)),
    )
    .await;

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/equipment/getbyemail/asha@example.com",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/equipment/getbyemail/not-an-email",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn incoming_trace_id_is_echoed() {
    let app = app(false).await;

    let request = Request::builder()
        .uri("/equipment/getbyid/abc")
        .header("x-trace-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-trace-id").unwrap(), "trace-abc-123");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["trace_id"], "trace-abc-123");
}

#[tokio::test]
async fn bound_server_serves_root_health_and_openapi() {
    let state = setup_test_state(test_config(true)).await.unwrap();
    let (server_url, handle) = spawn_test_app(state).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{server_url}/")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let info: Value = response.json().await.unwrap();
    assert_eq!(info["service"], "rentals");

    let response = client
        .get(format!("{server_url}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .get(format!("{server_url}/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let document: Value = response.json().await.unwrap();
    assert!(document["paths"].get("/equipment/add").is_some());

    handle.shutdown().await.unwrap();
}
