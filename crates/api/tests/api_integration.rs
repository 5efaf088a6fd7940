//! API integration tests.
//!
//! These tests drive the router end to end against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use lunchlab_api::{AppState, app};
use lunchlab_common::config::PollConfig;
use lunchlab_core::{MemoryStore, Restaurant, Role, User, services::TokenClaims};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        role,
        first_name: id.to_string(),
        last_name: "Tester".to_string(),
        trigram: id.to_uppercase(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn restaurant(id: &str, name: &str) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        address: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn token_for(id: &str) -> String {
    let claims = TokenClaims {
        id: id.to_string(),
        email: None,
        collection: Some("users".to_string()),
        exp: u64::try_from((Utc::now() + Duration::hours(1)).timestamp()).unwrap(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// Create the test router over a seeded in-memory store.
async fn create_test_router() -> Router {
    let store = Arc::new(MemoryStore::new());
    for (id, role) in [("alice", Role::User), ("bob", Role::User), ("admin", Role::Admin)] {
        store.add_user(user(id, role)).await;
    }
    for (id, name) in [("pho", "Pho Corner"), ("pizza", "Pizza Place"), ("sushi", "Sushi Bar")] {
        store.add_restaurant(restaurant(id, name)).await;
    }

    app(AppState::new(store, PollConfig::default(), SECRET))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_poll(app: &Router, token: &str, restaurants: &[&str]) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/polls",
        Some(token),
        Some(json!({
            "title": "Friday lunch",
            "endDate": (Utc::now() + Duration::hours(2)).to_rfc3339(),
            "restaurantIds": restaurants,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["doc"].clone()
}

fn option_id(doc: &Value, restaurant: &str) -> String {
    doc["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["restaurant"] == restaurant || o["restaurant"]["id"] == restaurant)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_router().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router().await;
    let (status, _) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = create_test_router().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        None,
        Some(json!({ "title": "Lunch", "endDate": Utc::now().to_rfc3339(), "restaurantIds": ["pho"] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_is_anonymous() {
    let app = create_test_router().await;
    let (status, _) = send(&app, "GET", "/api/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let app = create_test_router().await;
    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token_for("alice")), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "alice");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["firstName"], "alice");
}

#[tokio::test]
async fn test_jwt_prefix_is_accepted() {
    let app = create_test_router().await;
    let request = Request::builder()
        .uri("/api/users/me")
        .header("Authorization", format!("JWT {}", token_for("bob")))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_voting_flow() {
    let app = create_test_router().await;
    let alice = token_for("alice");
    let bob = token_for("bob");

    let doc = create_poll(&app, &alice, &["pho", "pizza"]).await;
    assert_eq!(doc["status"], "active");
    assert_eq!(doc["totalVotes"], 0);
    assert_eq!(doc["createdBy"], "alice");
    assert!(doc["mostVoted"].is_null());

    let id = doc["id"].as_str().unwrap().to_string();
    let pho = option_id(&doc, "pho");
    let pizza = option_id(&doc, "pizza");

    let vote_uri = |option: &str| format!("/api/polls/{id}/options/{option}/votes");

    let (status, _) = send(&app, "POST", &vote_uri(&pho), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", &vote_uri(&pizza), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", &vote_uri(&pizza), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["totalVotes"], 3);
    assert_eq!(body["doc"]["mostVoted"], "pizza");

    let (status, body) = send(&app, "POST", &vote_uri(&pho), Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"][0]["code"], "ALREADY_VOTED");

    let (status, body) = send(&app, "GET", &format!("/api/polls/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["totalVotes"], 3);
    // Reads populate references by default
    assert_eq!(body["doc"]["mostVoted"]["name"], "Pizza Place");
    assert_eq!(body["doc"]["createdBy"]["trigram"], "ALICE");

    let (_, body) = send(&app, "GET", &format!("/api/polls/{id}?depth=0"), None, None).await;
    assert_eq!(body["doc"]["mostVoted"], "pizza");
}

#[tokio::test]
async fn test_vote_requires_authentication() {
    let app = create_test_router().await;
    let doc = create_poll(&app, &token_for("alice"), &["pho"]).await;
    let uri = format!(
        "/api/polls/{}/options/{}/votes",
        doc["id"].as_str().unwrap(),
        option_id(&doc, "pho")
    );

    let (status, _) = send(&app, "POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_router().await;
    let alice = token_for("alice");

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(&alice),
        Some(json!({
            "title": "Lunch",
            "endDate": Utc::now().to_rfc3339(),
            "restaurantIds": ["pho", "pho"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(&alice),
        Some(json!({
            "title": "Lunch",
            "endDate": Utc::now().to_rfc3339(),
            "restaurantIds": ["nowhere"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("nowhere"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(&alice),
        Some(json!({ "title": "Lunch" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_options_and_close_permissions() {
    let app = create_test_router().await;
    let alice = token_for("alice");
    let bob = token_for("bob");
    let admin = token_for("admin");

    let doc = create_poll(&app, &alice, &["pho", "pizza"]).await;
    let id = doc["id"].as_str().unwrap().to_string();

    // Any logged-in user may add an option
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/polls/{id}/options"),
        Some(&bob),
        Some(json!({ "restaurantId": "sushi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["options"][2]["addedBy"], "bob");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/polls/{id}/options"),
        Some(&bob),
        Some(json!({ "restaurantId": "sushi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the creator or an admin may remove one
    let sushi = option_id(&body["doc"], "sushi");
    let remove_uri = format!("/api/polls/{id}/options/{sushi}");
    let (status, body) = send(&app, "DELETE", &remove_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"][0]["code"], "FORBIDDEN");

    let (status, body) = send(&app, "DELETE", &remove_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["options"].as_array().unwrap().len(), 2);

    let close_uri = format!("/api/polls/{id}/close");
    let (status, _) = send(&app, "POST", &close_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &close_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["status"], "closed");
    let closed_at = body["doc"]["updatedAt"].clone();

    // Closing again succeeds without touching the poll; voting does not
    let (status, body) = send(&app, "POST", &close_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["updatedAt"], closed_at);

    let pho = option_id(&doc, "pho");
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/polls/{id}/options/{pho}/votes"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"][0]["code"], "POLL_CLOSED");
}

#[tokio::test]
async fn test_delete_poll() {
    let app = create_test_router().await;
    let alice = token_for("alice");
    let doc = create_poll(&app, &alice, &["pho"]).await;
    let uri = format!("/api/polls/{}", doc["id"].as_str().unwrap());

    let (status, _) = send(&app, "DELETE", &uri, Some(&token_for("bob")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], doc["id"]);

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_polls_with_where_clauses() {
    let app = create_test_router().await;
    let alice = token_for("alice");
    let bob = token_for("bob");

    create_poll(&app, &alice, &["pho"]).await;
    let closed = create_poll(&app, &bob, &["pizza"]).await;
    send(
        &app,
        "POST",
        &format!("/api/polls/{}/close", closed["id"].as_str().unwrap()),
        Some(&bob),
        None,
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/polls?limit=1&page=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocs"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["nextPage"], 2);

    let (_, body) = send(
        &app,
        "GET",
        "/api/polls?where%5Bstatus%5D%5Bequals%5D=active&depth=0",
        None,
        None,
    )
    .await;
    assert_eq!(body["totalDocs"], 1);
    assert_eq!(body["docs"][0]["createdBy"], "alice");

    let (_, body) = send(
        &app,
        "GET",
        "/api/polls?where%5BcreatedBy%5D%5Bequals%5D=bob&depth=0",
        None,
        None,
    )
    .await;
    assert_eq!(body["totalDocs"], 1);
    assert_eq!(body["docs"][0]["status"], "closed");

    let (status, body) = send(&app, "GET", "/api/polls?sort=-votes", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_status_filter_treats_expired_poll_as_closed() {
    let app = create_test_router().await;
    let alice = token_for("alice");

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(&alice),
        Some(json!({
            "title": "Yesterday",
            "endDate": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            "restaurantIds": ["pho"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["doc"]["id"].clone();

    let (status, body) = send(
        &app,
        "GET",
        "/api/polls?where%5Bstatus%5D%5Bequals%5D=active&depth=0",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocs"], 0);
    assert_eq!(body["docs"].as_array().unwrap().len(), 0);

    let (status, body) = send(
        &app,
        "GET",
        "/api/polls?where%5Bstatus%5D%5Bequals%5D=closed&depth=0",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocs"], 1);
    assert_eq!(body["docs"][0]["id"], id);
    assert_eq!(body["docs"][0]["status"], "closed");
}

#[tokio::test]
async fn test_restaurant_endpoints() {
    let app = create_test_router().await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/restaurants?where%5Bname%5D%5Bcontains%5D=pi",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalDocs"], 1);
    assert_eq!(body["docs"][0]["name"], "Pizza Place");

    let (_, body) = send(&app, "GET", "/api/restaurants?sort=-name", None, None).await;
    assert_eq!(body["docs"][0]["name"], "Sushi Bar");

    let (status, body) = send(&app, "GET", "/api/restaurants/sushi", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc"]["id"], "sushi");

    let (status, _) = send(&app, "GET", "/api/restaurants/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
