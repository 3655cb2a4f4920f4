mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crmserver::core::config::AppConfig;
use crmserver::crm::MemoryStore;
use crmserver::email::LogSink;
use crmserver::main_module::build_router;
use crmserver::AppState;

fn app() -> Router {
    let services = common::services_over(Arc::new(MemoryStore::new()), Arc::new(LogSink));
    build_router(AppState::new(AppConfig::default(), services))
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
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signup_and_login(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": common::PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, username, common::PASSWORD).await
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (status, body) = send(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;

    let (status, category) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&owner),
        Some(json!({ "name": "Contacted" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = send(
        &app,
        "POST",
        "/api/agents",
        Some(&owner),
        Some(json!({ "username": "x", "email": "x@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let agent_id = created["agent"]["id"].as_str().unwrap().to_string();
    let credential = created["initial_credential"].as_str().unwrap().to_string();
    assert!(created["agent"]["user"].get("password_hash").is_none());

    let (status, lead) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({ "first_name": "Jane", "last_name": "Doe", "age": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let lead_id = lead["id"].as_str().unwrap().to_string();

    let (status, lead) = send(
        &app,
        "POST",
        &format!("/api/leads/{lead_id}/assign-agent"),
        Some(&owner),
        Some(json!({ "agent_id": agent_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lead["agent_id"], agent_id.as_str());

    let (status, lead) = send(
        &app,
        "PUT",
        &format!("/api/leads/{lead_id}/category"),
        Some(&owner),
        Some(json!({ "category_id": category["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lead["category_id"], category["id"]);

    // The agent logs in with the credential handed to the organizer.
    let agent_token = login(&app, "x", &credential).await;
    let (status, listing) = send(&app, "GET", "/api/leads", Some(&agent_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["assigned"].as_array().unwrap().len(), 1);
    assert!(listing["unassigned"].as_array().unwrap().is_empty());

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/leads/{lead_id}"),
        Some(&agent_token),
        Some(json!({ "description": "Called on Monday" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Called on Monday");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/leads/{lead_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/leads/{lead_id}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn category_listing_counts_uncategorized_leads() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;
    for name in ["Jane", "John"] {
        send(
            &app,
            "POST",
            "/api/leads",
            Some(&owner),
            Some(json!({ "first_name": name, "last_name": "Doe" })),
        )
        .await;
    }

    let (status, listing) = send(&app, "GET", "/api/categories", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["uncategorized_count"], 2);
    assert!(listing["categories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cross_tenant_requests_are_not_found() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;
    let rival = signup_and_login(&app, "rival").await;

    let (_, lead) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({ "first_name": "Jane", "last_name": "Doe" })),
    )
    .await;
    let lead_id = lead["id"].as_str().unwrap();

    for method in ["GET", "DELETE"] {
        let (status, _) = send(
            &app,
            method,
            &format!("/api/leads/{lead_id}"),
            Some(&rival),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn invalid_input_and_credentials() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({ "first_name": "", "last_name": "Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "owner", "password": "not the password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/agents", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_and_ids_get_json_validation_errors() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({ "last_name": "Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("first_name"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({ "first_name": "Jane", "last_name": "Doe", "age": "thirty" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, "GET", "/api/leads/not-a-uuid", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn blank_contact_fields_clear_on_update() {
    let app = app();
    let owner = signup_and_login(&app, "owner").await;

    let (status, lead) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&owner),
        Some(json!({
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@example.com",
            "phone_number": "555-0100",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let lead_id = lead["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/leads/{lead_id}"),
        Some(&owner),
        Some(json!({ "email": "", "phone_number": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], Value::Null);
    assert_eq!(updated["phone_number"], Value::Null);
}
