mod common;

use axum::http::StatusCode;
use axum::Router;
use bookmyseat_server::config::Config;
use bookmyseat_server::models::{Role, User};
use bookmyseat_server::routes::create_routes;
use bookmyseat_server::state::AppState;
use bookmyseat_server::store::memory::InMemoryStore;
use chrono::{Duration, Utc};
use common::{empty_request, json_request, read_json};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: &InMemoryStore) -> Router {
    create_routes(AppState::new(Arc::new(store.clone())), &Config::default())
}

async fn send(app: &Router, request: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    (status, read_json(response).await)
}

async fn listed_and_approved(app: &Router, quantity: i32) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/tickets",
            json!({
                "title": "Dhaka to Cox's Bazar",
                "vendor_email": "vendor@x.com",
                "price": "1200.50",
                "quantity": quantity,
                "departure": (Utc::now() + Duration::days(3)).to_rfc3339(),
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(
        app,
        json_request(
            "PATCH",
            &format!("/tickets/{id}/status"),
            json!({ "status": "approved" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    id
}

#[tokio::test]
async fn health_reports_storage_backend() {
    let store = InMemoryStore::new();
    let response = app(&store)
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());

    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["storage"], "memory");
    assert_eq!(body["data"]["durable"], false);
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let store = InMemoryStore::new();
    let app = app(&store);
    let ticket_id = listed_and_approved(&app, 5).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticketId": ticket_id, "quantity": 3, "customerEmail": "a@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Booking successful");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["total_price"], "3601.50");
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, empty_request("GET", &format!("/tickets/{ticket_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 2);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": ticket_id, "quantity": 3, "customer_email": "b@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_INVENTORY");

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{booking_id}/status"),
            json!({ "status": "accepted" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/bookings/{booking_id}/payment-confirmation")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "paid");
    assert!(body["data"]["paid_at"].is_string());

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/bookings/{booking_id}/cancel")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (_, body) = send(&app, empty_request("GET", &format!("/bookings/{booking_id}"))).await;
    assert_eq!(body["data"]["status"], "paid");
}

#[tokio::test]
async fn cancel_restores_inventory_and_repeats_are_rejected() {
    let store = InMemoryStore::new();
    let app = app(&store);
    let ticket_id = listed_and_approved(&app, 4).await;

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": ticket_id, "quantity": 4, "customer_email": "a@x.com" }),
        ),
    )
    .await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        empty_request("POST", &format!("/bookings/{booking_id}/cancel")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/bookings/{booking_id}/cancel")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_IN_STATE");

    let (_, body) = send(&app, empty_request("GET", &format!("/tickets/{ticket_id}"))).await;
    assert_eq!(body["data"]["quantity"], 4);
}

#[tokio::test]
async fn pending_listing_is_not_bookable() {
    let store = InMemoryStore::new();
    let app = app(&store);

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/tickets",
            json!({ "title": "Launch", "vendorEmail": "vendor@x.com", "price": 300, "quantity": 10 }),
        ),
    )
    .await;
    let ticket_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": ticket_id, "quantity": 1, "customer_email": "a@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_BOOKABLE");
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let store = InMemoryStore::new();
    let app = app(&store);

    let (status, body) = send(&app, empty_request("GET", "/tickets/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        json_request("POST", "/bookings", json!({ "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": uuid::Uuid::new_v4(), "quantity": 0, "customer_email": "a@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": uuid::Uuid::new_v4(), "quantity": 1, "customer_email": "a@x.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{}/status", uuid::Uuid::new_v4()),
            json!({ "status": "sold" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_ticket_is_refused_while_booked() {
    let store = InMemoryStore::new();
    let app = app(&store);
    let ticket_id = listed_and_approved(&app, 3).await;

    send(
        &app,
        json_request(
            "POST",
            "/bookings",
            json!({ "ticket_id": ticket_id, "quantity": 1, "customer_email": "a@x.com" }),
        ),
    )
    .await;

    let (status, body) = send(&app, empty_request("DELETE", &format!("/tickets/{ticket_id}"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/tickets",
            json!({ "title": "Spare", "vendor_email": "vendor@x.com", "price": 10, "quantity": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let spare = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, empty_request("DELETE", &format!("/tickets/{spare}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, empty_request("GET", &format!("/tickets/{spare}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_role_lookup() {
    let store = InMemoryStore::new();
    store
        .insert_user(User {
            email: "admin@x.com".to_string(),
            name: Some("Admin".to_string()),
            role: Role::Admin,
            created_at: Utc::now(),
        })
        .await;
    let app = app(&store);

    let (status, body) = send(&app, empty_request("GET", "/user/role?email=admin@x.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (_, body) = send(&app, empty_request("GET", "/user/role?email=new@x.com")).await;
    assert_eq!(body["data"]["role"], "customer");

    let (status, body) = send(&app, empty_request("GET", "/user/role")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Email is required");
}
