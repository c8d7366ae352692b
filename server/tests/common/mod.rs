#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use bookmyseat_server::models::{NewTicket, Ticket, TicketStatus};
use bookmyseat_server::store::memory::InMemoryStore;
use bookmyseat_server::store::CatalogStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub async fn seed_ticket(
    store: &InMemoryStore,
    quantity: i32,
    status: TicketStatus,
    departure: Option<DateTime<Utc>>,
) -> Ticket {
    let ticket = Ticket::from_new(
        NewTicket {
            title: "Dhaka to Chittagong".to_string(),
            vendor_email: "vendor@x.com".to_string(),
            price: Decimal::new(850, 0),
            quantity,
            departure,
        },
        Utc::now(),
    );
    let ticket = store.insert_ticket(ticket).await.expect("insert ticket");
    if status == TicketStatus::Pending {
        return ticket;
    }
    store
        .set_ticket_status(ticket.id, status)
        .await
        .expect("set status")
}

pub async fn approved_ticket(store: &InMemoryStore, quantity: i32) -> Ticket {
    seed_ticket(store, quantity, TicketStatus::Approved, None).await
}

pub async fn remaining(store: &InMemoryStore, ticket: &Ticket) -> i32 {
    store
        .find_ticket(ticket.id)
        .await
        .expect("find ticket")
        .expect("ticket exists")
        .quantity
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
