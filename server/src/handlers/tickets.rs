use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{NewTicket, Ticket, TicketStatus};
use crate::state::AppState;
use crate::store::CatalogStore;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(alias = "vendorEmail")]
    pub vendor_email: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub departure: Option<DateTime<Utc>>,
}

impl CreateTicketRequest {
    pub fn validate(self) -> Result<NewTicket, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("title is required".to_string()));
        }
        let vendor_email = self.vendor_email.trim();
        if !vendor_email.contains('@') {
            return Err(AppError::ValidationError(
                "vendor_email must be an email address".to_string(),
            ));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        if self.quantity < 0 {
            return Err(AppError::ValidationError(
                "quantity must not be negative".to_string(),
            ));
        }

        Ok(NewTicket {
            title: title.to_string(),
            vendor_email: vendor_email.to_string(),
            price: self.price,
            quantity: self.quantity,
            departure: self.departure,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let ticket = Ticket::from_new(request.validate()?, Utc::now());
    let ticket = state.store.insert_ticket(ticket).await?;

    tracing::info!(ticket_id = %ticket.id, vendor = %ticket.vendor_email, "ticket listed");
    Ok(created(ticket, "Ticket added").into_response())
}

pub async fn get_ticket(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let ticket = state
        .store
        .find_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id} not found")))?;

    Ok(success(ticket, "Ticket fetched").into_response())
}

/// Moderation: approve, reject, hide or re-queue a listing.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTicketStatusRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let ticket = state.store.set_ticket_status(id, request.status).await?;

    tracing::info!(ticket_id = %id, status = %ticket.status, "ticket moderated");
    Ok(success(ticket, "Ticket status updated").into_response())
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    state.store.delete_ticket(id).await?;

    tracing::info!(ticket_id = %id, "ticket deleted");
    Ok(empty_success("Ticket deleted successfully").into_response())
}
