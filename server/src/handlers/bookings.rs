use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "ticketId")]
    pub ticket_id: Uuid,
    pub quantity: i32,
    #[serde(alias = "customerEmail")]
    pub customer_email: String,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.quantity <= 0 {
            return Err(AppError::ValidationError(
                "quantity must be a positive integer".to_string(),
            ));
        }
        if !self.customer_email.trim().contains('@') {
            return Err(AppError::ValidationError(
                "customer_email must be an email address".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub total_price: Decimal,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            total_price: booking.total_price(),
            booking,
        }
    }
}

/// Reserves units of a ticket. Responds 201 with the pending booking.
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let booking = state
        .ledger
        .reserve(request.ticket_id, request.quantity, &request.customer_email)
        .await?;

    Ok(created(BookingResponse::from(booking), "Booking successful").into_response())
}

pub async fn get_booking(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let booking = state.ledger.booking(id).await?;
    Ok(success(BookingResponse::from(booking), "Booking fetched").into_response())
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateBookingStatusRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let booking = state.ledger.transition_status(id, request.status).await?;
    Ok(success(BookingResponse::from(booking), "Booking status updated").into_response())
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let booking = state.ledger.cancel(id).await?;
    Ok(success(BookingResponse::from(booking), "Booking cancelled").into_response())
}

/// Payment-succeeded signal from the payment collaborator.
pub async fn confirm_payment(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let booking = state.ledger.confirm_payment(id).await?;
    Ok(success(BookingResponse::from(booking), "Payment confirmed").into_response())
}
