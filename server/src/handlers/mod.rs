use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod bookings;
pub mod tickets;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    storage: &'static str,
    durable: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Response, AppError> {
    state.store.health_check().await?;

    let payload = HealthPayload {
        status: "ok",
        service: "bookmyseat-api",
        storage: state.store.backend_name(),
        durable: state.store.is_durable(),
    };

    Ok(success(payload, "Health check successful").into_response())
}
