use thiserror::Error;
use uuid::Uuid;

use crate::models::{BookingStatus, TicketStatus};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("ticket {ticket_id} is {status} and cannot be booked")]
    NotBookable {
        ticket_id: Uuid,
        status: TicketStatus,
    },

    #[error("ticket {ticket_id} has fewer than {requested} units remaining")]
    InsufficientInventory { ticket_id: Uuid, requested: i32 },

    #[error("booking cannot move from {from} to {to}")]
    InvalidStateTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already {0}")]
    AlreadyInState(BookingStatus),

    #[error("departure of ticket {0} has already passed")]
    DepartureElapsed(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
