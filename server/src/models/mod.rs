pub mod booking;
pub mod ticket;
pub mod user;

use thiserror::Error;

pub use booking::{Booking, BookingStatus};
pub use ticket::{NewTicket, Ticket, TicketStatus};
pub use user::{Role, User};

/// Raised when a stored or submitted status string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownStatus {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
