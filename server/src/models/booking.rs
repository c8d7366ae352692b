use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Ticket, UnknownStatus};

/// Lifecycle of a booking.
///
/// ```text
/// pending ──> approved ──> paid
///    │            │
///    └────────────┴──> rejected | cancelled
/// ```
///
/// `paid`, `rejected` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    #[serde(alias = "accepted")]
    Approved,
    Rejected,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Paid | BookingStatus::Rejected | BookingStatus::Cancelled
        )
    }

    /// Entering this state hands the reserved units back to the ticket.
    pub fn restores_inventory(self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(self, target: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, target),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Rejected)
                | (Approved, Cancelled)
                | (Approved, Paid)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "approved" | "accepted" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            "paid" => Ok(BookingStatus::Paid),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            _ => Err(UnknownStatus::new("booking", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub customer_email: String,
    pub quantity: i32,
    /// Ticket price at the moment of reservation.
    pub unit_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn pending(
        ticket: &Ticket,
        customer_email: impl Into<String>,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            customer_email: customer_email.into(),
            quantity,
            unit_price: ticket.price,
            status: BookingStatus::Pending,
            created_at: now,
            paid_at: None,
            updated_at: now,
        }
    }

    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
