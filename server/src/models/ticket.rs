use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
    Hidden,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Approved => "approved",
            TicketStatus::Rejected => "rejected",
            TicketStatus::Hidden => "hidden",
        }
    }

    /// Only approved listings accept reservations.
    pub fn is_bookable(self) -> bool {
        self == TicketStatus::Approved
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TicketStatus::Pending),
            "approved" => Ok(TicketStatus::Approved),
            "rejected" => Ok(TicketStatus::Rejected),
            "hidden" => Ok(TicketStatus::Hidden),
            _ => Err(UnknownStatus::new("ticket", s)),
        }
    }
}

/// A vendor-listed offering. `quantity` is the remaining bookable units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub vendor_email: String,
    pub price: Decimal,
    pub quantity: i32,
    pub status: TicketStatus,
    pub departure: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a vendor supplies when listing a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub vendor_email: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub departure: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Builds a fresh listing awaiting moderation.
    pub fn from_new(new: NewTicket, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            vendor_email: new.vendor_email,
            price: new.price,
            quantity: new.quantity,
            status: TicketStatus::Pending,
            departure: new.departure,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn departure_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.departure.is_some_and(|departure| departure <= now)
    }
}
