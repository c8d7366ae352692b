//! Persistence seams consumed by the booking ledger and the HTTP handlers.
//!
//! Two backends implement these traits: [`postgres::PgStore`] for durable
//! deployments and [`memory::InMemoryStore`] for local development and tests.
//! Every mutation of a ticket's `quantity` is guarded the way
//! [`CatalogStore::conditional_adjust_quantity`] is; there is no unconditional
//! quantity write anywhere in the API. The two ledger writes that touch a
//! ticket and a booking together, [`BookingStore::reserve_units`] and
//! [`BookingStore::transition_booking`], commit both records or neither.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Ticket, TicketStatus, User};

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a guarded quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAdjustment {
    /// The delta was applied; `remaining` is the quantity afterwards.
    Applied { remaining: i32 },
    /// The guard did not hold (or the ticket does not exist) and nothing changed.
    Rejected,
}

impl QuantityAdjustment {
    pub fn is_applied(self) -> bool {
        matches!(self, QuantityAdjustment::Applied { .. })
    }
}

/// Outcome of [`BookingStore::reserve_units`]. Only `Reserved` wrote anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    Reserved { booking: Booking, remaining: i32 },
    TicketMissing,
    NotBookable(TicketStatus),
    Insufficient,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_ticket(&self, ticket: Ticket) -> StoreResult<Ticket>;
    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>>;
    /// Moderation write. Never touches `quantity`.
    async fn set_ticket_status(&self, id: Uuid, status: TicketStatus) -> StoreResult<Ticket>;
    /// Fails with `Conflict` while any booking references the ticket.
    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()>;
    /// Atomically adds `delta` to the ticket's quantity if and only if the
    /// result is at least `min_resulting`. Concurrent calls for the same
    /// ticket are linearizable.
    async fn conditional_adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
        min_resulting: i32,
    ) -> StoreResult<QuantityAdjustment>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking>;
    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    /// Compare-and-set on the booking status. Returns `false` without writing
    /// when the stored status is no longer `expected`. `paid_at` is only
    /// written when `Some`.
    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool>;
    /// Takes `booking.quantity` units from an approved ticket and records the
    /// booking in one atomic step. The ticket status and quantity guards are
    /// evaluated at write time.
    async fn reserve_units(&self, booking: Booking) -> StoreResult<Reservation>;
    /// Status compare-and-set that, when `restore_inventory` is set, hands the
    /// booking's units back to its ticket in the same atomic step. On error
    /// neither record has changed.
    async fn transition_booking(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        paid_at: Option<DateTime<Utc>>,
        restore_inventory: bool,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait Store: CatalogStore + BookingStore + UserStore {
    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
