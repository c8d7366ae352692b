//! Booking ledger: reserves ticket inventory and drives the booking lifecycle.
//!
//! The ledger holds no locks of its own. The two invariant-bearing steps are
//! delegated to atomic store operations:
//!
//! - [`BookingStore::reserve_units`] checks the ticket is approved and has
//!   enough units, decrements it and records the booking as one write, so
//!   concurrent reservations can never oversell a ticket;
//! - [`BookingStore::transition_booking`] is a compare-and-set on the booking
//!   that returns units in the same write, so a repeated cancellation or
//!   rejection restores units exactly once and a failed restore leaves the
//!   booking where it was.
//!
//! Units are taken from the ticket once, at reservation. Payment never
//! touches inventory.
//!
//! [`BookingStore::reserve_units`]: crate::store::BookingStore::reserve_units
//! [`BookingStore::transition_booking`]: crate::store::BookingStore::transition_booking
mod error;

pub use error::{LedgerError, LedgerResult};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Ticket};
use crate::store::{BookingStore, CatalogStore, Reservation, Store};

pub struct BookingLedger {
    store: Arc<dyn Store>,
}

impl BookingLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reserves `quantity` units of a ticket for `customer_email`.
    ///
    /// On any error no booking exists for the attempt and the ticket quantity
    /// is what it was before the call.
    pub async fn reserve(
        &self,
        ticket_id: Uuid,
        quantity: i32,
        customer_email: &str,
    ) -> LedgerResult<Booking> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidArgument(
                "quantity must be a positive integer".to_string(),
            ));
        }
        let customer_email = customer_email.trim();
        if customer_email.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "customer email is required".to_string(),
            ));
        }

        let ticket = self.load_ticket(ticket_id).await?;
        let booking = Booking::pending(&ticket, customer_email, quantity, Utc::now());
        match self.store.reserve_units(booking).await? {
            Reservation::Reserved { booking, remaining } => {
                info!(
                    booking_id = %booking.id,
                    %ticket_id,
                    quantity,
                    remaining,
                    "booking reserved"
                );
                Ok(booking)
            }
            Reservation::TicketMissing => Err(LedgerError::NotFound(format!("ticket {ticket_id}"))),
            Reservation::NotBookable(status) => {
                Err(LedgerError::NotBookable { ticket_id, status })
            }
            Reservation::Insufficient => {
                debug!(%ticket_id, requested = quantity, "reservation rejected by inventory guard");
                Err(LedgerError::InsufficientInventory {
                    ticket_id,
                    requested: quantity,
                })
            }
        }
    }

    /// Moves a booking to `target`.
    ///
    /// `paid` is only reachable through [`BookingLedger::confirm_payment`].
    pub async fn transition_status(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> LedgerResult<Booking> {
        if target == BookingStatus::Paid {
            let booking = self.load_booking(booking_id).await?;
            ensure_transition(booking.status, target)?;
            return Err(LedgerError::InvalidStateTransition {
                from: booking.status,
                to: target,
            });
        }
        self.apply_transition(booking_id, target).await
    }

    /// Reacts to the payment-succeeded signal for an approved booking.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        self.apply_transition(booking_id, BookingStatus::Paid).await
    }

    /// Cancels a live booking and hands its units back to the ticket.
    pub async fn cancel(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        self.apply_transition(booking_id, BookingStatus::Cancelled).await
    }

    pub async fn booking(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        self.load_booking(booking_id).await
    }

    async fn apply_transition(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> LedgerResult<Booking> {
        // A lost compare-and-set means another writer moved the booking
        // forward. The state graph is acyclic, so this loop runs at most once
        // per remaining edge before `ensure_transition` stops it.
        loop {
            let booking = self.load_booking(booking_id).await?;
            ensure_transition(booking.status, target)?;

            let now = Utc::now();
            let paid_at = if target == BookingStatus::Paid {
                self.ensure_departure_pending(&booking, now).await?;
                Some(now)
            } else {
                None
            };

            let swapped = self
                .store
                .transition_booking(
                    booking.id,
                    booking.status,
                    target,
                    paid_at,
                    target.restores_inventory(),
                )
                .await?;
            if !swapped {
                debug!(%booking_id, from = %booking.status, to = %target, "booking changed concurrently, retrying");
                continue;
            }

            info!(%booking_id, from = %booking.status, to = %target, "booking status changed");
            if target.restores_inventory() {
                debug!(%booking_id, ticket_id = %booking.ticket_id, quantity = booking.quantity, "inventory restored");
            }
            return Ok(Booking {
                status: target,
                paid_at: paid_at.or(booking.paid_at),
                updated_at: now,
                ..booking
            });
        }
    }

    async fn ensure_departure_pending(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let ticket = self.load_ticket(booking.ticket_id).await?;
        if ticket.departure_elapsed(now) {
            return Err(LedgerError::DepartureElapsed(ticket.id));
        }
        Ok(())
    }

    async fn load_ticket(&self, ticket_id: Uuid) -> LedgerResult<Ticket> {
        self.store
            .find_ticket(ticket_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("ticket {ticket_id}")))
    }

    async fn load_booking(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        self.store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("booking {booking_id}")))
    }
}

fn ensure_transition(from: BookingStatus, to: BookingStatus) -> LedgerResult<()> {
    if from == to {
        return Err(LedgerError::AlreadyInState(from));
    }
    if from.is_terminal() || !from.can_transition_to(to) {
        return Err(LedgerError::InvalidStateTransition { from, to });
    }
    Ok(())
}
