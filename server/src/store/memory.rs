//! In-memory store backed by `HashMap`s behind `tokio::sync::RwLock`.
//!
//! Not durable and not shared between processes. Guarded quantity changes and
//! booking status compare-and-set run entirely under one write lock, which
//! gives the same per-record atomicity the Postgres backend gets from a
//! single `UPDATE ... WHERE`. Writes spanning a ticket and a booking hold both
//! write locks and check every guard before mutating either map.
//!
//! Lock order is always `tickets` before `bookings`.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BookingStore, CatalogStore, QuantityAdjustment, Reservation, Store, StoreError, StoreResult,
    UserStore,
};
use crate::models::{Booking, BookingStatus, Ticket, TicketStatus, User};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tickets: Arc<RwLock<HashMap<Uuid, Ticket>>>,
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an identity record. Users are owned by the identity provider, so
    /// there is no write path for them on the store traits.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.email.clone(), user);
    }

    pub async fn bookings_for_ticket(&self, ticket_id: Uuid) -> Vec<Booking> {
        self.bookings
            .read()
            .await
            .values()
            .filter(|booking| booking.ticket_id == ticket_id)
            .cloned()
            .collect()
    }
}

fn apply_delta(ticket: &mut Ticket, delta: i32, min_resulting: i32) -> QuantityAdjustment {
    match ticket.quantity.checked_add(delta) {
        Some(remaining) if remaining >= min_resulting => {
            ticket.quantity = remaining;
            ticket.updated_at = Utc::now();
            QuantityAdjustment::Applied { remaining }
        }
        _ => QuantityAdjustment::Rejected,
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_ticket(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket.id) {
            return Err(StoreError::Conflict(format!("ticket {} exists", ticket.id)));
        }
        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn set_ticket_status(&self, id: Uuid, status: TicketStatus) -> StoreResult<Ticket> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {id}")))?;
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        let mut tickets = self.tickets.write().await;
        if !tickets.contains_key(&id) {
            return Err(StoreError::NotFound(format!("ticket {id}")));
        }
        let referenced = self
            .bookings
            .read()
            .await
            .values()
            .any(|booking| booking.ticket_id == id);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "ticket {id} is referenced by bookings"
            )));
        }
        tickets.remove(&id);
        Ok(())
    }

    async fn conditional_adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
        min_resulting: i32,
    ) -> StoreResult<QuantityAdjustment> {
        let mut tickets = self.tickets.write().await;
        Ok(match tickets.get_mut(&id) {
            Some(ticket) => apply_delta(ticket, delta, min_resulting),
            None => QuantityAdjustment::Rejected,
        })
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        let tickets = self.tickets.read().await;
        if !tickets.contains_key(&booking.ticket_id) {
            return Err(StoreError::NotFound(format!("ticket {}", booking.ticket_id)));
        }
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(StoreError::Conflict(format!("booking {} exists", booking.id)));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))?;
        if booking.status != expected {
            return Ok(false);
        }
        booking.status = target;
        if paid_at.is_some() {
            booking.paid_at = paid_at;
        }
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn reserve_units(&self, booking: Booking) -> StoreResult<Reservation> {
        let mut tickets = self.tickets.write().await;
        let mut bookings = self.bookings.write().await;
        let Some(ticket) = tickets.get_mut(&booking.ticket_id) else {
            return Ok(Reservation::TicketMissing);
        };
        if !ticket.status.is_bookable() {
            return Ok(Reservation::NotBookable(ticket.status));
        }
        if bookings.contains_key(&booking.id) {
            return Err(StoreError::Conflict(format!("booking {} exists", booking.id)));
        }
        let QuantityAdjustment::Applied { remaining } = apply_delta(ticket, -booking.quantity, 0)
        else {
            return Ok(Reservation::Insufficient);
        };
        bookings.insert(booking.id, booking.clone());
        Ok(Reservation::Reserved { booking, remaining })
    }

    async fn transition_booking(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        paid_at: Option<DateTime<Utc>>,
        restore_inventory: bool,
    ) -> StoreResult<bool> {
        let mut tickets = self.tickets.write().await;
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))?;
        if booking.status != expected {
            return Ok(false);
        }
        if restore_inventory {
            let ticket = tickets.get_mut(&booking.ticket_id).ok_or_else(|| {
                StoreError::Corrupt(format!("booking {id} references a missing ticket"))
            })?;
            if !apply_delta(ticket, booking.quantity, 0).is_applied() {
                return Err(StoreError::Conflict(format!(
                    "ticket {} cannot take back {} units",
                    ticket.id, booking.quantity
                )));
            }
        }
        booking.status = target;
        if paid_at.is_some() {
            booking.paid_at = paid_at;
        }
        booking.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTicket;
    use rust_decimal::Decimal;

    async fn store_with_ticket(quantity: i32) -> (InMemoryStore, Ticket) {
        let store = InMemoryStore::new();
        let ticket = Ticket::from_new(
            NewTicket {
                title: "Ferry".to_string(),
                vendor_email: "vendor@x.com".to_string(),
                price: Decimal::new(300, 0),
                quantity,
                departure: None,
            },
            Utc::now(),
        );
        let ticket = store.insert_ticket(ticket).await.unwrap();
        (store, ticket)
    }

    #[tokio::test]
    async fn test_adjust_respects_floor() {
        let (store, ticket) = store_with_ticket(2).await;

        let outcome = store
            .conditional_adjust_quantity(ticket.id, -3, 0)
            .await
            .unwrap();
        assert_eq!(outcome, QuantityAdjustment::Rejected);

        let outcome = store
            .conditional_adjust_quantity(ticket.id, -2, 0)
            .await
            .unwrap();
        assert_eq!(outcome, QuantityAdjustment::Applied { remaining: 0 });

        let stored = store.find_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_unknown_ticket_is_rejected() {
        let store = InMemoryStore::new();
        let outcome = store
            .conditional_adjust_quantity(Uuid::new_v4(), 1, 0)
            .await
            .unwrap();
        assert!(!outcome.is_applied());
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let (store, ticket) = store_with_ticket(5).await;
        let booking = Booking::pending(&ticket, "a@x.com", 1, Utc::now());
        store.insert_booking(booking.clone()).await.unwrap();

        let swapped = store
            .update_booking_status(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Approved,
                None,
            )
            .await
            .unwrap();
        assert!(swapped);

        let swapped = store
            .update_booking_status(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                None,
            )
            .await
            .unwrap();
        assert!(!swapped);

        let stored = store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Approved);
    }

    #[tokio::test]
    async fn test_delete_refused_while_referenced() {
        let (store, ticket) = store_with_ticket(5).await;
        let booking = Booking::pending(&ticket, "a@x.com", 1, Utc::now());
        store.insert_booking(booking).await.unwrap();

        let err = store.delete_ticket(ticket.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.find_ticket(ticket.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_booking_requires_existing_ticket() {
        let (store, ticket) = store_with_ticket(5).await;
        let mut booking = Booking::pending(&ticket, "a@x.com", 1, Utc::now());
        booking.ticket_id = Uuid::new_v4();

        let err = store.insert_booking(booking).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_units_checks_status_at_write_time() {
        let (store, ticket) = store_with_ticket(5).await;
        let booking = Booking::pending(&ticket, "a@x.com", 2, Utc::now());

        let outcome = store.reserve_units(booking.clone()).await.unwrap();
        assert_eq!(outcome, Reservation::NotBookable(TicketStatus::Pending));

        store
            .set_ticket_status(ticket.id, TicketStatus::Approved)
            .await
            .unwrap();
        let outcome = store.reserve_units(booking.clone()).await.unwrap();
        assert_eq!(
            outcome,
            Reservation::Reserved {
                booking: booking.clone(),
                remaining: 3
            }
        );

        let greedy = Booking::pending(&ticket, "b@x.com", 4, Utc::now());
        assert_eq!(
            store.reserve_units(greedy).await.unwrap(),
            Reservation::Insufficient
        );
        assert_eq!(store.bookings_for_ticket(ticket.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reserve_units_conflict_leaves_quantity_alone() {
        let (store, ticket) = store_with_ticket(5).await;
        store
            .set_ticket_status(ticket.id, TicketStatus::Approved)
            .await
            .unwrap();
        let booking = Booking::pending(&ticket, "a@x.com", 2, Utc::now());
        store.reserve_units(booking.clone()).await.unwrap();

        let err = store.reserve_units(booking).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        let stored = store.find_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 3);
    }

    #[tokio::test]
    async fn test_failed_restore_leaves_booking_and_ticket_unchanged() {
        let (store, ticket) = store_with_ticket(5).await;
        let booking = Booking::pending(&ticket, "a@x.com", 3, Utc::now());
        store.insert_booking(booking.clone()).await.unwrap();
        store
            .conditional_adjust_quantity(ticket.id, i32::MAX - 5, 0)
            .await
            .unwrap();

        let err = store
            .transition_booking(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                None,
                true,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        let stored = store.find_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, i32::MAX);
    }
}
