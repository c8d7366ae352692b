//! Postgres store.
//!
//! Guarded writes are single statements: the guard lives in the `WHERE`
//! clause, so Postgres row locking serializes concurrent writers on the same
//! ticket or booking and no read-then-write window exists. Writes that span a
//! ticket and a booking run those statements inside one transaction. Schema
//! lives in `server/migrations`.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    BookingStore, CatalogStore, QuantityAdjustment, Reservation, Store, StoreError, StoreResult,
    UserStore,
};
use crate::models::{Booking, BookingStatus, Ticket, TicketStatus, User};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: Uuid,
    title: String,
    vendor_email: String,
    price: Decimal,
    quantity: i32,
    status: String,
    departure: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            title: row.title,
            vendor_email: row.vendor_email,
            price: row.price,
            quantity: row.quantity,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("ticket {}: {e}", row.id)))?,
            departure: row.departure,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    ticket_id: Uuid,
    customer_email: String,
    quantity: i32,
    unit_price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            ticket_id: row.ticket_id,
            customer_email: row.customer_email,
            quantity: row.quantity,
            unit_price: row.unit_price,
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("booking {}: {e}", row.id)))?,
            created_at: row.created_at,
            paid_at: row.paid_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    email: String,
    name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", row.email)))?;
        Ok(User {
            email: row.email,
            name: row.name,
            role,
            created_at: row.created_at,
        })
    }
}

fn constraint_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Guarded quantity change. With `required_status` set the ticket must also be
/// in that status for the write to apply.
async fn guarded_adjust(
    conn: &mut PgConnection,
    id: Uuid,
    delta: i32,
    min_resulting: i32,
    required_status: Option<TicketStatus>,
) -> StoreResult<QuantityAdjustment> {
    // The arithmetic is widened to bigint so an overflowing delta fails the
    // guard instead of raising an error.
    let remaining = sqlx::query_scalar::<_, i32>(
        r#"UPDATE tickets SET quantity = quantity + $2, updated_at = NOW()
           WHERE id = $1
             AND quantity::bigint + $2::bigint >= $3::bigint
             AND quantity::bigint + $2::bigint <= 2147483647
             AND ($4::text IS NULL OR status = $4)
           RETURNING quantity"#,
    )
    .bind(id)
    .bind(delta)
    .bind(min_resulting)
    .bind(required_status.map(TicketStatus::as_str))
    .fetch_optional(&mut *conn)
    .await?;
    Ok(match remaining {
        Some(remaining) => QuantityAdjustment::Applied { remaining },
        None => QuantityAdjustment::Rejected,
    })
}

async fn insert_booking_row(conn: &mut PgConnection, booking: &Booking) -> StoreResult<Booking> {
    let row = sqlx::query_as::<_, BookingRow>(
        r#"INSERT INTO bookings
               (id, ticket_id, customer_email, quantity, unit_price, status, created_at, paid_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
           RETURNING id, ticket_id, customer_email, quantity, unit_price, status, created_at, paid_at, updated_at"#,
    )
    .bind(booking.id)
    .bind(booking.ticket_id)
    .bind(&booking.customer_email)
    .bind(booking.quantity)
    .bind(booking.unit_price)
    .bind(booking.status.as_str())
    .bind(booking.created_at)
    .bind(booking.paid_at)
    .bind(booking.updated_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| match constraint_code(&err).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => StoreError::NotFound(format!("ticket {}", booking.ticket_id)),
        Some(UNIQUE_VIOLATION) => StoreError::Conflict(format!("booking {} exists", booking.id)),
        _ => StoreError::Database(err),
    })?;
    row.try_into()
}

/// Status compare-and-set. Returns the booking's ticket and quantity when the
/// swap applied, `None` when the stored status is no longer `expected`.
async fn swap_booking_status(
    conn: &mut PgConnection,
    id: Uuid,
    expected: BookingStatus,
    target: BookingStatus,
    paid_at: Option<DateTime<Utc>>,
) -> StoreResult<Option<(Uuid, i32)>> {
    let swapped = sqlx::query_as::<_, (Uuid, i32)>(
        r#"UPDATE bookings
           SET status = $3, paid_at = COALESCE($4, paid_at), updated_at = NOW()
           WHERE id = $1 AND status = $2
           RETURNING ticket_id, quantity"#,
    )
    .bind(id)
    .bind(expected.as_str())
    .bind(target.as_str())
    .bind(paid_at)
    .fetch_optional(&mut *conn)
    .await?;
    if swapped.is_some() {
        return Ok(swapped);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Ok(None)
    } else {
        Err(StoreError::NotFound(format!("booking {id}")))
    }
}

async fn ticket_status(conn: &mut PgConnection, id: Uuid) -> StoreResult<Option<TicketStatus>> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    status
        .map(|status| {
            status
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("ticket {id}: {e}")))
        })
        .transpose()
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_ticket(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"INSERT INTO tickets
                   (id, title, vendor_email, price, quantity, status, departure, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id, title, vendor_email, price, quantity, status, departure, created_at, updated_at"#,
        )
        .bind(ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.vendor_email)
        .bind(ticket.price)
        .bind(ticket.quantity)
        .bind(ticket.status.as_str())
        .bind(ticket.departure)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match constraint_code(&err).as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::Conflict(format!("ticket {} exists", ticket.id)),
            _ => StoreError::Database(err),
        })?;
        row.try_into()
    }

    async fn find_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, title, vendor_email, price, quantity, status, departure, created_at, updated_at
               FROM tickets WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn set_ticket_status(&self, id: Uuid, status: TicketStatus) -> StoreResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"UPDATE tickets SET status = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, title, vendor_email, price, quantity, status, departure, created_at, updated_at"#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("ticket {id}")))?;
        row.try_into()
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| match constraint_code(&err).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => {
                    StoreError::Conflict(format!("ticket {id} is referenced by bookings"))
                }
                _ => StoreError::Database(err),
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("ticket {id}")));
        }
        Ok(())
    }

    async fn conditional_adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
        min_resulting: i32,
    ) -> StoreResult<QuantityAdjustment> {
        let mut conn = self.pool.acquire().await?;
        guarded_adjust(&mut conn, id, delta, min_resulting, None).await
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        let mut conn = self.pool.acquire().await?;
        insert_booking_row(&mut conn, &booking).await
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"SELECT id, ticket_id, customer_email, quantity, unit_price, status, created_at, paid_at, updated_at
               FROM bookings WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let swapped = swap_booking_status(&mut conn, id, expected, target, paid_at).await?;
        Ok(swapped.is_some())
    }

    async fn reserve_units(&self, booking: Booking) -> StoreResult<Reservation> {
        let mut tx = self.pool.begin().await?;
        let adjusted = guarded_adjust(
            &mut tx,
            booking.ticket_id,
            -booking.quantity,
            0,
            Some(TicketStatus::Approved),
        )
        .await?;
        let QuantityAdjustment::Applied { remaining } = adjusted else {
            // Nothing was written. Classify the refusal and let `tx` roll back.
            return Ok(match ticket_status(&mut tx, booking.ticket_id).await? {
                None => Reservation::TicketMissing,
                Some(status) if !status.is_bookable() => Reservation::NotBookable(status),
                Some(_) => Reservation::Insufficient,
            });
        };

        let booking = insert_booking_row(&mut tx, &booking).await?;
        tx.commit().await?;
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
        let mut tx = self.pool.begin().await?;
        let Some((ticket_id, quantity)) =
            swap_booking_status(&mut tx, id, expected, target, paid_at).await?
        else {
            return Ok(false);
        };

        if restore_inventory
            && !guarded_adjust(&mut tx, ticket_id, quantity, 0, None)
                .await?
                .is_applied()
        {
            return Err(StoreError::Conflict(format!(
                "ticket {ticket_id} cannot take back {quantity} units"
            )));
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT email, name, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
