//! PostgreSQL-backed store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, HotelId, IdempotencyKey, LockId, RoomId, UserId};
use domain::{Booking, BookingStatus, Hotel, Room, RoomLock};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{BookingStore, Result, RoomLockStore, RoomStore, StoreError};

const BOOKING_KEY_CONSTRAINT: &str = "bookings_idempotency_key_unique";
const ROOM_NUMBER_CONSTRAINT: &str = "rooms_hotel_number_unique";
const LOCK_KEY_CONSTRAINT: &str = "room_locks_room_key_unique";

fn map_duplicate(e: sqlx::Error, constraint: &str, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::DuplicateKey(what.to_string());
    }
    StoreError::Database(e)
}

fn row_to_booking(row: PgRow) -> Result<Booking> {
    let status: String = row.try_get("status")?;
    let hotel_id: Option<Uuid> = row.try_get("hotel_id")?;
    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        room_id: RoomId::from_uuid(row.try_get("room_id")?),
        hotel_id: hotel_id.map(HotelId::from_uuid),
        range: DateRange {
            start: row.try_get("start_date")?,
            end: row.try_get("end_date")?,
        },
        status: BookingStatus::parse(&status)?,
        idempotency_key: IdempotencyKey::new(row.try_get::<String, _>("idempotency_key")?),
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_room(row: PgRow) -> Result<Room> {
    Ok(Room {
        id: RoomId::from_uuid(row.try_get("id")?),
        hotel_id: HotelId::from_uuid(row.try_get("hotel_id")?),
        number: row.try_get("number")?,
        available: row.try_get("available")?,
        times_booked: row.try_get("times_booked")?,
        version: row.try_get("version")?,
    })
}

fn row_to_lock(row: PgRow) -> Result<RoomLock> {
    let booking_id: Option<Uuid> = row.try_get("booking_id")?;
    Ok(RoomLock {
        id: LockId::from_uuid(row.try_get("id")?),
        room_id: RoomId::from_uuid(row.try_get("room_id")?),
        range: DateRange {
            start: row.try_get("start_date")?,
            end: row.try_get("end_date")?,
        },
        idempotency_key: IdempotencyKey::new(row.try_get::<String, _>("idempotency_key")?),
        booking_id: booking_id.map(BookingId::from_uuid),
        confirmed: row.try_get("confirmed")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Booking store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: Booking) -> Result<Booking> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, user_id, room_id, hotel_id, start_date, end_date,
                 status, idempotency_key, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.room_id.as_uuid())
        .bind(booking.hotel_id.map(|h| h.as_uuid()))
        .bind(booking.range.start)
        .bind(booking.range.end)
        .bind(booking.status.as_str())
        .bind(booking.idempotency_key.as_str())
        .bind(booking.version)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, BOOKING_KEY_CONSTRAINT, "idempotency key"))?;

        Ok(booking)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_booking).transpose()
    }

    async fn find_by_id_and_user(
        &self,
        id: BookingId,
        user_id: UserId,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_booking).transpose()
    }

    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE idempotency_key = $1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_booking).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let rows =
            sqlx::query("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id.as_uuid())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(row_to_booking).collect()
    }

    async fn update(&self, booking: &Booking) -> Result<Booking> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, hotel_id = $2, version = version + 1, updated_at = $3
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(booking.status.as_str())
        .bind(booking.hotel_id.map(|h| h.as_uuid()))
        .bind(now)
        .bind(booking.id.as_uuid())
        .bind(booking.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(booking.id).await? {
                Some(_) => Err(StoreError::VersionConflict {
                    expected: booking.version,
                }),
                None => Err(StoreError::NotFound {
                    resource: "booking",
                }),
            };
        }

        let mut updated = booking.clone();
        updated.version += 1;
        updated.updated_at = Some(now);
        Ok(updated)
    }
}

/// Room + lock store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl RoomStore for PostgresInventoryStore {
    async fn insert_hotel(&self, hotel: Hotel) -> Result<Hotel> {
        sqlx::query("INSERT INTO hotels (id, name, address) VALUES ($1, $2, $3)")
            .bind(hotel.id.as_uuid())
            .bind(&hotel.name)
            .bind(&hotel.address)
            .execute(&self.pool)
            .await?;
        Ok(hotel)
    }

    async fn get_hotel(&self, id: HotelId) -> Result<Option<Hotel>> {
        let row = sqlx::query("SELECT * FROM hotels WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| {
            Ok::<_, StoreError>(Hotel {
                id: HotelId::from_uuid(r.try_get("id")?),
                name: r.try_get("name")?,
                address: r.try_get("address")?,
            })
        })
        .transpose()?)
    }

    async fn insert_room(&self, room: Room) -> Result<Room> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, hotel_id, number, available, times_booked, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(room.id.as_uuid())
        .bind(room.hotel_id.as_uuid())
        .bind(&room.number)
        .bind(room.available)
        .bind(room.times_booked)
        .bind(room.version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, ROOM_NUMBER_CONSTRAINT, "room number"))?;
        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_room).transpose()
    }

    async fn update_room(&self, room: &Room) -> Result<Room> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET number = $1, available = $2, times_booked = $3, version = version + 1
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(&room.number)
        .bind(room.available)
        .bind(room.times_booked)
        .bind(room.id.as_uuid())
        .bind(room.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_room(room.id).await? {
                Some(_) => Err(StoreError::VersionConflict {
                    expected: room.version,
                }),
                None => Err(StoreError::NotFound { resource: "room" }),
            };
        }

        let mut updated = room.clone();
        updated.version += 1;
        Ok(updated)
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn available_rooms(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<&DateRange>,
    ) -> Result<Vec<Room>> {
        // Overlap exclusion uses the inclusive rule: a lock [s, e]
        // collides with [start, end] iff s <= end AND start <= e.
        let rows = sqlx::query(
            r#"
            SELECT * FROM rooms r
            WHERE r.available = TRUE
              AND ($1::uuid IS NULL OR r.hotel_id = $1)
              AND ($2::date IS NULL OR NOT EXISTS (
                    SELECT 1 FROM room_locks rl
                    WHERE rl.room_id = r.id
                      AND rl.start_date <= $3
                      AND $2 <= rl.end_date))
            ORDER BY r.times_booked ASC, r.id ASC
            "#,
        )
        .bind(hotel_id.map(|h| h.as_uuid()))
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_room).collect()
    }
}

#[async_trait]
impl RoomLockStore for PostgresInventoryStore {
    async fn insert_lock(&self, lock: RoomLock) -> Result<RoomLock> {
        sqlx::query(
            r#"
            INSERT INTO room_locks
                (id, room_id, start_date, end_date, idempotency_key,
                 booking_id, confirmed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(lock.id.as_uuid())
        .bind(lock.room_id.as_uuid())
        .bind(lock.range.start)
        .bind(lock.range.end)
        .bind(lock.idempotency_key.as_str())
        .bind(lock.booking_id.map(|b| b.as_uuid()))
        .bind(lock.confirmed)
        .bind(lock.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, LOCK_KEY_CONSTRAINT, "lock idempotency key"))?;
        Ok(lock)
    }

    async fn find_lock(&self, room_id: RoomId, key: &IdempotencyKey) -> Result<Option<RoomLock>> {
        let row =
            sqlx::query("SELECT * FROM room_locks WHERE room_id = $1 AND idempotency_key = $2")
                .bind(room_id.as_uuid())
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(row_to_lock).transpose()
    }

    async fn overlapping_locks(&self, room_id: RoomId, range: &DateRange) -> Result<Vec<RoomLock>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM room_locks
            WHERE room_id = $1 AND start_date <= $3 AND $2 <= end_date
            "#,
        )
        .bind(room_id.as_uuid())
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_lock).collect()
    }

    async fn confirm_lock(&self, id: LockId) -> Result<()> {
        let result = sqlx::query("UPDATE room_locks SET confirmed = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { resource: "lock" });
        }
        Ok(())
    }

    async fn delete_lock(&self, id: LockId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM room_locks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_locks_for_room(&self, room_id: RoomId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM room_locks WHERE room_id = $1")
            .bind(room_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_unconfirmed_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM room_locks WHERE confirmed = FALSE AND created_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
