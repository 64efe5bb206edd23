//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{DateRange, HotelId, IdempotencyKey, RoomId, UserId};
use domain::{Booking, Hotel, Room, RoomLock};
use sqlx::PgPool;
use store::{
    BookingStore, PostgresBookingStore, PostgresInventoryStore, RoomLockStore, RoomStore,
    StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!("../../../migrations/001_booking_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/002_inventory_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get fresh stores with their own pool and cleared tables
async fn get_test_stores() -> (PostgresBookingStore, PostgresInventoryStore) {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE bookings, room_locks, rooms, hotels")
        .execute(&pool)
        .await
        .unwrap();

    (
        PostgresBookingStore::new(pool.clone()),
        PostgresInventoryStore::new(pool),
    )
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
}

fn booking(key: &str) -> Booking {
    Booking::pending(
        UserId::new(),
        RoomId::new(),
        None,
        range("2031-05-01", "2031-05-03"),
        IdempotencyKey::new(key),
    )
}

async fn seed_room(inventory: &PostgresInventoryStore) -> Room {
    let hotel = inventory.insert_hotel(Hotel::new("Pg Test")).await.unwrap();
    inventory
        .insert_room(Room::new(hotel.id, "101"))
        .await
        .unwrap()
}

#[tokio::test]
async fn booking_roundtrip_preserves_fields() {
    let (bookings, _) = get_test_stores().await;
    let original = booking("roundtrip");

    let inserted = bookings.insert(original.clone()).await.unwrap();
    let fetched = bookings.find_by_id(inserted.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, original.id);
    assert_eq!(fetched.user_id, original.user_id);
    assert_eq!(fetched.range, original.range);
    assert_eq!(fetched.status, original.status);
    assert_eq!(fetched.idempotency_key, original.idempotency_key);
    assert_eq!(fetched.version, 0);
}

#[tokio::test]
async fn duplicate_idempotency_key_maps_to_duplicate_key() {
    let (bookings, _) = get_test_stores().await;
    bookings.insert(booking("dup")).await.unwrap();

    let err = bookings.insert(booking("dup")).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));
}

#[tokio::test]
async fn update_is_compare_and_swap() {
    let (bookings, _) = get_test_stores().await;
    let stored = bookings.insert(booking("cas")).await.unwrap();

    let mut fresh = stored.clone();
    fresh.confirm().unwrap();
    let updated = bookings.update(&fresh).await.unwrap();
    assert_eq!(updated.version, stored.version + 1);

    let mut stale = stored;
    stale.cancel().unwrap();
    let err = bookings.update(&stale).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));
}

#[tokio::test]
async fn find_by_idempotency_key_and_user_scoping() {
    let (bookings, _) = get_test_stores().await;
    let stored = bookings.insert(booking("scoped")).await.unwrap();

    let by_key = bookings
        .find_by_idempotency_key(&IdempotencyKey::new("scoped"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.id, stored.id);

    assert!(
        bookings
            .find_by_id_and_user(stored.id, stored.user_id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        bookings
            .find_by_id_and_user(stored.id, UserId::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn list_for_user_is_newest_first() {
    let (bookings, _) = get_test_stores().await;
    let user = UserId::new();

    let mut first = booking("list-a");
    first.user_id = user;
    let mut second = booking("list-b");
    second.user_id = user;
    second.created_at = first.created_at + Duration::seconds(10);
    bookings.insert(first.clone()).await.unwrap();
    bookings.insert(second.clone()).await.unwrap();

    let listed = bookings.list_for_user(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
}

#[tokio::test]
async fn duplicate_room_number_within_hotel_is_rejected() {
    let (_, inventory) = get_test_stores().await;
    let hotel = inventory.insert_hotel(Hotel::new("Pg Test")).await.unwrap();
    inventory
        .insert_room(Room::new(hotel.id, "101"))
        .await
        .unwrap();

    let err = inventory
        .insert_room(Room::new(hotel.id, "101"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));

    let other = inventory.insert_hotel(Hotel::new("Other")).await.unwrap();
    inventory
        .insert_room(Room::new(other.id, "101"))
        .await
        .unwrap();
}

#[tokio::test]
async fn room_update_is_compare_and_swap() {
    let (_, inventory) = get_test_stores().await;
    let room = seed_room(&inventory).await;

    let mut fresh = room.clone();
    fresh.times_booked = 1;
    let updated = inventory.update_room(&fresh).await.unwrap();
    assert_eq!(updated.version, room.version + 1);
    assert_eq!(updated.times_booked, 1);

    let mut stale = room;
    stale.times_booked = 9;
    let err = inventory.update_room(&stale).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));
}

#[tokio::test]
async fn lock_uniqueness_and_overlap_queries() {
    let (_, inventory) = get_test_stores().await;
    let room = seed_room(&inventory).await;
    let key = IdempotencyKey::new("lock-key");

    inventory
        .insert_lock(RoomLock::unconfirmed(
            room.id,
            range("2031-05-01", "2031-05-05"),
            key.clone(),
            None,
        ))
        .await
        .unwrap();

    let err = inventory
        .insert_lock(RoomLock::unconfirmed(
            room.id,
            range("2031-06-01", "2031-06-05"),
            key.clone(),
            None,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(_)));

    let found = inventory.find_lock(room.id, &key).await.unwrap().unwrap();
    assert!(!found.confirmed);

    // Boundary day counts as overlap; the day after does not.
    let touching = inventory
        .overlapping_locks(room.id, &range("2031-05-05", "2031-05-08"))
        .await
        .unwrap();
    assert_eq!(touching.len(), 1);
    let disjoint = inventory
        .overlapping_locks(room.id, &range("2031-05-06", "2031-05-08"))
        .await
        .unwrap();
    assert!(disjoint.is_empty());
}

#[tokio::test]
async fn confirm_and_delete_lock() {
    let (_, inventory) = get_test_stores().await;
    let room = seed_room(&inventory).await;
    let key = IdempotencyKey::new("confirm");

    let lock = inventory
        .insert_lock(RoomLock::unconfirmed(
            room.id,
            range("2031-05-01", "2031-05-03"),
            key.clone(),
            None,
        ))
        .await
        .unwrap();

    inventory.confirm_lock(lock.id).await.unwrap();
    let found = inventory.find_lock(room.id, &key).await.unwrap().unwrap();
    assert!(found.confirmed);

    assert!(inventory.delete_lock(lock.id).await.unwrap());
    assert!(inventory.find_lock(room.id, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn available_rooms_sorted_and_filtered() {
    let (_, inventory) = get_test_stores().await;
    let hotel = inventory.insert_hotel(Hotel::new("Pg Test")).await.unwrap();

    let mut popular = Room::new(hotel.id, "popular");
    popular.times_booked = 5;
    let popular = inventory.insert_room(popular).await.unwrap();
    let quiet = inventory
        .insert_room(Room::new(hotel.id, "quiet"))
        .await
        .unwrap();

    let rooms = inventory
        .available_rooms(Some(hotel.id), None)
        .await
        .unwrap();
    assert_eq!(rooms[0].id, quiet.id);
    assert_eq!(rooms[1].id, popular.id);

    // Lock the quiet room; it drops out for the locked range only.
    inventory
        .insert_lock(RoomLock::unconfirmed(
            quiet.id,
            range("2031-05-01", "2031-05-05"),
            IdempotencyKey::new("q"),
            None,
        ))
        .await
        .unwrap();

    let rooms = inventory
        .available_rooms(Some(hotel.id), Some(&range("2031-05-03", "2031-05-04")))
        .await
        .unwrap();
    assert_eq!(rooms.iter().map(|r| r.id).collect::<Vec<_>>(), vec![popular.id]);
}

#[tokio::test]
async fn purge_deletes_only_stale_unconfirmed_locks() {
    let (_, inventory) = get_test_stores().await;
    let room = seed_room(&inventory).await;

    let mut stale = RoomLock::unconfirmed(
        room.id,
        range("2031-05-01", "2031-05-02"),
        IdempotencyKey::new("stale"),
        None,
    );
    stale.created_at = Utc::now() - Duration::hours(3);
    let mut confirmed = RoomLock::unconfirmed(
        room.id,
        range("2031-06-01", "2031-06-02"),
        IdempotencyKey::new("kept"),
        None,
    );
    confirmed.created_at = Utc::now() - Duration::hours(3);
    let fresh = RoomLock::unconfirmed(
        room.id,
        range("2031-07-01", "2031-07-02"),
        IdempotencyKey::new("fresh"),
        None,
    );
    let confirmed = inventory.insert_lock(confirmed).await.unwrap();
    inventory.insert_lock(stale).await.unwrap();
    inventory.insert_lock(fresh).await.unwrap();
    inventory.confirm_lock(confirmed.id).await.unwrap();

    let removed = inventory
        .delete_unconfirmed_older_than(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn delete_room_after_its_locks() {
    let (_, inventory) = get_test_stores().await;
    let room = seed_room(&inventory).await;
    inventory
        .insert_lock(RoomLock::unconfirmed(
            room.id,
            range("2031-05-01", "2031-05-02"),
            IdempotencyKey::new("k"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(inventory.delete_locks_for_room(room.id).await.unwrap(), 1);
    assert!(inventory.delete_room(room.id).await.unwrap());
    assert!(inventory.get_room(room.id).await.unwrap().is_none());
}
