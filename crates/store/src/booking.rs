//! Booking store trait.

use async_trait::async_trait;
use common::{BookingId, IdempotencyKey, UserId};
use domain::Booking;

use crate::Result;

/// Durable store for booking records.
///
/// Implementations enforce a global uniqueness constraint on the
/// idempotency key and optimistic concurrency on `version`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a new booking. Fails with [`crate::StoreError::DuplicateKey`]
    /// if a booking with the same idempotency key already exists.
    async fn insert(&self, booking: Booking) -> Result<Booking>;

    /// Finds a booking by id.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Finds a booking by id, scoped to the owning user.
    async fn find_by_id_and_user(&self, id: BookingId, user_id: UserId)
    -> Result<Option<Booking>>;

    /// Finds a booking by its idempotency key.
    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Booking>>;

    /// Lists a user's bookings, most recent first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;

    /// Updates a booking with compare-and-swap on `booking.version`.
    ///
    /// Returns the stored booking with its version bumped, or
    /// [`crate::StoreError::VersionConflict`] if another writer got
    /// there first.
    async fn update(&self, booking: &Booking) -> Result<Booking>;
}
