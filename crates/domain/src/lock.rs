//! Room lock record — a provisional or confirmed hold on a room.

use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, IdempotencyKey, LockId, RoomId};
use serde::{Deserialize, Serialize};

/// A hold on a room for a date range, keyed by idempotency key.
///
/// Lifecycle: created unconfirmed, confirmed exactly once, deleted on
/// release (successful or compensating). There are no other states.
/// The engine guarantees that, per room, locks with different
/// idempotency keys never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLock {
    pub id: LockId,
    pub room_id: RoomId,
    pub range: DateRange,
    pub idempotency_key: IdempotencyKey,
    pub booking_id: Option<BookingId>,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl RoomLock {
    /// Creates a new unconfirmed lock.
    pub fn unconfirmed(
        room_id: RoomId,
        range: DateRange,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Self {
        Self {
            id: LockId::new(),
            room_id,
            range,
            idempotency_key,
            booking_id,
            confirmed: false,
            created_at: Utc::now(),
        }
    }
}
