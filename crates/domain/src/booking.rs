//! Booking record and its status state machine.

use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a booking.
///
/// Transitions are monotone:
/// ```text
/// Pending ──► Confirmed ──► Cancelled
///    │                          ▲
///    └──────────────────────────┘
/// ```
/// A cancelled booking is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Persisted locally, remote availability not yet confirmed.
    #[default]
    Pending,

    /// Remote lock acquired; the stay will happen unless cancelled.
    Confirmed,

    /// Terminal: compensated, rejected, or cancelled by the user.
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking can move to `Confirmed`.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking can move to `Cancelled`.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking owned and mutated exclusively by the booking orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    /// Back-filled from the inventory side when the caller omits it.
    pub hotel_id: Option<HotelId>,
    pub range: DateRange,
    pub status: BookingStatus,
    /// Globally unique; the saga's replay token.
    pub idempotency_key: IdempotencyKey,
    /// Optimistic concurrency counter, bumped by the store on update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Creates a new pending booking.
    pub fn pending(
        user_id: UserId,
        room_id: RoomId,
        hotel_id: Option<HotelId>,
        range: DateRange,
        idempotency_key: IdempotencyKey,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            room_id,
            hotel_id,
            range,
            status: BookingStatus::Pending,
            idempotency_key,
            version: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Moves the booking to `Confirmed`.
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if !self.status.can_confirm() {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: BookingStatus::Confirmed,
            });
        }
        self.status = BookingStatus::Confirmed;
        Ok(())
    }

    /// Moves the booking to `Cancelled`.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: BookingStatus::Cancelled,
            });
        }
        self.status = BookingStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Booking {
        let range = DateRange::new(
            "2030-05-01".parse().unwrap(),
            "2030-05-03".parse().unwrap(),
        )
        .unwrap();
        Booking::pending(
            UserId::new(),
            RoomId::new(),
            None,
            range,
            IdempotencyKey::generate(),
        )
    }

    #[test]
    fn new_booking_is_pending() {
        assert_eq!(sample().status, BookingStatus::Pending);
    }

    #[test]
    fn pending_confirms() {
        let mut b = sample();
        b.confirm().unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn pending_cancels() {
        let mut b = sample();
        b.cancel().unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn confirmed_cancels() {
        let mut b = sample();
        b.confirm().unwrap();
        b.cancel().unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn cancelled_is_never_resurrected() {
        let mut b = sample();
        b.cancel().unwrap();
        assert!(b.confirm().is_err());
        assert!(b.cancel().is_err());
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn confirmed_does_not_reconfirm() {
        let mut b = sample();
        b.confirm().unwrap();
        assert!(b.confirm().is_err());
    }

    #[test]
    fn status_roundtrips_through_storage_name() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(BookingStatus::parse("RESURRECTED").is_err());
    }
}
