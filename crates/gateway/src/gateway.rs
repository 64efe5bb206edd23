//! The resilient gateway wrapper.

use std::future::Future;
use std::time::Duration;

use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId};
use domain::Room;
use inventory::Confirmation;

use crate::client::{ClientError, InventoryClient};
use crate::error::GatewayError;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Tuning knobs for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upper bound on a single attempt, on top of the client's own
    /// transport timeouts.
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    /// Consecutive transport failures before the circuit opens.
    pub failure_threshold: usize,
    /// How long the circuit stays open before a half-open probe.
    pub reset_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Wraps an [`InventoryClient`] with timeouts, bounded retries, and a
/// circuit breaker.
///
/// All wrapped operations are idempotent on the remote side (keyed by
/// idempotency key), so retrying after an ambiguous failure is safe.
/// Application rejections from the remote are surfaced typed and are
/// neither retried nor counted against the breaker.
pub struct ResilientGateway<C> {
    client: C,
    breaker: CircuitBreaker,
    config: GatewayConfig,
}

impl<C: InventoryClient> ResilientGateway<C> {
    /// Creates a gateway with the given tuning.
    pub fn new(client: C, config: GatewayConfig) -> Self {
        let breaker = CircuitBreaker::new(
            "inventory-service",
            config.failure_threshold,
            config.reset_timeout,
        );
        Self {
            client,
            breaker,
            config,
        }
    }

    /// Creates a gateway with default tuning.
    pub fn with_defaults(client: C) -> Self {
        Self::new(client, GatewayConfig::default())
    }

    /// Gets the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    async fn call_with_retry<T, Fut>(
        &self,
        op: &'static str,
        mut attempt_call: impl FnMut() -> Fut,
    ) -> Result<T, GatewayError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if !self.breaker.allow().await {
            metrics::counter!("gateway_fast_fails_total", "op" => op).increment(1);
            tracing::warn!(op, "circuit open, failing fast");
            return Err(GatewayError::Unavailable(format!(
                "circuit open for inventory service ({op})"
            )));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match tokio::time::timeout(self.config.call_timeout, attempt_call()).await
            {
                Ok(Ok(value)) => {
                    self.breaker.record_success().await;
                    return Ok(value);
                }
                Ok(Err(ClientError::Rejected { kind, message })) => {
                    // The dependency answered; it is healthy, we were wrong.
                    self.breaker.record_success().await;
                    return Err(GatewayError::from_rejection(kind, message));
                }
                Ok(Err(ClientError::Transport(msg))) => msg,
                Err(_) => format!("{op} timed out after {:?}", self.config.call_timeout),
            };

            self.breaker.record_failure().await;
            metrics::counter!("gateway_transport_failures_total", "op" => op).increment(1);

            if attempt >= self.config.retry.max_attempts {
                tracing::error!(op, attempt, error = %failure, "retries exhausted");
                return Err(GatewayError::Unavailable(failure));
            }

            let backoff = self.config.retry.backoff(attempt);
            tracing::warn!(op, attempt, error = %failure, ?backoff, "retrying");
            tokio::time::sleep(backoff).await;
        }
    }

    /// Lists recommendable rooms.
    pub async fn recommend(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<DateRange>,
    ) -> Result<Vec<Room>, GatewayError> {
        self.call_with_retry("recommend", || self.client.recommend(hotel_id, range))
            .await
    }

    /// Fetches a room by id.
    pub async fn get_room(&self, room_id: RoomId) -> Result<Room, GatewayError> {
        self.call_with_retry("get_room", || self.client.get_room(room_id))
            .await
    }

    /// Requests an availability lock.
    pub async fn confirm_availability(
        &self,
        room_id: RoomId,
        range: DateRange,
        idempotency_key: &IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<Confirmation, GatewayError> {
        self.call_with_retry("confirm_availability", || {
            self.client
                .confirm_availability(room_id, range, idempotency_key.clone(), booking_id)
        })
        .await
    }

    /// Confirms the lock and counter increment.
    pub async fn confirm_booking(
        &self,
        room_id: RoomId,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), GatewayError> {
        self.call_with_retry("confirm_booking", || {
            self.client.confirm_booking(room_id, idempotency_key.clone())
        })
        .await
    }

    /// Releases the lock. Retried like the other operations; callers
    /// performing compensation treat any error as best-effort and move
    /// on.
    pub async fn release(
        &self,
        room_id: RoomId,
        idempotency_key: &IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<(), GatewayError> {
        self.call_with_retry("release", || {
            self.client
                .release(room_id, idempotency_key.clone(), booking_id)
        })
        .await
    }
}
