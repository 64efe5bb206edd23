//! Explicit resilience primitives: circuit breaker and retry policy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Failure threshold exceeded; failing fast.
    Open,
    /// Reset timeout elapsed; one probe allowed through.
    HalfOpen,
}

/// A fail-fast guard around a persistently failing dependency.
///
/// Closed counts consecutive failures; at the threshold it opens and
/// rejects calls immediately. After the reset timeout one probe is let
/// through (half-open): success closes the circuit, failure re-opens it.
pub struct CircuitBreaker {
    name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
    probe_in_flight: AtomicBool,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(name: &str, failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold,
            reset_timeout,
            last_failure: RwLock::new(None),
            probe_in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the current state, promoting Open to HalfOpen once the
    /// reset timeout has elapsed.
    pub async fn state(&self) -> CircuitState {
        let state = *self.state.read().await;
        if state == CircuitState::Open {
            let last_failure = *self.last_failure.read().await;
            if let Some(instant) = last_failure
                && instant.elapsed() > self.reset_timeout
            {
                let mut s = self.state.write().await;
                *s = CircuitState::HalfOpen;
                tracing::info!(breaker = %self.name, "circuit moving to half-open");
                return CircuitState::HalfOpen;
            }
        }
        *self.state.read().await
    }

    /// Returns true if a call may proceed. While half-open, exactly one
    /// caller is admitted as the probe; the rest fail fast until its
    /// outcome is recorded.
    pub async fn allow(&self) -> bool {
        match self.state().await {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => !self.probe_in_flight.swap(true, Ordering::SeqCst),
        }
    }

    /// Records a successful call.
    pub async fn record_success(&self) {
        self.probe_in_flight.store(false, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            self.failure_count.store(0, Ordering::SeqCst);
            tracing::info!(breaker = %self.name, "circuit recovered to closed");
        } else if *state == CircuitState::Closed {
            self.failure_count.store(0, Ordering::SeqCst);
        }
    }

    /// Records a failed call; trips the circuit at the threshold or on
    /// a failed half-open probe.
    pub async fn record_failure(&self) {
        self.probe_in_flight.store(false, Ordering::SeqCst);
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            let mut last = self.last_failure.write().await;
            *last = Some(Instant::now());
            metrics::counter!("circuit_breaker_trips_total").increment(1);
            tracing::error!(breaker = %self.name, failures = count, "circuit tripped open");
        }
    }
}

/// Bounded retry with increasing backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Backoff before retrying after `attempt` (1-based) failed calls:
    /// doubles from the initial value, capped at the maximum.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn breaker_opens_at_threshold() {
        let breaker = CircuitBreaker::new("test", 3, Duration::from_secs(60));
        assert_eq!(breaker.state().await, CircuitState::Closed);

        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(breaker.allow().await);

        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(!breaker.allow().await);
    }

    #[tokio::test]
    async fn success_resets_failure_streak() {
        let breaker = CircuitBreaker::new("test", 3, Duration::from_secs(60));
        breaker.record_failure().await;
        breaker.record_failure().await;
        breaker.record_success().await;
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn open_probes_after_reset_timeout() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        assert!(breaker.allow().await);
    }

    #[tokio::test]
    async fn half_open_probe_outcome_decides() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        breaker.record_failure().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        // Failed probe re-opens immediately.
        breaker.record_failure().await;
        assert!(!breaker.allow().await);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_admits_exactly_one_probe() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        breaker.record_failure().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(breaker.allow().await, "first caller is the probe");
        assert!(
            !breaker.allow().await,
            "concurrent callers wait for the probe's outcome"
        );

        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(breaker.allow().await);
        assert!(breaker.allow().await, "closed admits everyone again");
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(5));
    }
}
