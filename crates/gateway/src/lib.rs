//! Resilient gateway to the room-inventory authority.
//!
//! [`InventoryClient`] is the transport seam: an HTTP implementation
//! for deployed setups and an in-process implementation wrapping the
//! engine directly for tests and single-process demos.
//! [`ResilientGateway`] wraps any client with per-call timeouts, a
//! bounded retry policy, and a circuit breaker, translating failures
//! into the error taxonomy the orchestrator acts on.

mod client;
mod error;
mod gateway;
mod http;
mod in_process;
mod resilience;

pub use client::{ClientError, InventoryClient, Rejection};
pub use error::GatewayError;
pub use gateway::{GatewayConfig, ResilientGateway};
pub use http::{
    ConfirmAvailabilityRequest, ConfirmBookingRequest, ErrorBody, HttpInventoryClient,
    ReleaseRequest,
};
pub use in_process::InProcessInventoryClient;
pub use resilience::{CircuitBreaker, CircuitState, RetryPolicy};
