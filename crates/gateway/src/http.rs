//! HTTP client for a remotely deployed inventory service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BookingId, DateRange, HotelId, IdempotencyKey, RoomId};
use domain::Room;
use inventory::Confirmation;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::client::{ClientError, InventoryClient, Rejection};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire payload for `POST /rooms/{id}/confirm-availability`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmAvailabilityRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub idempotency_key: IdempotencyKey,
    pub booking_id: Option<BookingId>,
}

/// Wire payload for `POST /rooms/{id}/confirm-booking`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    pub idempotency_key: IdempotencyKey,
}

/// Wire payload for `POST /rooms/{id}/release`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub idempotency_key: IdempotencyKey,
    pub booking_id: Option<BookingId>,
}

/// Error body returned by the inventory service.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// [`InventoryClient`] talking JSON over HTTP.
///
/// 4xx answers become typed rejections; connection failures, timeouts,
/// and 5xx answers become transport errors the gateway may retry.
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("malformed response body: {e}")))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };

        let kind = match status.as_u16() {
            400 => Rejection::Validation,
            404 => Rejection::NotFound,
            409 => Rejection::Conflict,
            _ => {
                return Err(ClientError::Transport(format!(
                    "inventory service answered {status}: {message}"
                )));
            }
        };
        Err(ClientError::Rejected { kind, message })
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn recommend(
        &self,
        hotel_id: Option<HotelId>,
        range: Option<DateRange>,
    ) -> Result<Vec<Room>, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(hotel_id) = hotel_id {
            query.push(("hotel_id", hotel_id.to_string()));
        }
        if let Some(range) = range {
            query.push(("start_date", range.start.to_string()));
            query.push(("end_date", range.end.to_string()));
        }

        let response = self
            .client
            .get(self.url("/rooms"))
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Room, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/rooms/{room_id}")))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn confirm_availability(
        &self,
        room_id: RoomId,
        range: DateRange,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<Confirmation, ClientError> {
        let body = ConfirmAvailabilityRequest {
            start_date: range.start,
            end_date: range.end,
            idempotency_key,
            booking_id,
        };
        let response = self
            .client
            .post(self.url(&format!("/rooms/{room_id}/confirm-availability")))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn confirm_booking(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
    ) -> Result<(), ClientError> {
        let body = ConfirmBookingRequest { idempotency_key };
        let response = self
            .client
            .post(self.url(&format!("/rooms/{room_id}/confirm-booking")))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await.map(|_| ())
    }

    async fn release(
        &self,
        room_id: RoomId,
        idempotency_key: IdempotencyKey,
        booking_id: Option<BookingId>,
    ) -> Result<(), ClientError> {
        let body = ReleaseRequest {
            idempotency_key,
            booking_id,
        };
        let response = self
            .client
            .post(self.url(&format!("/rooms/{room_id}/release")))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await.map(|_| ())
    }
}
