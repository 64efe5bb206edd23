//! Integration tests driving both services through their routers.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking::BookingOrchestrator;
use gateway::{InProcessInventoryClient, ResilientGateway};
use inventory::ReservationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryBookingStore, MemoryInventoryStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Both routers wired over one in-memory inventory, as a single-process
/// deployment would be.
fn setup() -> (Router, Router) {
    let engine = Arc::new(ReservationEngine::new(MemoryInventoryStore::new()));

    let inventory_app = api::create_inventory_app(
        Arc::new(api::InventoryState {
            engine: engine.clone(),
        }),
        get_metrics_handle(),
    );

    let gateway = ResilientGateway::with_defaults(InProcessInventoryClient::new(engine));
    let booking_app = api::create_booking_app(
        Arc::new(api::BookingState {
            orchestrator: BookingOrchestrator::new(MemoryBookingStore::new(), gateway),
            unavailable_as_conflict: true,
        }),
        get_metrics_handle(),
    );

    (booking_app, inventory_app)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_json_as(uri: &str, user: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::empty())
        .unwrap()
}

/// Seeds a hotel with one room through the inventory API, returning the
/// room id.
async fn seed_room(inventory_app: &Router) -> String {
    let (status, hotel) = send(
        inventory_app,
        post_json("/hotels", serde_json::json!({ "name": "Grand Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, room) = send(
        inventory_app,
        post_json(
            "/rooms",
            serde_json::json!({ "hotel_id": hotel["id"], "number": "101" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    room["id"].as_str().unwrap().to_string()
}

fn user() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[tokio::test]
async fn health_check() {
    let (booking_app, inventory_app) = setup();
    for app in [&booking_app, &inventory_app] {
        let (status, json) = send(
            app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let (booking_app, _) = setup();
    let response = booking_app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_lifecycle_create_get_list_cancel() {
    let (booking_app, inventory_app) = setup();
    let room_id = seed_room(&inventory_app).await;
    let user = user();

    let (status, created) = send(
        &booking_app,
        post_json_as(
            "/bookings",
            &user,
            serde_json::json!({
                "room_id": room_id,
                "start_date": "2031-04-01",
                "end_date": "2031-04-05"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "CONFIRMED");
    assert_eq!(created["room_id"], room_id.as_str());
    let booking_id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&booking_app, get_as(&format!("/bookings/{booking_id}"), &user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], booking_id.as_str());

    let (status, listed) = send(&booking_app, get_as("/bookings", &user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, cancelled) = send(
        &booking_app,
        post_json_as(
            &format!("/bookings/{booking_id}/cancel"),
            &user,
            serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
}

#[tokio::test]
async fn missing_identity_header_is_rejected() {
    let (booking_app, _) = setup();
    let (status, json) = send(
        &booking_app,
        post_json(
            "/bookings",
            serde_json::json!({
                "start_date": "2031-04-01",
                "end_date": "2031-04-05",
                "auto_select": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn overlapping_booking_is_a_conflict() {
    let (booking_app, inventory_app) = setup();
    let room_id = seed_room(&inventory_app).await;

    let (status, _) = send(
        &booking_app,
        post_json_as(
            "/bookings",
            &user(),
            serde_json::json!({
                "room_id": room_id,
                "start_date": "2031-04-01",
                "end_date": "2031-04-05"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Inclusive ranges: sharing only the boundary day still collides.
    let (status, json) = send(
        &booking_app,
        post_json_as(
            "/bookings",
            &user(),
            serde_json::json!({
                "room_id": room_id,
                "start_date": "2031-04-05",
                "end_date": "2031-04-08"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn backwards_dates_are_a_bad_request() {
    let (booking_app, inventory_app) = setup();
    let room_id = seed_room(&inventory_app).await;

    let (status, _) = send(
        &booking_app,
        post_json_as(
            "/bookings",
            &user(),
            serde_json::json!({
                "room_id": room_id,
                "start_date": "2031-04-05",
                "end_date": "2031-04-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recommend_excludes_booked_rooms() {
    let (booking_app, inventory_app) = setup();
    let room_id = seed_room(&inventory_app).await;

    let (status, _) = send(
        &booking_app,
        post_json_as(
            "/bookings",
            &user(),
            serde_json::json!({
                "room_id": room_id,
                "start_date": "2031-04-01",
                "end_date": "2031-04-05"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rooms) = send(
        &inventory_app,
        Request::builder()
            .uri("/rooms?start_date=2031-04-02&end_date=2031-04-03")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rooms.as_array().unwrap().is_empty());

    let (status, rooms) = send(
        &inventory_app,
        Request::builder()
            .uri("/rooms?start_date=2031-05-01&end_date=2031-05-03")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let (_, inventory_app) = setup();
    let (status, _) = send(
        &inventory_app,
        Request::builder()
            .uri(format!("/rooms/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
