use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wayfare_api::middleware::auth::issue_token;
use wayfare_api::state::{AppState, AuthConfig};
use wayfare_api::app;
use wayfare_core::{BookingService, BookingStore, FixedClock, MemoryBookingStore};
use wayfare_shared::{TravelOption, TravelType};
use wayfare_store::app_config::RateLimitConfig;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
}

fn auth() -> AuthConfig {
    AuthConfig { secret: "test-secret".to_string(), expiration: 3600 }
}

fn option(travel_id: &str, travel_type: TravelType, source: &str, days_out: i64, available: u32) -> TravelOption {
    let departure_date = today() + Duration::days(days_out);
    TravelOption {
        travel_id: travel_id.to_string(),
        travel_type,
        source: source.to_string(),
        destination: "Los Angeles".to_string(),
        departure_date,
        departure_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        arrival_date: departure_date,
        arrival_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        price: dec!(120.00),
        available_seats: available,
        total_seats: 5,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn test_app() -> Router {
    let store = MemoryBookingStore::new();
    for option in [
        option("FL001", TravelType::Flight, "New York", 30, 5),
        option("TR001", TravelType::Train, "Chicago", 30, 5),
        option("BU001", TravelType::Bus, "New York", 10, 0),
        option("FL002", TravelType::Flight, "Boston", 0, 5),
    ] {
        store.insert_travel_option(&option).await.unwrap();
    }

    let bookings = BookingService::new(Arc::new(store))
        .with_clock(Arc::new(FixedClock::on(today())));

    app(AppState {
        bookings: Arc::new(bookings),
        redis: None,
        auth: auth(),
        rate_limit: RateLimitConfig::default(),
    })
}

fn bearer(user_id: &str) -> String {
    format!("Bearer {}", issue_token(&auth(), user_id).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn booking_body(names: &[&str]) -> Value {
    json!({
        "number_of_seats": names.len(),
        "passenger_names": names,
        "contact_phone": "+15550100",
    })
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array().unwrap().iter().map(|o| o["travel_id"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_hides_sold_out_and_filters() {
    let app = test_app().await;

    // BU001 is sold out
    let (status, all) = send(&app, Method::GET, "/v1/travel-options", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let mut all_ids = ids(&all);
    all_ids.sort();
    assert_eq!(all_ids, vec!["FL001", "FL002", "TR001"]);

    let (_, flights) = send(&app, Method::GET, "/v1/travel-options?type=flight&source=new%20york", None, None).await;
    assert_eq!(ids(&flights), vec!["FL001"]);

    let (_, priced) = send(&app, Method::GET, "/v1/travel-options?max_price=100", None, None).await;
    assert!(ids(&priced).is_empty());
}

#[tokio::test]
async fn test_get_travel_option() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/v1/travel-options/FL001", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "flight");
    assert_eq!(body["available_seats"], 5);

    let (status, body) = send(&app, Method::GET, "/v1/travel-options/NOPE", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_booking_flow() {
    let app = test_app().await;
    let user = "guest-alice";

    // 1. Book two seats
    let (status, booking) = send(
        &app, Method::POST, "/v1/travel-options/FL001/bookings", Some(user),
        Some(booking_body(&["Alice", "Bob"])),
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["total_price"], "240.00");
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["user_id"], user);
    let booking_id = booking["booking_id"].as_str().unwrap().to_string();

    let (_, option) = send(&app, Method::GET, "/v1/travel-options/FL001", None, None).await;
    assert_eq!(option["available_seats"], 3);

    // 2. More than what is left
    let names = ["A", "B", "C", "D"];
    let (status, body) = send(
        &app, Method::POST, "/v1/travel-options/FL001/bookings", Some(user),
        Some(booking_body(&names)),
    ).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "insufficient_seats");
    assert_eq!(body["available_seats"], 3);

    // 3. Listed for the owner
    let (_, list) = send(&app, Method::GET, "/v1/bookings?status=confirmed", Some(user), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // 4. Cancel restores the seats
    let uri = format!("/v1/bookings/{}/cancel", booking_id);
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], true);
    assert_eq!(body["status"], "cancelled");

    let (_, option) = send(&app, Method::GET, "/v1/travel-options/FL001", None, None).await;
    assert_eq!(option["available_seats"], 5);

    // 5. Second cancel is rejected
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_cancelled");

    let (_, confirmed) = send(&app, Method::GET, "/v1/bookings?status=confirmed", Some(user), None).await;
    assert!(confirmed.as_array().unwrap().is_empty());
    let (_, unfiltered) = send(&app, Method::GET, "/v1/bookings?status=bogus", Some(user), None).await;
    assert_eq!(unfiltered.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_routes_require_token() {
    let app = test_app().await;

    let (status, _) = send(
        &app, Method::POST, "/v1/travel-options/FL001/bookings", None,
        Some(booking_body(&["Alice"])),
    ).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/bookings")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guest_token_can_book() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().method(Method::POST).uri("/v1/auth/guest").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let login: Value = serde_json::from_slice(&bytes).unwrap();
    let token = login["token"].as_str().unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/travel-options/TR001/bookings")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(booking_body(&["Carol"]).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_bookings_are_private() {
    let app = test_app().await;

    let (_, booking) = send(
        &app, Method::POST, "/v1/travel-options/FL001/bookings", Some("guest-alice"),
        Some(booking_body(&["Alice"])),
    ).await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let uri = format!("/v1/bookings/{}", booking_id);
    let (status, _) = send(&app, Method::GET, &uri, Some("guest-mallory"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, &format!("{}/cancel", uri), Some("guest-mallory"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &uri, Some("guest-alice"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_booking_request() {
    let app = test_app().await;

    let body = json!({
        "number_of_seats": 2,
        "passenger_names": ["Only One"],
        "contact_phone": "+15550100",
    });
    let (status, body) = send(&app, Method::POST, "/v1/travel-options/FL001/bookings", Some("guest-alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, option) = send(&app, Method::GET, "/v1/travel-options/FL001", None, None).await;
    assert_eq!(option["available_seats"], 5);
}

#[tokio::test]
async fn test_malformed_seat_counts_are_validation_errors() {
    let app = test_app().await;

    for seats in [json!(-1), json!(2.5), json!("two")] {
        let body = json!({
            "number_of_seats": seats,
            "passenger_names": ["Ann"],
            "contact_phone": "+15550100",
        });
        let (status, body) = send(&app, Method::POST, "/v1/travel-options/FL001/bookings", Some("guest-alice"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "seats = {seats}");
        assert_eq!(body["code"], "validation_error");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/travel-options/FL001/bookings")
        .header(header::AUTHORIZATION, bearer("guest-alice"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, option) = send(&app, Method::GET, "/v1/travel-options/FL001", None, None).await;
    assert_eq!(option["available_seats"], 5);
}

#[tokio::test]
async fn test_departure_day_booking_cannot_be_cancelled() {
    let app = test_app().await;

    // FL002 leaves today: still bookable, no longer cancellable
    let (status, booking) = send(
        &app, Method::POST, "/v1/travel-options/FL002/bookings", Some("guest-alice"),
        Some(booking_body(&["Alice"])),
    ).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/v1/bookings/{}/cancel", booking["booking_id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &uri, Some("guest-alice"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "not_cancellable");
}
