use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use wayfare_core::CreateBooking;
use wayfare_shared::pii::Masked;
use wayfare_shared::{Booking, BookingStatus};

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, CustomerClaims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub number_of_seats: i64,
    pub passenger_names: Vec<String>,
    pub contact_phone: Masked<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub booking_id: String,
    pub cancelled: bool,
    pub status: BookingStatus,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/travel-options/{travel_id}/bookings", post(create_booking))
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/travel-options/{travel_id}/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(travel_id): Path<String>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(req) = payload?;
    info!("Booking request from {}: {} seats on {}", claims.sub, req.number_of_seats, travel_id);

    let booking = state.bookings.create_booking(CreateBooking {
        user_id: claims.sub,
        travel_id,
        number_of_seats: req.number_of_seats,
        passenger_names: req.passenger_names,
        contact_phone: req.contact_phone,
    }).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings?status=confirmed|cancelled
/// Unknown status values are ignored, as if no filter was given
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query.status.as_deref().and_then(|s| s.parse::<BookingStatus>().ok());
    let bookings = state.bookings.list_bookings(&claims.sub, status).await?;
    Ok(Json(bookings))
}

/// GET /v1/bookings/{booking_id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.get_booking(&booking_id, &claims.sub).await?;
    Ok(Json(booking))
}

/// POST /v1/bookings/{booking_id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<String>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let cancelled = state.bookings.cancel_booking(&booking_id, &claims.sub).await?;
    Ok(Json(CancelBookingResponse { booking_id, cancelled, status: BookingStatus::Cancelled }))
}
