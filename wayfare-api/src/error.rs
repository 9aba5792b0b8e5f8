use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::{BookingError, UnavailableError};

#[derive(Debug)]
pub enum AppError {
    Booking(BookingError),
    /// Request body that could not be read as the expected JSON
    InvalidBody(JsonRejection),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Booking(err) => booking_error_body(err),
            AppError::InvalidBody(rejection) => invalid_body(rejection),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "code": "internal" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn invalid_body(rejection: JsonRejection) -> (StatusCode, serde_json::Value) {
    let status = match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
        _ => rejection.status(),
    };
    (status, json!({ "error": rejection.body_text(), "code": "validation_error" }))
}

fn booking_error_body(err: BookingError) -> (StatusCode, serde_json::Value) {
    let message = err.to_string();
    let retryable = err.is_retryable();
    match err {
        BookingError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": message, "code": "validation_error" }),
        ),
        BookingError::Unavailable(UnavailableError::Departed { .. }) => (
            StatusCode::CONFLICT,
            json!({ "error": message, "code": "departed" }),
        ),
        BookingError::Unavailable(UnavailableError::InsufficientSeats { requested, available }) => (
            StatusCode::CONFLICT,
            json!({
                "error": message,
                "code": "insufficient_seats",
                "requested_seats": requested,
                "available_seats": available,
            }),
        ),
        BookingError::AlreadyCancelled(_) => (
            StatusCode::CONFLICT,
            json!({ "error": message, "code": "already_cancelled" }),
        ),
        BookingError::NotCancellable(_) => (
            StatusCode::CONFLICT,
            json!({ "error": message, "code": "not_cancellable" }),
        ),
        BookingError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            json!({ "error": message, "code": "not_found" }),
        ),
        BookingError::Transaction(source) => {
            tracing::error!("Booking transaction failed: {}", source);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Booking could not be completed, please retry", "code": "transaction_failed", "retryable": retryable }),
            )
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection)
    }
}
