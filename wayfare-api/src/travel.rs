use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use wayfare_core::TravelSearch;
use wayfare_shared::TravelOption;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/travel-options", get(search_travel_options))
        .route("/v1/travel-options/{travel_id}", get(get_travel_option))
}

/// GET /v1/travel-options
/// Upcoming options with seats left, ordered by departure
async fn search_travel_options(
    State(state): State<AppState>,
    Query(search): Query<TravelSearch>,
) -> Result<Json<Vec<TravelOption>>, AppError> {
    let options = state.bookings.search_travel_options(&search.normalized()).await?;
    Ok(Json(options))
}

/// GET /v1/travel-options/{travel_id}
async fn get_travel_option(
    State(state): State<AppState>,
    Path(travel_id): Path<String>,
) -> Result<Json<TravelOption>, AppError> {
    let option = state.bookings.get_travel_option(&travel_id).await?;
    Ok(Json(option))
}
