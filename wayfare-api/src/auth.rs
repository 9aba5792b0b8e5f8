use axum::{
    extract::State,
    Json,
    routing::post,
    Router,
};
use serde::Serialize;
use uuid::Uuid;
use crate::{state::AppState, error::AppError, middleware::auth::issue_token};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let user_id = format!("guest-{}", Uuid::new_v4());

    let token = issue_token(&state.auth, &user_id)?;

    Ok(Json(AuthResponse { token, user_id }))
}
