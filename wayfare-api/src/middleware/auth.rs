use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::StatusCode,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

pub const CUSTOMER_ROLE: &str = "CUSTOMER";

// ============================================================================
// JWT Claims
// ============================================================================

/// `sub` is the user id every booking operation runs as
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// `exp` claim for a token issued at `now`; `None` when it does not fit
fn token_expiry(now: DateTime<Utc>, ttl_seconds: u64) -> Option<usize> {
    let ttl = i64::try_from(ttl_seconds).ok().and_then(Duration::try_seconds)?;
    let exp = now.checked_add_signed(ttl)?.timestamp();
    usize::try_from(exp).ok()
}

pub fn issue_token(auth: &AuthConfig, user_id: &str) -> Result<String, AppError> {
    let exp = token_expiry(Utc::now(), auth.expiration).ok_or_else(|| {
        AppError::InternalServerError(format!("JWT expiration of {}s is out of range", auth.expiration))
    })?;

    let claims = CustomerClaims {
        sub: user_id.to_string(),
        role: CUSTOMER_ROLE.to_owned(),
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let token = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<CustomerClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Check role
    if token_data.claims.role != CUSTOMER_ROLE {
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
