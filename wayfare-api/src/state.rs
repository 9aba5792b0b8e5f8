use std::sync::Arc;
use wayfare_core::BookingService;
use wayfare_store::app_config::RateLimitConfig;
use wayfare_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    /// Rate limiting is skipped without Redis
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}
