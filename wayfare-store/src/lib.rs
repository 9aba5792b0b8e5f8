pub mod app_config;
pub mod database;
pub mod events;
pub mod pg_repo;
pub mod redis_repo;

pub use database::DbClient;
pub use events::EventProducer;
pub use pg_repo::PgBookingStore;
pub use redis_repo::RedisClient;
