use async_trait::async_trait;
use wayfare_shared::BookingEvent;

use crate::repository::StoreError;

/// Outbound channel for committed booking changes
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BookingEvent) -> Result<(), StoreError>;
}

/// Used when no broker is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &BookingEvent) -> Result<(), StoreError> {
        tracing::debug!("Event publishing disabled, dropping {} for {}", event.topic(), event.key());
        Ok(())
    }
}
