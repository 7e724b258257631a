use async_trait::async_trait;
use kairos_core::{EngineError, EventPublisher};
use kairos_shared::DomainEvent;

/// Publisher that writes events to the log. Hosts wanting a broker swap
/// this for their own `EventPublisher` implementation.
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EngineError> {
        let payload =
            serde_json::to_string(&event).map_err(|e| EngineError::Internal(e.to_string()))?;
        tracing::info!(event = event.name(), %payload, "domain event");
        Ok(())
    }
}
