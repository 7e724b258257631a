use crate::error::EngineError;
use async_trait::async_trait;
use kairos_shared::DomainEvent;
use std::sync::Mutex;

/// Seam for decoupled side effects. The engine hands fully-formed payloads
/// to whatever transport the host application injects.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), EngineError>;
}

/// Publisher that buffers events in memory so callers can assert on them.
#[derive(Default)]
pub struct CollectingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything published so far.
    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl EventPublisher for CollectingPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EngineError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
