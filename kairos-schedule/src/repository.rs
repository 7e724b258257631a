use crate::models::{ProviderSchedule, Service, StaffMember};
use async_trait::async_trait;
use kairos_core::EngineError;
use uuid::Uuid;

/// Read access to provider schedule data. The engine only consumes this
/// state; registration and CRUD live with the host application.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get_schedule(&self, provider_id: Uuid) -> Result<Option<ProviderSchedule>, EngineError>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, EngineError>;

    async fn list_staff(&self, provider_id: Uuid) -> Result<Vec<StaffMember>, EngineError>;
}
