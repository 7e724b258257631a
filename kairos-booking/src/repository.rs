use crate::models::Booking;
use async_trait::async_trait;
use kairos_core::EngineError;
use kairos_shared::TimeRange;
use uuid::Uuid;

/// Storage seam for booking records.
///
/// `update` follows the compare-and-increment contract: the write is
/// accepted only when the submitted version matches the stored one, and the
/// stored version is incremented on success. Callers receive the stored
/// (bumped) copy back.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking, EngineError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, EngineError>;

    async fn update(&self, booking: Booking) -> Result<Booking, EngineError>;

    /// All bookings for a provider whose range overlaps `range`, ordered by
    /// start time. Status filtering is the caller's concern.
    async fn list_in_range(
        &self,
        provider_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Booking>, EngineError>;
}
