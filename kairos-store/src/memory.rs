use async_trait::async_trait;
use chrono::NaiveDateTime;
use kairos_booking::{Booking, BookingRepository};
use kairos_core::{version, EngineError, Versioned};
use kairos_schedule::{ProviderSchedule, ScheduleRepository, Service, StaffMember};
use kairos_shared::TimeRange;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed schedule store. Providers, services and staff are flat value
/// records looked up through provider-keyed indices, not an entity graph.
#[derive(Default)]
pub struct InMemoryScheduleRepository {
    inner: RwLock<ScheduleData>,
}

#[derive(Default)]
struct ScheduleData {
    schedules: HashMap<Uuid, ProviderSchedule>,
    services: HashMap<Uuid, Service>,
    staff: HashMap<Uuid, Vec<StaffMember>>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a provider's schedule, rejecting inconsistent data up front.
    pub async fn upsert_schedule(&self, schedule: ProviderSchedule) -> Result<(), EngineError> {
        schedule.validate()?;
        let mut data = self.inner.write().await;
        data.schedules.insert(schedule.provider_id, schedule);
        Ok(())
    }

    pub async fn upsert_service(&self, service: Service) {
        let mut data = self.inner.write().await;
        data.services.insert(service.id, service);
    }

    pub async fn upsert_staff(&self, member: StaffMember) {
        let mut data = self.inner.write().await;
        let roster = data.staff.entry(member.provider_id).or_default();
        match roster.iter_mut().find(|s| s.id == member.id) {
            Some(existing) => *existing = member,
            None => roster.push(member),
        }
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn get_schedule(&self, provider_id: Uuid) -> Result<Option<ProviderSchedule>, EngineError> {
        let data = self.inner.read().await;
        Ok(data.schedules.get(&provider_id).cloned())
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, EngineError> {
        let data = self.inner.read().await;
        Ok(data.services.get(&service_id).cloned())
    }

    async fn list_staff(&self, provider_id: Uuid) -> Result<Vec<StaffMember>, EngineError> {
        let data = self.inner.read().await;
        Ok(data.staff.get(&provider_id).cloned().unwrap_or_default())
    }
}

/// Map-backed booking store with a start-time index per provider, so range
/// queries walk only the relevant window instead of every booking.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    inner: RwLock<BookingData>,
}

#[derive(Default)]
struct BookingData {
    bookings: HashMap<Uuid, Booking>,
    // provider -> (start, booking id) -> booking id, kept sorted by start
    by_provider: HashMap<Uuid, BTreeMap<(NaiveDateTime, Uuid), Uuid>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking, EngineError> {
        let mut data = self.inner.write().await;
        if data.bookings.contains_key(&booking.id) {
            return Err(EngineError::Conflict(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        data.by_provider
            .entry(booking.provider_id)
            .or_default()
            .insert((booking.range.start, booking.id), booking.id);
        data.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, EngineError> {
        let data = self.inner.read().await;
        Ok(data.bookings.get(&id).cloned())
    }

    async fn update(&self, mut booking: Booking) -> Result<Booking, EngineError> {
        let mut data = self.inner.write().await;
        let stored = data
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| EngineError::not_found("booking"))?;
        version::check(booking.version(), stored.version())?;
        // The time range is immutable after creation, so the start index
        // never needs rewriting here.
        booking.set_version(stored.version() + 1);
        *stored = booking.clone();
        Ok(booking)
    }

    async fn list_in_range(
        &self,
        provider_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Booking>, EngineError> {
        let data = self.inner.read().await;
        let Some(index) = data.by_provider.get(&provider_id) else {
            return Ok(Vec::new());
        };
        // Entries starting at or after range.end cannot overlap it
        let out = index
            .range(..(range.end, Uuid::nil()))
            .filter_map(|(_, id)| data.bookings.get(id))
            .filter(|b| b.range.end > range.start)
            .cloned()
            .collect();
        Ok(out)
    }
}
