use crate::models::{HoldError, HoldRejection, HoldState, SlotHold};
use chrono::{Duration, NaiveDateTime, Utc};
use kairos_booking::BookingRepository;
use kairos_core::EngineError;
use kairos_schedule::ScheduleRepository;
use kairos_shared::TimeRange;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_id: Uuid,
    pub range: TimeRange,
    pub holder_id: Uuid,
}

/// Serializes slot acquisition so that exactly one of N concurrent attempts
/// for an overlapping interval wins.
///
/// The hold table sits behind a single async mutex that stays locked across
/// the whole check-then-insert sequence, including the booking-overlap query.
/// Expired holds are reclaimed lazily on every acquisition and by the
/// periodic sweep.
pub struct SlotHoldArbiter {
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
    hold_duration: Duration,
    holds: Mutex<HashMap<Uuid, SlotHold>>,
}

impl SlotHoldArbiter {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
        hold_duration: Duration,
    ) -> Self {
        Self {
            schedules,
            bookings,
            hold_duration,
            holds: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to claim an interval. Grants the hold only if, at this
    /// instant, no other active hold and no Requested/Confirmed booking
    /// overlaps it. A rejected attempt leaves no residue.
    pub async fn try_acquire(
        &self,
        req: HoldRequest,
        now: NaiveDateTime,
    ) -> Result<SlotHold, HoldError> {
        let schedule = self
            .schedules
            .get_schedule(req.provider_id)
            .await?
            .ok_or_else(|| EngineError::not_found("provider"))?;
        let day = schedule.resolve(req.range.start.date());
        if !fits_schedule(&day, &req.range) {
            return Err(HoldRejection::OutsideSchedule.into());
        }

        let mut holds = self.holds.lock().await;
        holds.retain(|_, h| h.is_active(now));

        if holds.values().any(|h| blocks(h.staff_id, &h.range, req.staff_id, &req.range, h.provider_id, req.provider_id)) {
            return Err(HoldRejection::AlreadyHeld.into());
        }

        let bookings = self
            .bookings
            .list_in_range(req.provider_id, req.range)
            .await
            .map_err(HoldError::Engine)?;
        let booked = bookings.iter().any(|b| {
            b.blocks_slot()
                && blocks(b.staff_id, &b.range, req.staff_id, &req.range, b.provider_id, req.provider_id)
        });
        if booked {
            return Err(HoldRejection::AlreadyBooked.into());
        }

        let hold = SlotHold {
            id: Uuid::new_v4(),
            provider_id: req.provider_id,
            staff_id: req.staff_id,
            service_id: req.service_id,
            range: req.range,
            holder_id: req.holder_id,
            state: HoldState::Active,
            expires_at: now + self.hold_duration,
            created_at: Utc::now(),
        };
        tracing::debug!(hold_id = %hold.id, provider_id = %req.provider_id, "slot hold acquired");
        holds.insert(hold.id, hold.clone());
        Ok(hold)
    }

    /// Consume an active hold into a booking. This is the single hand-off
    /// point between the arbiter and the booking lifecycle.
    pub async fn consume(&self, hold_id: Uuid, now: NaiveDateTime) -> Result<SlotHold, EngineError> {
        let mut holds = self.holds.lock().await;
        let mut hold = holds
            .remove(&hold_id)
            .ok_or_else(|| EngineError::not_found("hold"))?;
        if !hold.is_active(now) {
            return Err(EngineError::Conflict("hold has expired".to_string()));
        }
        hold.state = HoldState::Consumed;
        Ok(hold)
    }

    /// Explicitly give up a hold before it expires.
    pub async fn release(&self, hold_id: Uuid) -> Result<(), EngineError> {
        let mut holds = self.holds.lock().await;
        let mut hold = holds
            .remove(&hold_id)
            .ok_or_else(|| EngineError::not_found("hold"))?;
        hold.state = HoldState::Released;
        tracing::debug!(hold_id = %hold_id, "slot hold released");
        Ok(())
    }

    /// Idempotent sweep dropping holds that expired without being consumed.
    /// Returns how many were reclaimed.
    pub async fn reclaim_expired(&self, now: NaiveDateTime) -> usize {
        let mut holds = self.holds.lock().await;
        let before = holds.len();
        holds.retain(|_, h| h.is_active(now));
        before - holds.len()
    }

    /// Snapshot of the active, unexpired holds for a provider.
    pub async fn active_holds(&self, provider_id: Uuid, now: NaiveDateTime) -> Vec<SlotHold> {
        let holds = self.holds.lock().await;
        holds
            .values()
            .filter(|h| h.provider_id == provider_id && h.is_active(now))
            .cloned()
            .collect()
    }
}

/// Resource-conflict rule shared by holds and bookings: a claim with no
/// staff blocks the whole provider, a staffed claim blocks that staff and
/// any provider-wide request.
fn blocks(
    held_staff: Option<Uuid>,
    held_range: &TimeRange,
    want_staff: Option<Uuid>,
    want_range: &TimeRange,
    held_provider: Uuid,
    want_provider: Uuid,
) -> bool {
    if held_provider != want_provider || !held_range.overlaps(want_range) {
        return false;
    }
    match (held_staff, want_staff) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b,
    }
}

fn fits_schedule(day: &kairos_schedule::EffectiveDay, range: &TimeRange) -> bool {
    let (Some(open), Some(close)) = (day.open_time, day.close_time) else {
        return false;
    };
    if !day.is_open {
        return false;
    }
    let date = range.start.date();
    if range.start < date.and_time(open) || range.end > date.and_time(close) {
        return false;
    }
    !day.breaks.iter().any(|b| {
        range.overlaps(&TimeRange::new(date.and_time(b.start), date.and_time(b.end)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use kairos_booking::Booking;
    use kairos_schedule::{BookingPolicy, DaySchedule, ProviderSchedule};
    use kairos_store::{InMemoryBookingRepository, InMemoryScheduleRepository};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        // 2026-03-02 is a Monday
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    async fn setup(provider_id: Uuid) -> (Arc<SlotHoldArbiter>, Arc<InMemoryBookingRepository>) {
        let schedules = Arc::new(InMemoryScheduleRepository::new());
        let mut schedule = ProviderSchedule::new(provider_id);
        for dow in 1..=5 {
            schedule.weekly.push(DaySchedule {
                day_of_week: dow,
                is_open: true,
                open_time: Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
                close_time: Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
                breaks: vec![],
            });
        }
        schedules.upsert_schedule(schedule).await.unwrap();

        let bookings = Arc::new(InMemoryBookingRepository::new());
        let arbiter = Arc::new(SlotHoldArbiter::new(
            schedules,
            bookings.clone(),
            Duration::minutes(5),
        ));
        (arbiter, bookings)
    }

    fn request(provider_id: Uuid) -> HoldRequest {
        HoldRequest {
            provider_id,
            staff_id: None,
            service_id: Uuid::new_v4(),
            range: TimeRange::new(at(10, 0), at(11, 0)),
            holder_id: Uuid::new_v4(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_exactly_one_concurrent_acquisition_wins() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let arbiter = arbiter.clone();
            let req = request(provider_id);
            handles.push(tokio::spawn(async move {
                arbiter.try_acquire(req, at(8, 0)).await
            }));
        }

        let mut won = 0;
        let mut held = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(HoldError::Rejected(HoldRejection::AlreadyHeld)) => held += 1,
                Err(e) => panic!("unexpected rejection: {e}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(held, 15);
    }

    #[tokio::test]
    async fn test_outside_open_hours_rejected() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        let mut req = request(provider_id);
        req.range = TimeRange::new(at(16, 30), at(17, 30));

        assert!(matches!(
            arbiter.try_acquire(req, at(8, 0)).await,
            Err(HoldError::Rejected(HoldRejection::OutsideSchedule))
        ));
    }

    #[tokio::test]
    async fn test_booked_interval_rejected() {
        let provider_id = Uuid::new_v4();
        let (arbiter, bookings) = setup(provider_id).await;

        bookings
            .create(Booking::new(
                provider_id,
                None,
                Uuid::new_v4(),
                Uuid::new_v4(),
                TimeRange::new(at(10, 30), at(11, 30)),
                BookingPolicy::default(),
            ))
            .await
            .unwrap();

        assert!(matches!(
            arbiter.try_acquire(request(provider_id), at(8, 0)).await,
            Err(HoldError::Rejected(HoldRejection::AlreadyBooked))
        ));
    }

    #[tokio::test]
    async fn test_expired_hold_is_reclaimed_on_next_attempt() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        arbiter.try_acquire(request(provider_id), at(8, 0)).await.unwrap();

        // 10 minutes later the 5-minute hold is stale and the slot is free
        let hold = arbiter.try_acquire(request(provider_id), at(8, 10)).await.unwrap();
        assert_eq!(hold.state, HoldState::Active);
    }

    #[tokio::test]
    async fn test_reclaim_expired_is_idempotent() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        arbiter.try_acquire(request(provider_id), at(8, 0)).await.unwrap();

        assert_eq!(arbiter.reclaim_expired(at(8, 10)).await, 1);
        assert_eq!(arbiter.reclaim_expired(at(8, 10)).await, 0);
    }

    #[tokio::test]
    async fn test_release_frees_the_slot() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        let hold = arbiter.try_acquire(request(provider_id), at(8, 0)).await.unwrap();
        arbiter.release(hold.id).await.unwrap();

        assert!(arbiter.try_acquire(request(provider_id), at(8, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_consume_hands_off_exactly_once() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        let hold = arbiter.try_acquire(request(provider_id), at(8, 0)).await.unwrap();
        let consumed = arbiter.consume(hold.id, at(8, 1)).await.unwrap();
        assert_eq!(consumed.state, HoldState::Consumed);

        assert!(matches!(
            arbiter.consume(hold.id, at(8, 1)).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_consume_rejects_expired_hold() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;

        let hold = arbiter.try_acquire(request(provider_id), at(8, 0)).await.unwrap();

        assert!(matches!(
            arbiter.consume(hold.id, at(8, 30)).await,
            Err(EngineError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_staffed_hold_does_not_block_other_staff() {
        let provider_id = Uuid::new_v4();
        let (arbiter, _) = setup(provider_id).await;
        let staff_a = Uuid::new_v4();
        let staff_b = Uuid::new_v4();

        let mut req = request(provider_id);
        req.staff_id = Some(staff_a);
        arbiter.try_acquire(req, at(8, 0)).await.unwrap();

        let mut other = request(provider_id);
        other.staff_id = Some(staff_b);
        assert!(arbiter.try_acquire(other, at(8, 0)).await.is_ok());

        // A provider-wide attempt still collides with the staffed hold
        assert!(matches!(
            arbiter.try_acquire(request(provider_id), at(8, 0)).await,
            Err(HoldError::Rejected(HoldRejection::AlreadyHeld))
        ));
    }
}
