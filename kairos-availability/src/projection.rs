use crate::arbiter::SlotHoldArbiter;
use crate::models::{DateAvailability, Slot, SlotCheck, SlotHold};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use kairos_booking::{Booking, BookingRepository};
use kairos_core::EngineError;
use kairos_schedule::{BookingWindow, CandidateSlots, ScheduleRepository, Service, StaffMember};
use kairos_shared::TimeRange;
use std::sync::Arc;
use uuid::Uuid;

/// Read-side projection of the availability grid.
///
/// Pure with respect to engine state: it only reads schedule and booking
/// data as of invocation time, so any number of callers may project
/// concurrently. The result is a snapshot that a winning hold can invalidate
/// a moment later.
pub struct AvailabilityProjector {
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
    arbiter: Arc<SlotHoldArbiter>,
    granularity_minutes: u32,
}

impl AvailabilityProjector {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
        arbiter: Arc<SlotHoldArbiter>,
        granularity_minutes: u32,
    ) -> Self {
        Self {
            schedules,
            bookings,
            arbiter,
            granularity_minutes,
        }
    }

    /// Candidate grid for one date, each slot marked available or not.
    pub async fn project(
        &self,
        provider_id: Uuid,
        service_id: Uuid,
        date: NaiveDate,
        staff_id: Option<Uuid>,
        now: NaiveDateTime,
    ) -> Result<Vec<Slot>, EngineError> {
        let service = self.service_for(provider_id, service_id).await?;
        let schedule = self
            .schedules
            .get_schedule(provider_id)
            .await?
            .ok_or_else(|| EngineError::not_found("provider"))?;
        let roster = self.active_roster(provider_id, staff_id).await?;

        let day = schedule.resolve(date);
        let day_range = TimeRange::new(
            date.and_hms_opt(0, 0, 0).unwrap(),
            (date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap(),
        );
        let busy = self.blocking_bookings(provider_id, day_range).await?;
        let holds = self.arbiter.active_holds(provider_id, now).await;

        let window = BookingWindow::from(&service.policy);
        let slots = CandidateSlots::new(
            &day,
            date,
            service.duration_minutes,
            self.granularity_minutes,
            window,
            now,
        )
        .map(|candidate| Slot {
            start_time: candidate.start,
            end_time: candidate.end,
            is_available: slot_free(&candidate, staff_id, &busy, &holds, &roster),
            staff_id,
        })
        .collect();

        Ok(slots)
    }

    /// Point query: is this exact start time free for the service?
    pub async fn is_available(
        &self,
        provider_id: Uuid,
        service_id: Uuid,
        staff_id: Option<Uuid>,
        start_time: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<SlotCheck, EngineError> {
        let service = self.service_for(provider_id, service_id).await?;
        let schedule = self
            .schedules
            .get_schedule(provider_id)
            .await?
            .ok_or_else(|| EngineError::not_found("provider"))?;
        let roster = self.active_roster(provider_id, staff_id).await?;

        let date = start_time.date();
        let day = schedule.resolve(date);
        let range = TimeRange::from_start(start_time, service.duration_minutes);

        if !day.is_open {
            return Ok(SlotCheck {
                start_time,
                is_available: false,
                reason: day.closure_reason.or_else(|| Some("closed".to_string())),
            });
        }
        let within_hours = match (day.open_time, day.close_time) {
            (Some(open), Some(close)) => {
                range.start >= date.and_time(open) && range.end <= date.and_time(close)
            }
            _ => false,
        };
        let in_break = day.breaks.iter().any(|b| {
            range.overlaps(&TimeRange::new(date.and_time(b.start), date.and_time(b.end)))
        });
        if !within_hours || in_break {
            return Ok(SlotCheck {
                start_time,
                is_available: false,
                reason: Some("outside open hours".to_string()),
            });
        }

        let busy = self.blocking_bookings(provider_id, range).await?;
        let holds = self.arbiter.active_holds(provider_id, now).await;
        let free = slot_free(&range, staff_id, &busy, &holds, &roster);

        Ok(SlotCheck {
            start_time,
            is_available: free,
            reason: if free { None } else { Some("slot is taken".to_string()) },
        })
    }

    /// Per-date availability over an inclusive date range. Bookings are
    /// fetched once for the whole span, not per day.
    pub async fn project_dates(
        &self,
        provider_id: Uuid,
        service_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        staff_id: Option<Uuid>,
        now: NaiveDateTime,
    ) -> Result<Vec<DateAvailability>, EngineError> {
        let service = self.service_for(provider_id, service_id).await?;
        let schedule = self
            .schedules
            .get_schedule(provider_id)
            .await?
            .ok_or_else(|| EngineError::not_found("provider"))?;
        let roster = self.active_roster(provider_id, staff_id).await?;

        let span = TimeRange::new(
            from.and_hms_opt(0, 0, 0).unwrap(),
            (to + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap(),
        );
        let busy = self.blocking_bookings(provider_id, span).await?;
        let holds = self.arbiter.active_holds(provider_id, now).await;
        let window = BookingWindow::from(&service.policy);

        let mut out = Vec::new();
        let mut date = from;
        while date <= to {
            let day = schedule.resolve(date);
            let has_availability = CandidateSlots::new(
                &day,
                date,
                service.duration_minutes,
                self.granularity_minutes,
                window,
                now,
            )
            .any(|candidate| slot_free(&candidate, staff_id, &busy, &holds, &roster));

            out.push(DateAvailability { date, has_availability });
            date = date + Duration::days(1);
        }
        Ok(out)
    }

    async fn service_for(&self, provider_id: Uuid, service_id: Uuid) -> Result<Service, EngineError> {
        let service = self
            .schedules
            .get_service(service_id)
            .await?
            .filter(|s| s.provider_id == provider_id && s.is_active)
            .ok_or_else(|| EngineError::not_found("service"))?;
        Ok(service)
    }

    async fn active_roster(
        &self,
        provider_id: Uuid,
        staff_id: Option<Uuid>,
    ) -> Result<Vec<StaffMember>, EngineError> {
        let roster: Vec<StaffMember> = self
            .schedules
            .list_staff(provider_id)
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect();
        if let Some(id) = staff_id {
            if !roster.iter().any(|s| s.id == id) {
                return Err(EngineError::not_found("staff member"));
            }
        }
        Ok(roster)
    }

    async fn blocking_bookings(
        &self,
        provider_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Booking>, EngineError> {
        let mut bookings = self.bookings.list_in_range(provider_id, range).await?;
        bookings.retain(|b| b.blocks_slot());
        Ok(bookings)
    }
}

/// Availability rule for one candidate interval.
///
/// With a staff filter, the slot is free when nothing blocks that staff
/// member (claims with no staff block everyone). Without one, the slot is
/// free when at least one rostered staff member is free for the whole
/// interval; a provider with no roster is a single implicit resource.
fn slot_free(
    candidate: &TimeRange,
    staff_id: Option<Uuid>,
    busy: &[Booking],
    holds: &[SlotHold],
    roster: &[StaffMember],
) -> bool {
    let taken_for = |resource: Option<Uuid>| {
        busy.iter().any(|b| conflicts(b.staff_id, &b.range, resource, candidate))
            || holds.iter().any(|h| conflicts(h.staff_id, &h.range, resource, candidate))
    };

    match staff_id {
        Some(id) => !taken_for(Some(id)),
        None if roster.is_empty() => !taken_for(None),
        None => roster.iter().any(|s| !taken_for(Some(s.id))),
    }
}

fn conflicts(
    held_staff: Option<Uuid>,
    held_range: &TimeRange,
    resource: Option<Uuid>,
    candidate: &TimeRange,
) -> bool {
    if !held_range.overlaps(candidate) {
        return false;
    }
    match (held_staff, resource) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b,
    }
}
