use crate::arbiter::{HoldRequest, SlotHoldArbiter};
use crate::models::{HoldError, SlotHold};
use crate::projection::AvailabilityProjector;
use chrono::{NaiveDateTime, Utc};
use kairos_booking::{Booking, BookingRepository, CancellationOutcome, CancelledBy};
use kairos_core::{EngineError, EventPublisher};
use kairos_schedule::ScheduleRepository;
use kairos_shared::events::*;
use kairos_shared::{DomainEvent, TimeRange};
use std::sync::Arc;
use uuid::Uuid;

/// Front door of the scheduling engine: composes the projector, the hold
/// arbiter and the booking lifecycle so the HTTP layer stays thin.
///
/// Consuming a hold is the only path that creates a booking row; every
/// booking mutation goes through the repository's compare-and-increment
/// version check.
pub struct SchedulingEngine {
    schedules: Arc<dyn ScheduleRepository>,
    bookings: Arc<dyn BookingRepository>,
    arbiter: Arc<SlotHoldArbiter>,
    projector: Arc<AvailabilityProjector>,
    publisher: Arc<dyn EventPublisher>,
}

impl SchedulingEngine {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        bookings: Arc<dyn BookingRepository>,
        arbiter: Arc<SlotHoldArbiter>,
        projector: Arc<AvailabilityProjector>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            schedules,
            bookings,
            arbiter,
            projector,
            publisher,
        }
    }

    pub fn projector(&self) -> &AvailabilityProjector {
        &self.projector
    }

    /// Begin checkout: claim the slot for the customer.
    pub async fn place_hold(
        &self,
        provider_id: Uuid,
        service_id: Uuid,
        staff_id: Option<Uuid>,
        start_time: NaiveDateTime,
        holder_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<SlotHold, HoldError> {
        let service = self
            .schedules
            .get_service(service_id)
            .await?
            .filter(|s| s.provider_id == provider_id && s.is_active)
            .ok_or_else(|| EngineError::not_found("service"))?;

        let range = TimeRange::from_start(start_time, service.duration_minutes);
        let hold = self
            .arbiter
            .try_acquire(
                HoldRequest {
                    provider_id,
                    staff_id,
                    service_id,
                    range,
                    holder_id,
                },
                now,
            )
            .await?;

        self.emit(DomainEvent::SlotHeld(SlotHeldEvent {
            hold_id: hold.id,
            provider_id,
            staff_id,
            start_time: range.start,
            end_time: range.end,
            holder_id,
            expires_at: hold.expires_at,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(hold)
    }

    pub async fn release_hold(&self, hold_id: Uuid) -> Result<(), EngineError> {
        self.arbiter.release(hold_id).await
    }

    /// Consume a hold into a Requested booking with the service's policy
    /// snapshotted onto it.
    pub async fn request_booking(
        &self,
        hold_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Booking, EngineError> {
        let hold = self.arbiter.consume(hold_id, now).await?;
        let service = self
            .schedules
            .get_service(hold.service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("service"))?;

        let booking = Booking::new(
            hold.provider_id,
            hold.staff_id,
            hold.service_id,
            hold.holder_id,
            hold.range,
            service.policy.clone(),
        );
        let booking = self.bookings.create(booking).await?;
        tracing::info!(booking_id = %booking.id, provider_id = %booking.provider_id, "booking requested");

        self.emit(DomainEvent::BookingRequested(BookingRequestedEvent {
            booking_id: booking.id,
            provider_id: booking.provider_id,
            customer_id: booking.customer_id,
            start_time: booking.range.start,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(booking)
    }

    pub async fn confirm(&self, booking_id: Uuid, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let mut booking = self.get(booking_id).await?;
        booking.confirm(now)?;
        let booking = self.bookings.update(booking).await?;

        self.emit(DomainEvent::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id,
            provider_id: booking.provider_id,
            start_time: booking.range.start,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(booking)
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: &str,
        by: CancelledBy,
        now: NaiveDateTime,
    ) -> Result<(Booking, CancellationOutcome), EngineError> {
        let mut booking = self.get(booking_id).await?;
        let outcome = booking.cancel(now, reason, by)?;
        let booking = self.bookings.update(booking).await?;

        self.emit(DomainEvent::BookingCancelled(BookingCancelledEvent {
            booking_id: booking.id,
            provider_id: booking.provider_id,
            cancelled_by: by.to_string(),
            reason: reason.to_string(),
            fee_percent: outcome.fee_percent,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok((booking, outcome))
    }

    /// Move a booking to a new start time.
    ///
    /// The new interval is claimed through the arbiter like any other
    /// booking, so two concurrent reschedules aiming at one slot cannot both
    /// win. The contended original is updated before the replacement is
    /// created; a lost version race surfaces as a conflict with the new slot
    /// released again.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        new_start: NaiveDateTime,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<Booking, EngineError> {
        let mut booking = self.get(booking_id).await?;
        booking.check_reschedule(now)?;

        let hold = self
            .place_hold(
                booking.provider_id,
                booking.service_id,
                booking.staff_id,
                new_start,
                booking.customer_id,
                now,
            )
            .await
            .map_err(EngineError::from)?;

        let replacement = match booking.reschedule_into(new_start, reason, now) {
            Ok(replacement) => replacement,
            Err(e) => {
                let _ = self.arbiter.release(hold.id).await;
                return Err(e.into());
            }
        };
        if let Err(e) = self.bookings.update(booking).await {
            let _ = self.arbiter.release(hold.id).await;
            return Err(e);
        }

        self.arbiter.consume(hold.id, now).await?;
        let replacement = self.bookings.create(replacement).await?;
        tracing::info!(
            old_booking_id = %booking_id,
            new_booking_id = %replacement.id,
            "booking rescheduled"
        );

        self.emit(DomainEvent::BookingRescheduled(BookingRescheduledEvent {
            old_booking_id: booking_id,
            new_booking_id: replacement.id,
            provider_id: replacement.provider_id,
            new_start_time: replacement.range.start,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(replacement)
    }

    pub async fn complete(&self, booking_id: Uuid, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let mut booking = self.get(booking_id).await?;
        booking.complete(now)?;
        let booking = self.bookings.update(booking).await?;

        self.emit(DomainEvent::BookingCompleted(BookingCompletedEvent {
            booking_id: booking.id,
            provider_id: booking.provider_id,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(booking)
    }

    pub async fn mark_no_show(&self, booking_id: Uuid, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let mut booking = self.get(booking_id).await?;
        booking.mark_no_show(now)?;
        let booking = self.bookings.update(booking).await?;

        self.emit(DomainEvent::BookingNoShow(BookingNoShowEvent {
            booking_id: booking.id,
            provider_id: booking.provider_id,
            timestamp: Utc::now().timestamp(),
        }))
        .await;
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, EngineError> {
        self.get(booking_id).await
    }

    async fn get(&self, booking_id: Uuid) -> Result<Booking, EngineError> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found("booking"))
    }

    async fn emit(&self, event: DomainEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(error = %e, "failed to publish domain event");
        }
    }
}
