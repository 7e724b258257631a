use crate::models::{Booking, BookingHistoryEntry, BookingStatus};
use chrono::{Duration, NaiveDateTime, Utc};
use kairos_shared::TimeRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    Customer,
    Provider,
}

impl std::fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelledBy::Customer => write!(f, "customer"),
            CancelledBy::Provider => write!(f, "provider"),
        }
    }
}

/// What a cancellation owes the payment collaborator. The fee is surfaced,
/// never charged here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CancellationOutcome {
    pub fee_percent: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("booking start time has already passed")]
    StartPassed,

    #[error("booking has not started yet")]
    NotStarted,

    #[error("booking has not ended yet")]
    NotEnded,

    #[error("rescheduling is not allowed by the booking policy")]
    ReschedulingDisabled,

    #[error("inside the reschedule window of {hours}h before start")]
    InsideRescheduleWindow { hours: u32 },
}

impl From<TransitionError> for kairos_core::EngineError {
    fn from(err: TransitionError) -> Self {
        kairos_core::EngineError::Conflict(err.to_string())
    }
}

/// Legal transitions:
///
/// ```text
/// Requested -> Confirmed | Cancelled
/// Confirmed -> Completed | Cancelled | NoShow | Rescheduled
/// ```
///
/// Completed, Cancelled, NoShow and Rescheduled are terminal. Guards are
/// pure functions of the booking and `now`, so they stay correct when a
/// transition is re-evaluated after an optimistic-concurrency retry.
impl Booking {
    pub fn confirm(&mut self, _now: NaiveDateTime) -> Result<(), TransitionError> {
        self.require(&[BookingStatus::Requested], BookingStatus::Confirmed)?;
        self.record(BookingStatus::Confirmed, "Booking confirmed");
        Ok(())
    }

    /// Cancel from Requested or Confirmed. Cancelling after the start time
    /// is rejected; cancelling a Confirmed booking inside the policy window
    /// surfaces the cancellation fee.
    pub fn cancel(
        &mut self,
        now: NaiveDateTime,
        reason: &str,
        by: CancelledBy,
    ) -> Result<CancellationOutcome, TransitionError> {
        self.require(
            &[BookingStatus::Requested, BookingStatus::Confirmed],
            BookingStatus::Cancelled,
        )?;
        if now >= self.range.start {
            return Err(TransitionError::StartPassed);
        }

        let window = Duration::hours(i64::from(self.policy.cancellation_window_hours));
        let fee_percent = if self.status == BookingStatus::Confirmed
            && self.range.start - now < window
        {
            Some(self.policy.cancellation_fee_percent)
        } else {
            None
        };

        self.record(
            BookingStatus::Cancelled,
            format!("Cancelled by {by}: {reason}"),
        );
        Ok(CancellationOutcome { fee_percent })
    }

    pub fn complete(&mut self, now: NaiveDateTime) -> Result<(), TransitionError> {
        self.require(&[BookingStatus::Confirmed], BookingStatus::Completed)?;
        if now < self.range.end {
            return Err(TransitionError::NotEnded);
        }
        self.record(BookingStatus::Completed, "Appointment completed");
        Ok(())
    }

    pub fn mark_no_show(&mut self, now: NaiveDateTime) -> Result<(), TransitionError> {
        self.require(&[BookingStatus::Confirmed], BookingStatus::NoShow)?;
        if now < self.range.start {
            return Err(TransitionError::NotStarted);
        }
        self.record(BookingStatus::NoShow, "Customer did not appear");
        Ok(())
    }

    /// Guard checks for a reschedule, split out so callers can verify before
    /// claiming the new slot.
    pub fn check_reschedule(&self, now: NaiveDateTime) -> Result<(), TransitionError> {
        self.require(
            &[BookingStatus::Requested, BookingStatus::Confirmed],
            BookingStatus::Rescheduled,
        )?;
        if !self.policy.allow_rescheduling {
            return Err(TransitionError::ReschedulingDisabled);
        }
        let hours = self.policy.reschedule_window_hours;
        // The window is measured against the original start time
        if self.range.start - now < Duration::hours(i64::from(hours)) {
            return Err(TransitionError::InsideRescheduleWindow { hours });
        }
        Ok(())
    }

    /// Move this booking to `Rescheduled` and return its replacement.
    ///
    /// The replacement keeps the staff, service, customer, policy snapshot
    /// and current status of the original; the two records are linked via
    /// `previous_booking_id` / `rescheduled_to`. The original is never
    /// mutated into the new time.
    pub fn reschedule_into(
        &mut self,
        new_start: NaiveDateTime,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<Booking, TransitionError> {
        self.check_reschedule(now)?;

        let duration_minutes = self.range.duration_minutes() as u32;
        let created = Utc::now();
        let replacement = Booking {
            id: Uuid::new_v4(),
            provider_id: self.provider_id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            customer_id: self.customer_id,
            range: TimeRange::from_start(new_start, duration_minutes),
            status: self.status,
            policy: self.policy.clone(),
            previous_booking_id: Some(self.id),
            rescheduled_to: None,
            history: vec![BookingHistoryEntry::new(
                self.status,
                format!("Rescheduled from booking {}", self.id),
            )],
            version: 1,
            created_at: created,
            updated_at: created,
        };

        self.rescheduled_to = Some(replacement.id);
        self.record(
            BookingStatus::Rescheduled,
            format!("Rescheduled to booking {}: {reason}", replacement.id),
        );
        Ok(replacement)
    }

    fn require(
        &self,
        allowed: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from: self.status, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairos_schedule::BookingPolicy;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn booking(policy: BookingPolicy) -> Booking {
        Booking::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            Uuid::new_v4(),
            TimeRange::new(at(10, 10), at(10, 11)),
            policy,
        )
    }

    #[test]
    fn test_happy_path_to_completed() {
        let mut b = booking(BookingPolicy::default());

        b.confirm(at(2, 9)).unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);

        b.complete(at(10, 12)).unwrap();
        assert_eq!(b.status, BookingStatus::Completed);

        // Requested -> Confirmed -> Completed, one entry per transition
        assert_eq!(b.history.len(), 3);
    }

    #[test]
    fn test_confirm_rejected_twice() {
        let mut b = booking(BookingPolicy::default());
        b.confirm(at(2, 9)).unwrap();

        assert!(matches!(
            b.confirm(at(2, 10)),
            Err(TransitionError::InvalidTransition { from: BookingStatus::Confirmed, .. })
        ));
    }

    #[test]
    fn test_cancel_from_requested_has_no_fee() {
        let mut b = booking(BookingPolicy {
            cancellation_window_hours: 24,
            cancellation_fee_percent: 50.0,
            ..BookingPolicy::default()
        });

        // Well inside the window, but the booking was never confirmed
        let outcome = b.cancel(at(10, 9), "changed plans", CancelledBy::Customer).unwrap();
        assert_eq!(outcome.fee_percent, None);
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_inside_window_surfaces_fee() {
        let mut b = booking(BookingPolicy {
            cancellation_window_hours: 24,
            cancellation_fee_percent: 50.0,
            ..BookingPolicy::default()
        });
        b.confirm(at(2, 9)).unwrap();

        let outcome = b.cancel(at(10, 9), "overslept", CancelledBy::Customer).unwrap();
        assert_eq!(outcome.fee_percent, Some(50.0));
    }

    #[test]
    fn test_cancel_outside_window_is_free() {
        let mut b = booking(BookingPolicy {
            cancellation_window_hours: 24,
            cancellation_fee_percent: 50.0,
            ..BookingPolicy::default()
        });
        b.confirm(at(2, 9)).unwrap();

        let outcome = b.cancel(at(2, 10), "moving away", CancelledBy::Customer).unwrap();
        assert_eq!(outcome.fee_percent, None);
    }

    #[test]
    fn test_cancel_after_start_rejected() {
        let mut b = booking(BookingPolicy::default());
        b.confirm(at(2, 9)).unwrap();

        assert!(matches!(
            b.cancel(at(10, 10), "too late", CancelledBy::Customer),
            Err(TransitionError::StartPassed)
        ));
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_cancel_rejected_when_already_cancelled() {
        let mut b = booking(BookingPolicy::default());
        b.cancel(at(2, 9), "first", CancelledBy::Provider).unwrap();

        assert!(matches!(
            b.cancel(at(2, 10), "second", CancelledBy::Provider),
            Err(TransitionError::InvalidTransition { from: BookingStatus::Cancelled, .. })
        ));
    }

    #[test]
    fn test_complete_requires_end_reached() {
        let mut b = booking(BookingPolicy::default());
        b.confirm(at(2, 9)).unwrap();

        assert!(matches!(b.complete(at(10, 10)), Err(TransitionError::NotEnded)));
        assert!(b.complete(at(10, 11)).is_ok());
    }

    #[test]
    fn test_no_show_requires_start_reached() {
        let mut b = booking(BookingPolicy::default());
        b.confirm(at(2, 9)).unwrap();

        assert!(matches!(b.mark_no_show(at(10, 9)), Err(TransitionError::NotStarted)));
        assert!(b.mark_no_show(at(10, 10)).is_ok());
    }

    #[test]
    fn test_reschedule_links_old_and_new() {
        let mut b = booking(BookingPolicy {
            reschedule_window_hours: 24,
            ..BookingPolicy::default()
        });
        b.confirm(at(2, 9)).unwrap();

        let replacement = b.reschedule_into(at(12, 14), "conflict", at(2, 10)).unwrap();

        assert_eq!(b.status, BookingStatus::Rescheduled);
        assert_eq!(b.rescheduled_to, Some(replacement.id));
        assert_eq!(replacement.previous_booking_id, Some(b.id));
        assert_eq!(replacement.status, BookingStatus::Confirmed);
        assert_eq!(replacement.range, TimeRange::new(at(12, 14), at(12, 15)));
        assert_eq!(replacement.policy, b.policy);
    }

    #[test]
    fn test_reschedule_inside_window_rejected() {
        let mut b = booking(BookingPolicy {
            reschedule_window_hours: 48,
            ..BookingPolicy::default()
        });
        b.confirm(at(2, 9)).unwrap();

        // 25 hours before start, window is 48
        assert!(matches!(
            b.reschedule_into(at(12, 14), "too close", at(9, 9)),
            Err(TransitionError::InsideRescheduleWindow { hours: 48 })
        ));
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.rescheduled_to, None);
    }

    #[test]
    fn test_reschedule_disabled_by_policy() {
        let mut b = booking(BookingPolicy {
            allow_rescheduling: false,
            ..BookingPolicy::default()
        });
        b.confirm(at(2, 9)).unwrap();

        assert!(matches!(
            b.reschedule_into(at(12, 14), "nope", at(2, 10)),
            Err(TransitionError::ReschedulingDisabled)
        ));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut b = booking(BookingPolicy::default());
        b.confirm(at(2, 9)).unwrap();
        b.complete(at(10, 12)).unwrap();

        assert!(b.confirm(at(10, 13)).is_err());
        assert!(b.cancel(at(10, 13), "x", CancelledBy::Provider).is_err());
        assert!(b.mark_no_show(at(10, 13)).is_err());
        assert!(b.check_reschedule(at(10, 13)).is_err());
    }
}
