use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use kairos_core::EngineError;
use kairos_shared::TimeRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate appointment interval, computed on demand and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_available: bool,
    pub staff_id: Option<Uuid>,
}

/// Answer to a point query for one exact start time.
#[derive(Debug, Clone, Serialize)]
pub struct SlotCheck {
    pub start_time: NaiveDateTime,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub has_availability: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldState {
    Active,
    Expired,
    Consumed,
    Released,
}

/// Short-lived exclusive reservation on a slot pending booking confirmation.
/// Owned exclusively by the arbiter; other components only ever see clones.
#[derive(Debug, Clone, Serialize)]
pub struct SlotHold {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_id: Uuid,
    pub range: TimeRange,
    pub holder_id: Uuid,
    pub state: HoldState,
    pub expires_at: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

impl SlotHold {
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        self.state == HoldState::Active && now <= self.expires_at
    }
}

/// Why an acquisition attempt lost. Losers get a typed rejection, never a
/// retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HoldRejection {
    #[error("interval is already held")]
    AlreadyHeld,

    #[error("interval is already booked")]
    AlreadyBooked,

    #[error("interval falls outside the provider's open hours")]
    OutsideSchedule,
}

#[derive(Debug, thiserror::Error)]
pub enum HoldError {
    #[error(transparent)]
    Rejected(#[from] HoldRejection),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<HoldError> for EngineError {
    fn from(err: HoldError) -> Self {
        match err {
            HoldError::Rejected(HoldRejection::OutsideSchedule) => {
                EngineError::Validation(HoldRejection::OutsideSchedule.to_string())
            }
            HoldError::Rejected(reason) => EngineError::Conflict(reason.to_string()),
            HoldError::Engine(e) => e,
        }
    }
}
