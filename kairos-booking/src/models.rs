use chrono::{DateTime, Utc};
use kairos_core::Versioned;
use kairos_schedule::BookingPolicy;
use kairos_shared::TimeRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

/// Append-only audit record; entries are never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingHistoryEntry {
    pub status: BookingStatus,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl BookingHistoryEntry {
    pub fn new(status: BookingStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            description: description.into(),
        }
    }
}

/// The single source of truth for an appointment. Its time range and status
/// are what availability projection consults to mark slots occupied.
///
/// The policy is a snapshot taken at creation; later edits to the service's
/// policy never affect existing bookings. The time range is immutable after
/// creation: rescheduling links a fresh record instead of mutating this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub range: TimeRange,
    pub status: BookingStatus,
    pub policy: BookingPolicy,
    pub previous_booking_id: Option<Uuid>,
    pub rescheduled_to: Option<Uuid>,
    pub history: Vec<BookingHistoryEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        provider_id: Uuid,
        staff_id: Option<Uuid>,
        service_id: Uuid,
        customer_id: Uuid,
        range: TimeRange,
        policy: BookingPolicy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            provider_id,
            staff_id,
            service_id,
            customer_id,
            range,
            status: BookingStatus::Requested,
            policy,
            previous_booking_id: None,
            rescheduled_to: None,
            history: vec![BookingHistoryEntry::new(
                BookingStatus::Requested,
                "Booking requested",
            )],
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Does this booking occupy its slot from the projector's point of view?
    pub fn blocks_slot(&self) -> bool {
        matches!(self.status, BookingStatus::Requested | BookingStatus::Confirmed)
    }

    pub(crate) fn record(&mut self, status: BookingStatus, description: impl Into<String>) {
        self.status = status;
        self.history.push(BookingHistoryEntry::new(status, description));
        self.updated_at = Utc::now();
    }
}

impl Versioned for Booking {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
