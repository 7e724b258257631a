use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SlotHeldEvent {
    pub hold_id: Uuid,
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub holder_id: Uuid,
    pub expires_at: NaiveDateTime,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingRequestedEvent {
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: NaiveDateTime,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: NaiveDateTime,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub cancelled_by: String,
    pub reason: String,
    /// Fee percentage owed to the payment collaborator, when the
    /// cancellation landed inside the policy window.
    pub fee_percent: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingRescheduledEvent {
    pub old_booking_id: Uuid,
    pub new_booking_id: Uuid,
    pub provider_id: Uuid,
    pub new_start_time: NaiveDateTime,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingCompletedEvent {
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingNoShowEvent {
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub timestamp: i64,
}

/// Envelope handed to the injected publisher. Side effects (notifications,
/// payment capture) live behind that seam, outside the engine.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    SlotHeld(SlotHeldEvent),
    BookingRequested(BookingRequestedEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingCancelled(BookingCancelledEvent),
    BookingRescheduled(BookingRescheduledEvent),
    BookingCompleted(BookingCompletedEvent),
    BookingNoShow(BookingNoShowEvent),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SlotHeld(_) => "slot_held",
            DomainEvent::BookingRequested(_) => "booking_requested",
            DomainEvent::BookingConfirmed(_) => "booking_confirmed",
            DomainEvent::BookingCancelled(_) => "booking_cancelled",
            DomainEvent::BookingRescheduled(_) => "booking_rescheduled",
            DomainEvent::BookingCompleted(_) => "booking_completed",
            DomainEvent::BookingNoShow(_) => "booking_no_show",
        }
    }
}
