use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use kairos_booking::{Booking, BookingHistoryEntry, BookingStatus, CancelledBy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub hold_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
    pub cancelled_by: CancelledBy,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleBookingRequest {
    pub new_start_time: NaiveDateTime,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
    pub previous_booking_id: Option<Uuid>,
    pub rescheduled_to: Option<Uuid>,
    pub history: Vec<BookingHistoryEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_fee_percent: Option<f64>,
}

impl BookingResponse {
    fn from_booking(booking: Booking) -> Self {
        Self {
            id: booking.id,
            provider_id: booking.provider_id,
            staff_id: booking.staff_id,
            service_id: booking.service_id,
            customer_id: booking.customer_id,
            start_time: booking.range.start,
            end_time: booking.range.end,
            status: booking.status,
            previous_booking_id: booking.previous_booking_id,
            rescheduled_to: booking.rescheduled_to,
            history: booking.history,
            version: booking.version,
            created_at: booking.created_at,
            cancellation_fee_percent: None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/confirm", post(confirm_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/reschedule", post(reschedule_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
        .route("/v1/bookings/{id}/no-show", post(mark_no_show))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    let booking = state.engine.request_booking(req.hold_id, now).await?;
    tracing::info!(booking_id = %booking.id, "booking created from hold");
    Ok(Json(BookingResponse::from_booking(booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.engine.get_booking(id).await?;
    Ok(Json(BookingResponse::from_booking(booking)))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    let booking = state.engine.confirm(id, now).await?;
    Ok(Json(BookingResponse::from_booking(booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    let (booking, outcome) = state
        .engine
        .cancel(id, &req.reason, req.cancelled_by, now)
        .await?;

    let mut response = BookingResponse::from_booking(booking);
    response.cancellation_fee_percent = outcome.fee_percent;
    Ok(Json(response))
}

async fn reschedule_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    if req.new_start_time < now {
        return Err(AppError::ValidationError("new start time is in the past".to_string()));
    }
    let booking = state
        .engine
        .reschedule(id, req.new_start_time, &req.reason, now)
        .await?;
    Ok(Json(BookingResponse::from_booking(booking)))
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    let booking = state.engine.complete(id, now).await?;
    Ok(Json(BookingResponse::from_booking(booking)))
}

async fn mark_no_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = Local::now().naive_local();
    let booking = state.engine.mark_no_show(id, now).await?;
    Ok(Json(BookingResponse::from_booking(booking)))
}
