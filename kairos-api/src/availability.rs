use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use kairos_availability::{DateAvailability, Slot, SlotCheck};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub start_time: NaiveDateTime,
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DatesQuery {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub staff_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/availability/slots", get(get_slots))
        .route("/v1/availability/check", get(check_slot))
        .route("/v1/availability/dates", get(get_dates))
}

async fn get_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let now = Local::now().naive_local();
    if query.date < now.date() {
        return Err(AppError::ValidationError("date is in the past".to_string()));
    }

    let slots = state
        .projector
        .project(query.provider_id, query.service_id, query.date, query.staff_id, now)
        .await?;
    Ok(Json(slots))
}

async fn check_slot(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<SlotCheck>, AppError> {
    let now = Local::now().naive_local();
    if query.start_time < now {
        return Err(AppError::ValidationError("start time is in the past".to_string()));
    }

    let check = state
        .projector
        .is_available(
            query.provider_id,
            query.service_id,
            query.staff_id,
            query.start_time,
            now,
        )
        .await?;
    Ok(Json(check))
}

async fn get_dates(
    State(state): State<AppState>,
    Query(query): Query<DatesQuery>,
) -> Result<Json<Vec<DateAvailability>>, AppError> {
    let now = Local::now().naive_local();
    if query.from_date < now.date() {
        return Err(AppError::ValidationError("from_date is in the past".to_string()));
    }
    if query.to_date < query.from_date {
        return Err(AppError::ValidationError("to_date precedes from_date".to_string()));
    }
    let span_days = (query.to_date - query.from_date).num_days();
    if span_days > i64::from(state.business_rules.max_range_days) {
        return Err(AppError::ValidationError(format!(
            "date range exceeds {} days",
            state.business_rules.max_range_days
        )));
    }

    let days = state
        .projector
        .project_dates(
            query.provider_id,
            query.service_id,
            query.from_date,
            query.to_date,
            query.staff_id,
            now,
        )
        .await?;
    Ok(Json(days))
}
