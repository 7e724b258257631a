use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_time: NaiveDateTime,
    pub holder_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct HoldResponse {
    pub hold_id: Uuid,
    pub provider_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/holds", post(create_hold))
        .route("/v1/holds/{id}", delete(release_hold))
}

async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let now = Local::now().naive_local();
    if req.start_time < now {
        return Err(AppError::ValidationError("start time is in the past".to_string()));
    }

    let hold = state
        .engine
        .place_hold(
            req.provider_id,
            req.service_id,
            req.staff_id,
            req.start_time,
            req.holder_id,
            now,
        )
        .await?;

    Ok(Json(HoldResponse {
        hold_id: hold.id,
        provider_id: hold.provider_id,
        staff_id: hold.staff_id,
        start_time: hold.range.start,
        end_time: hold.range.end,
        expires_at: hold.expires_at,
    }))
}

async fn release_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, AppError> {
    state.engine.release_hold(hold_id).await?;
    Ok(Json(ReleaseResponse { status: "RELEASED".to_string() }))
}
