//! Agenda semanal do médico, com semântica de substituição integral

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common_access::schedule::parse_hhmm;
use common_db::models::{Role, Weekday, WeeklySlot};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("hhmm"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlotPayload {
    pub day: Weekday,
    #[validate(custom = "validate_hhmm")]
    pub start_time: String,
    #[validate(custom = "validate_hhmm")]
    pub end_time: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleUpdateRequest {
    #[validate]
    pub slots: Vec<SlotPayload>,
}

fn authorize(principal: &Principal, doctor_id: Uuid) -> Result<(), ApiError> {
    // Agenda é recurso exclusivo do próprio médico
    if principal.role != Role::Doctor || principal.account_id != doctor_id {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }
    Ok(())
}

/// Substitui por completo a agenda do médico autenticado
pub async fn put_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(doctor_id): Path<Uuid>,
    Json(payload): Json<ScheduleUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;
    authorize(&principal, doctor_id)?;

    let slots: Vec<WeeklySlot> = payload
        .slots
        .into_iter()
        .map(|slot| WeeklySlot {
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
        })
        .collect();

    state.schedules.replace(doctor_id, &slots).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Devolve a agenda do médico autenticado
pub async fn get_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Vec<WeeklySlot>>, ApiError> {
    authorize(&principal, doctor_id)?;
    let slots = state.schedules.load(doctor_id).await?;
    Ok(Json(slots))
}
