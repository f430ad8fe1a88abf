//! Marcação de consultas sob controle de admissão

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common_db::models::{Appointment, Role};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

/// Marca uma consulta para o paciente autenticado
///
/// Horário fora da agenda do médico responde 400 genérico; a agenda em si
/// nunca é revelada ao paciente.
pub async fn book(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    if principal.role != Role::Patient {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }

    let appointment = state
        .appointments
        .book(
            principal.account_id,
            payload.doctor_id,
            payload.scheduled_at,
            state.clock.now(),
        )
        .await
        .map_err(ApiError::as_bad_request)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}
