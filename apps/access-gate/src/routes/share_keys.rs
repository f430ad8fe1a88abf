//! Emissão e resgate de chaves de compartilhamento

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use common_access::share_key::IssuedKey;
use common_db::models::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

/// Emite uma chave para o prontuário do próprio paciente
///
/// O valor em claro aparece apenas nesta resposta; cabe ao paciente
/// entregá-lo ao médico escolhido.
pub async fn issue(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<(StatusCode, Json<IssuedKey>), ApiError> {
    if principal.role != Role::Patient {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }

    let issued = state
        .share_keys
        .issue(principal.account_id, state.clock.now())
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RedeemRequest {
    #[validate(length(min = 1, max = 128))]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub patient_id: Uuid,
}

/// Resgata uma chave em nome do médico autenticado
///
/// Chave desconhecida, já usada ou expirada recebe a mesma resposta 400
/// genérica, sem distinguir o motivo.
pub async fn redeem(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    payload.validate()?;

    if principal.role != Role::Doctor {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }

    let patient_id = state
        .share_keys
        .redeem(&payload.key, principal.account_id, state.clock.now())
        .await
        .map_err(ApiError::as_bad_request)?;

    Ok(Json(RedeemResponse { patient_id }))
}
