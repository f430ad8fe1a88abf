//! Registro, login condicionado a assinatura, perfil e notificações

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common_access::accounts::{NewAccount, NewSubscription};
use common_db::models::{Notification, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{issue_token, Principal};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub role: Role,
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
    pub subscription: Option<NewSubscription>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub role: Role,
    pub premium_features: bool,
}

/// Registra uma conta aplicando as regras de assinatura do papel
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.validate()?;

    let account = state
        .accounts
        .register(
            NewAccount {
                role: payload.role,
                display_name: payload.display_name,
                subscription: payload.subscription,
            },
            state.clock.now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id,
            role: account.role,
            premium_features: account.premium_features,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Identidade já verificada pelo gateway a montante
    pub account_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account_id: Uuid,
    pub role: Role,
    pub premium_features: bool,
}

/// Login condicionado a assinatura
///
/// Clínica com assinatura vencida é recusada na porta (bloqueio duro).
/// Médico sempre entra; a elegibilidade premium é recalculada contra o
/// relógio e persistida como dica, nunca lida do armazenamento.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let now = state.clock.now();
    let account = state.accounts.fetch(payload.account_id).await?;

    if account.role == Role::Clinic && !state.guard.can_use_clinic_features(&account, now) {
        return Err(ApiError::Forbidden("assinatura expirada".to_string()));
    }

    let premium_features = state
        .ledger
        .refresh_premium(account.id, account.role, now)
        .await?;
    let token = issue_token(account.id, account.role, &state.jwt_secret)?;

    Ok(Json(LoginResponse {
        token,
        account_id: account.id,
        role: account.role,
        premium_features,
    }))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub role: Role,
    pub display_name: String,
}

/// Leitura de perfil guardada pela fachada de acesso
pub async fn get_profile(
    State(state): State<AppState>,
    principal: Principal,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let allowed = state
        .guard
        .can_access_profile(
            principal.account_id,
            principal.role,
            account_id,
            state.clock.now(),
        )
        .await?;
    if !allowed {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }

    let account = state.accounts.fetch(account_id).await?;
    Ok(Json(ProfileResponse {
        id: account.id,
        role: account.role,
        display_name: account.display_name,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
}

/// Escrita de perfil guardada pela fachada de acesso
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    let now = state.clock.now();
    let allowed = state
        .guard
        .can_access_profile(principal.account_id, principal.role, account_id, now)
        .await?;
    if !allowed {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }

    state
        .accounts
        .update_display_name(account_id, &payload.display_name, now)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lista as notificações da própria conta
pub async fn list_notifications(
    State(state): State<AppState>,
    principal: Principal,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    if principal.account_id != account_id {
        return Err(ApiError::Forbidden("acesso negado".to_string()));
    }
    let notifications = state.accounts.notifications(account_id).await?;
    Ok(Json(notifications))
}

/// Marca uma notificação da própria conta como lida
pub async fn mark_notification_read(
    State(state): State<AppState>,
    principal: Principal,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .accounts
        .mark_read(principal.account_id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
