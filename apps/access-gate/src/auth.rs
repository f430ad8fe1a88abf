//! Extração do principal autenticado
//!
//! A verificação de credenciais pertence ao gateway a montante; aqui o
//! token portador só é decodificado para obter `{subject_id, role}`. A
//! vida útil do token de sessão é assunto de sessão, não das janelas de
//! validade do domínio, e por isso usa o relógio do sistema.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common_db::models::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Duração da sessão emitida no login
const SESSION_HOURS: i64 = 8;

/// Claims do token de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identificador da conta
    pub sub: Uuid,
    /// Papel da conta no momento do login
    pub role: Role,
    /// Expiração da sessão (época Unix)
    pub exp: i64,
}

/// Identidade verificada que as rotas consomem
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
}

/// Emite um token de sessão para a conta
pub fn issue_token(account_id: Uuid, role: Role, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: account_id,
        role,
        exp: (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("falha ao emitir token: {}", e)))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Forbidden("credenciais ausentes".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Forbidden("credenciais ausentes".to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ApiError::Forbidden("sessão inválida".to_string()))?;

        Ok(Principal {
            account_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let id = Uuid::new_v4();
        let token = issue_token(id, Role::Doctor, "segredo-de-teste").unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"segredo-de-teste"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.sub, id);
        assert_eq!(data.claims.role, Role::Doctor);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), Role::Patient, "segredo-a").unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"segredo-b"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
