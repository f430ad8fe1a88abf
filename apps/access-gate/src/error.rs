//! Mapeamento dos erros do núcleo para respostas HTTP
//!
//! Negações viram 4xx com corpo genérico; somente indisponibilidade de
//! armazenamento vira 5xx. O corpo nunca revela qual verificação falhou.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_access::AccessError;
use serde_json::json;
use tracing::error;

/// Erro de uma rota, já com a classe HTTP decidida
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound,
    Conflict,
    Internal(String),
}

impl ApiError {
    /// Rebaixa negações para 400, onde o contrato da rota pede
    /// (resgate de chave e admissão de agendamento)
    pub fn as_bad_request(error: AccessError) -> Self {
        match error {
            AccessError::Forbidden(message) => ApiError::BadRequest(message),
            other => ApiError::from(other),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::NotFound => ApiError::NotFound,
            AccessError::Forbidden(message) => ApiError::Forbidden(message),
            AccessError::Conflict => ApiError::Conflict,
            AccessError::Invalid(message) => ApiError::BadRequest(message),
            AccessError::Storage(db_error) => ApiError::Internal(db_error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("payload inválido: {}", errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "registro não encontrado".to_string()),
            ApiError::Conflict => (StatusCode::CONFLICT, "conflito de atualização".to_string()),
            ApiError::Internal(detail) => {
                // Detalhe vai para o log, nunca para o cliente
                error!(%detail, "erro interno ao atender requisição");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "erro interno".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
