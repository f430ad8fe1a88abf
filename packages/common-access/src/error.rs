//! Definições de erro para as decisões de acesso e admissão
//!
//! Negações de autorização e de admissão são resultados esperados e
//! recuperáveis; apenas indisponibilidade do armazenamento é fatal.

use common_db::error::DbError;
use thiserror::Error;

/// Resultado negativo ou falha de uma operação do núcleo de acesso
#[derive(Error, Debug)]
pub enum AccessError {
    /// Conta, chave ou registro desconhecido
    #[error("Registro não encontrado")]
    NotFound,

    /// Negação de papel, posse, chave ou assinatura. A mensagem é
    /// intencionalmente genérica para não revelar qual verificação falhou
    #[error("{0}")]
    Forbidden(String),

    /// Perdedor de uma corrida de atualização condicional
    #[error("Conflito de atualização concorrente")]
    Conflict,

    /// Entrada malformada
    #[error("Entrada inválida: {0}")]
    Invalid(String),

    /// Falha de infraestrutura do banco de dados
    #[error("Erro de armazenamento: {0}")]
    Storage(DbError),
}

impl AccessError {
    /// Negação genérica de resgate de chave
    pub fn invalid_key() -> Self {
        AccessError::Forbidden("chave inválida ou expirada".to_string())
    }

    /// Negação genérica de admissão de agendamento
    pub fn outside_working_hours() -> Self {
        AccessError::Forbidden("fora do horário de atendimento".to_string())
    }

    /// Bloqueio duro de conta com assinatura vencida
    pub fn subscription_expired() -> Self {
        AccessError::Forbidden("assinatura expirada".to_string())
    }

    /// Negação genérica de acesso a recurso
    pub fn denied() -> Self {
        AccessError::Forbidden("acesso negado".to_string())
    }
}

impl From<DbError> for AccessError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound(_) => AccessError::NotFound,
            DbError::ConstraintViolation(_) => AccessError::Conflict,
            other => AccessError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for AccessError {
    fn from(error: sqlx::Error) -> Self {
        AccessError::from(DbError::from(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_becomes_not_found() {
        let err = AccessError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AccessError::NotFound));
    }

    #[test]
    fn test_denial_messages_are_generic() {
        // A mesma mensagem cobre chave inexistente, usada e expirada
        assert_eq!(AccessError::invalid_key().to_string(), "chave inválida ou expirada");
        assert_eq!(
            AccessError::outside_working_hours().to_string(),
            "fora do horário de atendimento"
        );
    }
}
