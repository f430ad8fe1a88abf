//! Fachada de autorização consultada pelos handlers de rota
//!
//! Ponto único de decisão para "o principal P pode agir sobre o recurso R
//! agora?". Decisões retornam booleanos, nunca erros disfarçados: o
//! chamador jamais confunde "negado" com "desconhecido".

use chrono::{DateTime, Utc};
use common_db::models::{Account, Role};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AccessError;
use crate::share_key::ShareKeyStore;
use crate::subscription::{compute_premium, is_active};

/// Combina chaves de compartilhamento e estado de assinatura
#[derive(Clone)]
pub struct AccessGuard {
    keys: ShareKeyStore,
}

impl AccessGuard {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            keys: ShareKeyStore::new(pool),
        }
    }

    /// Decide o acesso a campos protegidos do perfil de uma conta
    ///
    /// Acesso próprio é sempre permitido. Acesso cruzado exige papel de
    /// médico com concessão resgatada ainda dentro da janela de validade.
    pub async fn can_access_profile(
        &self,
        requester_id: Uuid,
        requester_role: Role,
        target_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AccessError> {
        if requester_id == target_id {
            return Ok(true);
        }
        if requester_role != Role::Doctor {
            return Ok(false);
        }
        self.keys.is_grant_valid(target_id, requester_id, now).await
    }

    /// Bloqueio duro: clínica sem assinatura vigente não entra
    ///
    /// Quando falso para uma conta de clínica, o próprio login deve ser
    /// recusado; não existe modo degradado.
    pub fn can_use_clinic_features(&self, account: &Account, now: DateTime<Utc>) -> bool {
        is_active(&account.subscription, now)
    }

    /// Bloqueio brando: médico sem assinatura mantém o acesso base
    ///
    /// Falso apenas oculta comportamentos marcados como premium.
    pub fn can_use_doctor_premium(&self, account: &Account, now: DateTime<Utc>) -> bool {
        compute_premium(account.role, &account.subscription, now)
    }
}
