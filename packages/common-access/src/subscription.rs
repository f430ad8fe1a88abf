//! Estado de assinatura e elegibilidade premium
//!
//! A elegibilidade é sempre uma função pura da assinatura mais o instante
//! atual. A coluna `premium_features` é apenas uma dica persistida que o
//! login reescreve; nenhuma decisão de autorização confia nela.

use chrono::{DateTime, Utc};
use common_db::models::{Account, Role, Subscription};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::AccessError;

/// Verifica se a assinatura está vigente neste instante
///
/// Campos ausentes significam "nunca esteve ativa". A flag administrativa
/// `active` sozinha não basta: a vigência é reavaliada contra `end`.
pub fn is_active(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    subscription.active && matches!(subscription.end, Some(end) if now < end)
}

/// Calcula a elegibilidade premium de uma conta
///
/// Médicos e clínicas derivam premium da vigência da assinatura; os demais
/// papéis nunca são premium. Para clínicas a assinatura vencida implica
/// bloqueio total, decidido pela fachada de acesso, não aqui.
pub fn compute_premium(role: Role, subscription: &Subscription, now: DateTime<Utc>) -> bool {
    matches!(role, Role::Doctor | Role::Clinic) && is_active(subscription, now)
}

/// Fonte única de verdade sobre o estado pago das contas
#[derive(Clone)]
pub struct SubscriptionLedger {
    pool: SqlitePool,
}

impl SubscriptionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Recalcula a elegibilidade premium e persiste a dica
    ///
    /// Chamado no login para que leituras defasadas em outros pontos se
    /// autocorrijam. A assinatura é relida do banco, nunca tomada de uma
    /// cópia em memória. Retorna o valor recém-calculado.
    pub async fn refresh_premium(
        &self,
        account_id: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<bool, AccessError> {
        let subscription = self.subscription_of(account_id).await?;
        let premium = compute_premium(role, &subscription, now);

        sqlx::query("UPDATE accounts SET premium_features = ?, updated_at = ? WHERE id = ?")
            .bind(premium)
            .bind(now)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        debug!(account_id = %account_id, premium, "dica premium_features atualizada");
        Ok(premium)
    }

    /// Carrega o estado de assinatura direto do banco
    pub async fn subscription_of(&self, account_id: Uuid) -> Result<Subscription, AccessError> {
        let account: Account = sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(account.subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn active_subscription(end_in: Duration) -> Subscription {
        Subscription {
            plan: Some("mensal".to_string()),
            start: Some(now() - Duration::days(30)),
            end: Some(now() + end_in),
            active: true,
        }
    }

    #[test]
    fn test_absent_subscription_never_active() {
        assert!(!is_active(&Subscription::default(), now()));
    }

    #[test]
    fn test_active_flag_alone_is_not_enough() {
        // Flag ligada mas sem data de fim: nunca vigente
        let sub = Subscription {
            active: true,
            ..Default::default()
        };
        assert!(!is_active(&sub, now()));

        // Flag ligada mas vencida
        let expired = Subscription {
            end: Some(now() - Duration::seconds(1)),
            ..active_subscription(Duration::days(1))
        };
        assert!(!is_active(&expired, now()));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let sub = active_subscription(Duration::zero());
        // now == end: não vigente
        assert!(!is_active(&sub, now()));
        // Um segundo antes do fim: vigente
        assert!(is_active(&sub, now() - Duration::seconds(1)));
    }

    #[test]
    fn test_premium_only_for_doctor_and_clinic() {
        let sub = active_subscription(Duration::days(10));
        assert!(compute_premium(Role::Doctor, &sub, now()));
        assert!(compute_premium(Role::Clinic, &sub, now()));
        assert!(!compute_premium(Role::Patient, &sub, now()));
        assert!(!compute_premium(Role::Nurse, &sub, now()));
        assert!(!compute_premium(Role::Admin, &sub, now()));
    }

    #[test]
    fn test_doctor_without_subscription_is_not_premium() {
        assert!(!compute_premium(Role::Doctor, &Subscription::default(), now()));
    }

    #[tokio::test]
    async fn test_refresh_premium_persists_fresh_hint() {
        use crate::accounts::{AccountStore, NewAccount, NewSubscription};

        let pool = common_db::init_test_pool().await.unwrap();
        let accounts = AccountStore::new(pool.clone());
        let ledger = SubscriptionLedger::new(pool);

        let doctor = accounts
            .register(
                NewAccount {
                    role: Role::Doctor,
                    display_name: "Dr. Otávio".to_string(),
                    subscription: Some(NewSubscription {
                        plan: "mensal".to_string(),
                        start: now(),
                        end: now() + Duration::days(30),
                    }),
                },
                now(),
            )
            .await
            .unwrap();
        assert!(doctor.premium_features);

        // Depois do vencimento a dica persistida se autocorrige, a partir
        // da assinatura relida do banco
        let later = now() + Duration::days(31);
        let premium = ledger
            .refresh_premium(doctor.id, doctor.role, later)
            .await
            .unwrap();
        assert!(!premium);

        let stored = accounts.fetch(doctor.id).await.unwrap();
        assert!(!stored.premium_features);

        // A assinatura em si permanece gravada
        let sub = ledger.subscription_of(doctor.id).await.unwrap();
        assert_eq!(sub.plan.as_deref(), Some("mensal"));
    }

    #[tokio::test]
    async fn test_refresh_premium_unknown_account_is_not_found() {
        let pool = common_db::init_test_pool().await.unwrap();
        let ledger = SubscriptionLedger::new(pool);

        let missing = ledger
            .refresh_premium(Uuid::new_v4(), Role::Doctor, now())
            .await;
        assert!(matches!(missing, Err(AccessError::NotFound)));
    }
}
