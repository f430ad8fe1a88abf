//! Registro e leitura de contas, e notificações por conta
//!
//! As regras de assinatura por papel valem na criação: clínica exige
//! assinatura vigente desde o primeiro dia; médico pode assinar depois;
//! os demais papéis não possuem assinatura.

use chrono::{DateTime, Utc};
use common_db::models::{Account, Notification, Role, Subscription};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::AccessError;
use crate::subscription::compute_premium;

/// Assinatura informada no registro de uma conta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub plan: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Dados para registrar uma nova conta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub role: Role,
    pub display_name: String,
    pub subscription: Option<NewSubscription>,
}

/// Acesso às contas da plataforma
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Registra uma conta aplicando as regras de assinatura do papel
    pub async fn register(
        &self,
        new_account: NewAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, AccessError> {
        if new_account.display_name.trim().is_empty() {
            return Err(AccessError::Invalid("nome de exibição vazio".to_string()));
        }

        let subscription = match (new_account.role, new_account.subscription) {
            // Clínica: assinatura obrigatória e ativa desde a criação
            (Role::Clinic, Some(sub)) => Subscription {
                plan: Some(sub.plan),
                start: Some(sub.start),
                end: Some(sub.end),
                active: true,
            },
            (Role::Clinic, None) => {
                return Err(AccessError::Invalid(
                    "clínica exige assinatura no registro".to_string(),
                ))
            }
            // Médico: assinatura opcional; ausente significa sem premium
            (Role::Doctor, Some(sub)) => Subscription {
                plan: Some(sub.plan),
                start: Some(sub.start),
                end: Some(sub.end),
                active: true,
            },
            (Role::Doctor, None) => Subscription::default(),
            // Demais papéis não possuem assinatura
            (_, Some(_)) => {
                return Err(AccessError::Invalid(
                    "papel não comporta assinatura".to_string(),
                ))
            }
            (_, None) => Subscription::default(),
        };

        let id = Uuid::new_v4();
        let premium = compute_premium(new_account.role, &subscription, now);

        sqlx::query(
            "INSERT INTO accounts (id, created_at, updated_at, role, display_name, \
             subscription_plan, subscription_start, subscription_end, subscription_active, \
             premium_features) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .bind(new_account.role.to_string())
        .bind(&new_account.display_name)
        .bind(&subscription.plan)
        .bind(subscription.start)
        .bind(subscription.end)
        .bind(subscription.active)
        .bind(premium)
        .execute(&self.pool)
        .await?;

        info!(account_id = %id, role = %new_account.role, "conta registrada");

        Ok(Account {
            id,
            role: new_account.role,
            display_name: new_account.display_name,
            created_at: now,
            subscription,
            premium_features: premium,
        })
    }

    /// Busca uma conta pelo identificador
    pub async fn fetch(&self, account_id: Uuid) -> Result<Account, AccessError> {
        let account = sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(account)
    }

    /// Atualiza o nome de exibição de uma conta
    pub async fn update_display_name(
        &self,
        account_id: Uuid,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AccessError> {
        if display_name.trim().is_empty() {
            return Err(AccessError::Invalid("nome de exibição vazio".to_string()));
        }

        let result =
            sqlx::query("UPDATE accounts SET display_name = ?, updated_at = ? WHERE id = ?")
                .bind(display_name)
                .bind(now)
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AccessError::NotFound);
        }
        Ok(())
    }

    /// Anexa uma notificação à conta
    ///
    /// Sempre um único INSERT: nada de ler a lista, alterar e regravar,
    /// o que perderia anexos concorrentes.
    pub async fn notify(
        &self,
        account_id: Uuid,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Notification, AccessError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notifications (id, account_id, message, created_at, read) \
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(id)
        .bind(account_id)
        .bind(message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Notification {
            id,
            account_id,
            message: message.to_string(),
            created_at: now,
            read: false,
        })
    }

    /// Lista as notificações da conta, mais recentes primeiro
    pub async fn notifications(&self, account_id: Uuid) -> Result<Vec<Notification>, AccessError> {
        let rows = sqlx::query_as(
            "SELECT * FROM notifications WHERE account_id = ? ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Marca uma notificação da conta como lida
    ///
    /// `read` é a única coluna mutável de uma notificação. A condição de
    /// posse entra na própria atualização: notificação de outra conta
    /// conta como inexistente.
    pub async fn mark_read(
        &self,
        account_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), AccessError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND account_id = ?")
            .bind(notification_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AccessError::NotFound);
        }
        Ok(())
    }
}
