//! Chaves de compartilhamento de uso único
//!
//! Uma chave dá a exatamente um médico uma janela de acesso ao prontuário
//! de um paciente. O resgate é uma única atualização condicional no banco:
//! dois médicos concorrendo pela mesma chave nunca vencem ambos, pois não
//! existe o par ler-depois-gravar. O valor em claro da chave só aparece na
//! resposta de emissão; o banco guarda o hash SHA-256.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AccessError;

/// Janela de validade fixa de uma chave, em minutos
pub const KEY_TTL_MINUTES: i64 = 15;

/// Bytes de entropia do valor da chave (128 bits)
const KEY_ENTROPY_BYTES: usize = 16;

/// Resposta de emissão: único momento em que a chave em claro existe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedKey {
    /// Valor em claro, a ser entregue ao paciente
    pub key: String,
    /// Expiração, fixada agora e nunca estendida
    pub expires_at: DateTime<Utc>,
}

/// Gera o valor aleatório da chave, hex de 128 bits
fn generate_key() -> String {
    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash persistido no lugar do valor em claro
fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Ciclo de vida das chaves de compartilhamento
#[derive(Clone)]
pub struct ShareKeyStore {
    pool: SqlitePool,
}

impl ShareKeyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Emite uma nova chave para o paciente
    ///
    /// Cada chamada emite uma chave independente; várias chaves vivas por
    /// paciente são permitidas.
    pub async fn issue(
        &self,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedKey, AccessError> {
        let key = generate_key();
        let expires_at = now + Duration::minutes(KEY_TTL_MINUTES);

        sqlx::query(
            "INSERT INTO share_keys (id, key_hash, patient_id, created_at, expires_at, used) \
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(Uuid::new_v4())
        .bind(hash_key(&key))
        .bind(patient_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!(patient_id = %patient_id, %expires_at, "chave de compartilhamento emitida");
        Ok(IssuedKey { key, expires_at })
    }

    /// Resgata uma chave em nome de um médico
    ///
    /// Atualização condicional única: só vence quem encontrar a chave ainda
    /// não usada e dentro da janela. Qualquer falha (chave desconhecida,
    /// usada ou expirada) vira a mesma negação genérica, sem efeito
    /// colateral.
    pub async fn redeem(
        &self,
        key: &str,
        doctor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Uuid, AccessError> {
        let row = sqlx::query(
            "UPDATE share_keys SET used = 1, doctor_id = ? \
             WHERE key_hash = ? AND used = 0 AND expires_at > ? \
             RETURNING patient_id",
        )
        .bind(doctor_id)
        .bind(hash_key(key))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let patient_id: Uuid = row.try_get("patient_id")?;
                info!(doctor_id = %doctor_id, patient_id = %patient_id, "chave resgatada");
                Ok(patient_id)
            }
            None => {
                debug!(doctor_id = %doctor_id, "resgate negado");
                Err(AccessError::invalid_key())
            }
        }
    }

    /// Verifica se um resgate anterior ainda está na janela de validade
    ///
    /// O resgate concede uma sessão limitada pela mesma `expires_at` da
    /// emissão, não um vínculo permanente: `used` é definitivo, a validade
    /// não.
    pub async fn is_grant_valid(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AccessError> {
        let valid: bool = sqlx::query_scalar(
            "SELECT EXISTS( \
             SELECT 1 FROM share_keys \
             WHERE patient_id = ? AND doctor_id = ? AND used = 1 AND expires_at > ?)",
        )
        .bind(patient_id)
        .bind(doctor_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common_db::{init_db_pool, DbConfig};
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
    }

    async fn store_with_patient() -> (ShareKeyStore, Uuid) {
        let pool = common_db::init_test_pool().await.unwrap();
        let patient = common_db::seed_account(&pool, "patient").await.unwrap();
        (ShareKeyStore::new(pool), patient)
    }

    #[test]
    fn test_generated_keys_are_unique_hex() {
        let a = generate_key();
        let b = generate_key();
        assert_eq!(a.len(), KEY_ENTROPY_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_issue_fixes_expiry_at_fifteen_minutes() {
        let (store, patient) = store_with_patient().await;
        let issued = store.issue(patient, now()).await.unwrap();
        assert_eq!(issued.expires_at, now() + Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_redeem_happy_path() {
        let (store, patient) = store_with_patient().await;
        let doctor = Uuid::new_v4();

        let issued = store.issue(patient, now()).await.unwrap();
        let redeemed = store
            .redeem(&issued.key, doctor, now() + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(redeemed, patient);

        // Segundo resgate da mesma chave: negado, mesmo por outro médico
        let again = store
            .redeem(&issued.key, Uuid::new_v4(), now() + Duration::minutes(6))
            .await;
        assert!(matches!(again, Err(AccessError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_redeem_after_expiry_is_denied() {
        let (store, patient) = store_with_patient().await;
        let issued = store.issue(patient, now()).await.unwrap();

        // Exatamente na expiração: negado (janela semiaberta)
        let at_expiry = store
            .redeem(&issued.key, Uuid::new_v4(), issued.expires_at)
            .await;
        assert!(matches!(at_expiry, Err(AccessError::Forbidden(_))));

        // Um segundo depois: negado
        let after = store
            .redeem(
                &issued.key,
                Uuid::new_v4(),
                issued.expires_at + Duration::seconds(1),
            )
            .await;
        assert!(matches!(after, Err(AccessError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unknown_key_is_denied() {
        let (store, _) = store_with_patient().await;
        let denied = store
            .redeem("deadbeefdeadbeefdeadbeefdeadbeef", Uuid::new_v4(), now())
            .await;
        assert!(matches!(denied, Err(AccessError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_grant_window_survives_used_flag() {
        let (store, patient) = store_with_patient().await;
        let doctor = Uuid::new_v4();

        let issued = store.issue(patient, now()).await.unwrap();
        store
            .redeem(&issued.key, doctor, now() + Duration::minutes(5))
            .await
            .unwrap();

        // Dentro da janela: concessão vale
        assert!(store
            .is_grant_valid(patient, doctor, now() + Duration::minutes(14))
            .await
            .unwrap());

        // Na expiração e depois: concessão lapsa, embora used permaneça
        assert!(!store
            .is_grant_valid(patient, doctor, issued.expires_at)
            .await
            .unwrap());
        assert!(!store
            .is_grant_valid(patient, doctor, now() + Duration::minutes(20))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_grant_requires_redemption() {
        let (store, patient) = store_with_patient().await;
        let doctor = Uuid::new_v4();

        // Chave emitida mas nunca resgatada não concede nada
        store.issue(patient, now()).await.unwrap();
        assert!(!store
            .is_grant_valid(patient, doctor, now() + Duration::minutes(1))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_multiple_live_keys_per_patient() {
        let (store, patient) = store_with_patient().await;

        let first = store.issue(patient, now()).await.unwrap();
        let second = store.issue(patient, now()).await.unwrap();
        assert_ne!(first.key, second.key);

        // Cada chave resgatável independentemente
        store
            .redeem(&first.key, Uuid::new_v4(), now() + Duration::minutes(1))
            .await
            .unwrap();
        store
            .redeem(&second.key, Uuid::new_v4(), now() + Duration::minutes(1))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redemption_single_winner() {
        // Banco em arquivo com várias conexões para exercer a corrida real
        let temp_dir = tempdir().unwrap();
        let config = DbConfig {
            db_path: temp_dir
                .path()
                .join("race.db")
                .to_str()
                .unwrap()
                .to_string(),
            max_connections: 8,
        };
        let pool = init_db_pool(&config).await.unwrap();
        let patient = common_db::seed_account(&pool, "patient").await.unwrap();
        let store = ShareKeyStore::new(pool);

        let issued = store.issue(patient, now()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let key = issued.key.clone();
            handles.push(tokio::spawn(async move {
                store.redeem(&key, Uuid::new_v4(), now()).await
            }));
        }

        let mut winners = 0;
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(patient_id) => {
                    assert_eq!(patient_id, patient);
                    winners += 1;
                }
                Err(AccessError::Forbidden(_)) => losers += 1,
                Err(other) => panic!("falha inesperada: {other}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(losers, 7);
    }
}
