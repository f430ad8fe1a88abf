//! Criação de consultas sob controle de admissão
//!
//! Toda consulta nasce `pending` e só depois de a agenda semanal do médico
//! admitir o horário pedido. Transições de status posteriores pertencem ao
//! fluxo de atendimento, fora deste núcleo. A detecção de choque entre
//! consultas já marcadas não é feita aqui.

use chrono::{DateTime, Utc};
use common_db::models::{Appointment, AppointmentStatus};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::error::AccessError;
use crate::schedule::{is_admissible, ScheduleStore};

/// Criação e leitura de consultas
#[derive(Clone)]
pub struct AppointmentStore {
    pool: SqlitePool,
    schedules: ScheduleStore,
    accounts: AccountStore,
}

impl AppointmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            schedules: ScheduleStore::new(pool.clone()),
            accounts: AccountStore::new(pool.clone()),
            pool,
        }
    }

    /// Marca uma consulta se o horário cair na agenda do médico
    ///
    /// Recusa com negação genérica quando o horário está fora das janelas
    /// declaradas; agenda vazia recusa tudo. No sucesso, anexa uma
    /// notificação ao médico.
    pub async fn book(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AccessError> {
        let slots = self.schedules.load(doctor_id).await?;
        if !is_admissible(&slots, scheduled_at) {
            return Err(AccessError::outside_working_hours());
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO appointments (id, patient_id, doctor_id, created_at, scheduled_at, status) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(patient_id)
        .bind(doctor_id)
        .bind(now)
        .bind(scheduled_at)
        .bind(AppointmentStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        self.accounts
            .notify(
                doctor_id,
                &format!("Nova consulta solicitada para {}", scheduled_at.format("%d/%m/%Y %H:%M")),
                now,
            )
            .await?;

        info!(appointment_id = %id, doctor_id = %doctor_id, %scheduled_at, "consulta marcada");

        Ok(Appointment {
            id,
            patient_id,
            doctor_id,
            created_at: now,
            scheduled_at,
            status: AppointmentStatus::Pending,
        })
    }

    /// Lista as consultas de um médico em ordem de horário
    pub async fn for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AccessError> {
        let rows = sqlx::query_as(
            "SELECT * FROM appointments WHERE doctor_id = ? ORDER BY scheduled_at",
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
