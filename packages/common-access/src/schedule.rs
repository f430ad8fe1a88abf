//! Admissão de agendamentos contra a agenda semanal do médico
//!
//! A decisão compara relógio de parede: dia da semana e HH:MM do candidato
//! contra as janelas declaradas, sem conversão de fuso. Intervalos são
//! semiabertos: exatamente no início admite, exatamente no fim não.

use chrono::{DateTime, Datelike, Timelike, Utc};
use common_db::models::{Weekday, WeeklySlot};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AccessError;

/// Converte "HH:MM" em minutos desde a meia-noite
///
/// Formato estrito de cinco caracteres. Retorna None para entrada
/// malformada.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Decide se o instante candidato cai em alguma janela da agenda
///
/// Agenda vazia nunca admite. Janelas sobrepostas no mesmo dia são
/// toleradas (OU lógico). Uma janela com horário malformado é
/// desqualificada sozinha, sem abortar a verificação inteira.
pub fn is_admissible(slots: &[WeeklySlot], candidate: DateTime<Utc>) -> bool {
    let day = Weekday::from(candidate.weekday());
    let minute_of_day = candidate.hour() * 60 + candidate.minute();

    slots.iter().any(|slot| {
        if slot.day != day {
            return false;
        }
        match (parse_hhmm(&slot.start_time), parse_hhmm(&slot.end_time)) {
            // Intervalo semiaberto: início inclusivo, fim exclusivo
            (Some(start), Some(end)) => start <= minute_of_day && minute_of_day < end,
            _ => {
                warn!(?slot, "janela de agenda malformada ignorada");
                false
            }
        }
    })
}

/// Persistência da agenda semanal dos médicos
#[derive(Clone)]
pub struct ScheduleStore {
    pool: SqlitePool,
}

impl ScheduleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Substitui por completo a agenda do médico
    ///
    /// Semântica de replace integral, nunca merge parcial. Janelas com
    /// horário malformado ou com início não anterior ao fim são recusadas
    /// antes de tocar o banco.
    pub async fn replace(
        &self,
        doctor_id: Uuid,
        slots: &[WeeklySlot],
    ) -> Result<(), AccessError> {
        for slot in slots {
            let start = parse_hhmm(&slot.start_time)
                .ok_or_else(|| AccessError::Invalid(format!("horário inválido: {}", slot.start_time)))?;
            let end = parse_hhmm(&slot.end_time)
                .ok_or_else(|| AccessError::Invalid(format!("horário inválido: {}", slot.end_time)))?;
            if start >= end {
                return Err(AccessError::Invalid(
                    "início deve ser anterior ao fim".to_string(),
                ));
            }
        }

        let mut transaction = self.pool.begin().await.map_err(AccessError::from)?;

        sqlx::query("DELETE FROM doctor_schedules WHERE doctor_id = ?")
            .bind(doctor_id)
            .execute(&mut *transaction)
            .await?;

        for slot in slots {
            sqlx::query(
                "INSERT INTO doctor_schedules (id, doctor_id, weekday, start_time, end_time) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(doctor_id)
            .bind(slot.day.to_string())
            .bind(&slot.start_time)
            .bind(&slot.end_time)
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await.map_err(AccessError::from)?;
        info!(doctor_id = %doctor_id, slots = slots.len(), "agenda substituída");
        Ok(())
    }

    /// Carrega a agenda do médico
    pub async fn load(&self, doctor_id: Uuid) -> Result<Vec<WeeklySlot>, AccessError> {
        let slots = sqlx::query_as(
            "SELECT weekday, start_time, end_time FROM doctor_schedules \
             WHERE doctor_id = ? ORDER BY weekday, start_time",
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot(day: Weekday, start: &str, end: &str) -> WeeklySlot {
        WeeklySlot {
            day,
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    // 2025-06-02 é uma segunda-feira
    fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("9:00"), None);
        assert_eq!(parse_hhmm("0900"), None);
        assert_eq!(parse_hhmm("ab:cd"), None);
    }

    #[test]
    fn test_half_open_interval() {
        let slots = vec![slot(Weekday::Monday, "09:00", "17:00")];

        // Exatamente no início: admite
        assert!(is_admissible(&slots, monday_at(9, 0)));
        // No meio da janela
        assert!(is_admissible(&slots, monday_at(12, 30)));
        // Exatamente no fim: não admite
        assert!(!is_admissible(&slots, monday_at(17, 0)));
        // Antes do início
        assert!(!is_admissible(&slots, monday_at(8, 59)));
        // Dia errado (terça-feira)
        let tuesday = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        assert!(!is_admissible(&slots, tuesday));
    }

    #[test]
    fn test_empty_schedule_rejects_everything() {
        assert!(!is_admissible(&[], monday_at(10, 0)));
    }

    #[test]
    fn test_overlapping_slots_are_logical_or() {
        let slots = vec![
            slot(Weekday::Monday, "08:00", "12:00"),
            slot(Weekday::Monday, "10:00", "18:00"),
        ];
        assert!(is_admissible(&slots, monday_at(11, 0)));
        assert!(is_admissible(&slots, monday_at(17, 59)));
        assert!(!is_admissible(&slots, monday_at(18, 0)));
    }

    #[test]
    fn test_malformed_slot_disqualifies_only_itself() {
        let slots = vec![
            slot(Weekday::Monday, "25:00", "99:99"),
            slot(Weekday::Monday, "09:00", "17:00"),
        ];
        // A janela quebrada não admite nem aborta; a íntegra decide
        assert!(is_admissible(&slots, monday_at(10, 0)));
        assert!(!is_admissible(&slots, monday_at(7, 0)));
    }

    #[tokio::test]
    async fn test_replace_is_full_replace() {
        let pool = common_db::init_test_pool().await.unwrap();
        let doctor = common_db::seed_account(&pool, "doctor").await.unwrap();
        let store = ScheduleStore::new(pool);

        store
            .replace(
                doctor,
                &[
                    slot(Weekday::Monday, "09:00", "12:00"),
                    slot(Weekday::Wednesday, "14:00", "18:00"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.load(doctor).await.unwrap().len(), 2);

        // Substituição integral: as janelas anteriores não sobrevivem
        store
            .replace(doctor, &[slot(Weekday::Friday, "08:00", "10:00")])
            .await
            .unwrap();
        let slots = store.load(doctor).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].day, Weekday::Friday);

        // Replace vazio limpa a agenda
        store.replace(doctor, &[]).await.unwrap();
        assert!(store.load(doctor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_rejects_inverted_slot() {
        let pool = common_db::init_test_pool().await.unwrap();
        let doctor = common_db::seed_account(&pool, "doctor").await.unwrap();
        let store = ScheduleStore::new(pool);

        let refused = store
            .replace(doctor, &[slot(Weekday::Monday, "17:00", "09:00")])
            .await;
        assert!(matches!(refused, Err(AccessError::Invalid(_))));

        let refused = store
            .replace(doctor, &[slot(Weekday::Monday, "09h00", "17:00")])
            .await;
        assert!(matches!(refused, Err(AccessError::Invalid(_))));
    }
}
