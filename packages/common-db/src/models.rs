//! Modelos de dados compartilhados entre aplicações
//!
//! Este módulo define as estruturas de dados principais usadas pelo ecossistema da clínica

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// Papéis possíveis de uma conta na plataforma
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Paciente
    Patient,
    /// Médico (assinatura opcional, habilita recursos premium)
    Doctor,
    /// Enfermeiro
    Nurse,
    /// Administrador da plataforma
    Admin,
    /// Clínica (assinatura obrigatória)
    Clinic,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "admin" => Some(Role::Admin),
            "clinic" => Some(Role::Clinic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Doctor => write!(f, "doctor"),
            Role::Nurse => write!(f, "nurse"),
            Role::Admin => write!(f, "admin"),
            Role::Clinic => write!(f, "clinic"),
        }
    }
}

/// Dias da semana, armazenados como texto no banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monday" => Some(Weekday::Monday),
            "tuesday" => Some(Weekday::Tuesday),
            "wednesday" => Some(Weekday::Wednesday),
            "thursday" => Some(Weekday::Thursday),
            "friday" => Some(Weekday::Friday),
            "saturday" => Some(Weekday::Saturday),
            "sunday" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Weekday::Monday => write!(f, "monday"),
            Weekday::Tuesday => write!(f, "tuesday"),
            Weekday::Wednesday => write!(f, "wednesday"),
            Weekday::Thursday => write!(f, "thursday"),
            Weekday::Friday => write!(f, "friday"),
            Weekday::Saturday => write!(f, "saturday"),
            Weekday::Sunday => write!(f, "sunday"),
        }
    }
}

/// Janela recorrente de atendimento de um médico
///
/// Os horários são em relógio de parede (HH:MM) no fuso da plataforma;
/// nenhuma conversão de fuso é feita.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySlot {
    /// Dia da semana da janela
    pub day: Weekday,
    /// Início, formato HH:MM
    pub start_time: String,
    /// Fim, formato HH:MM (exclusivo)
    pub end_time: String,
}

impl FromRow<'_, SqliteRow> for WeeklySlot {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let weekday: String = row.try_get("weekday")?;
        let day = Weekday::parse(&weekday).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: String::from("weekday"),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Valor de dia da semana inválido: {}", weekday),
            )),
        })?;
        Ok(Self {
            day,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
        })
    }
}

/// Estado de assinatura de uma conta
///
/// Campos ausentes significam "nunca esteve ativa". A flag `active` nunca
/// é suficiente sozinha: decisões sensíveis a expiração sempre recomputam
/// contra `end` e o relógio atual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Nome do plano contratado
    pub plan: Option<String>,
    /// Início da vigência
    pub start: Option<DateTime<Utc>>,
    /// Fim da vigência
    pub end: Option<DateTime<Utc>>,
    /// Flag administrativa de ativação
    pub active: bool,
}

/// Representa uma conta da plataforma
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Identificador único da conta
    pub id: Uuid,
    /// Papel da conta
    pub role: Role,
    /// Nome exibido
    pub display_name: String,
    /// Data e hora de criação do registro
    pub created_at: DateTime<Utc>,
    /// Estado de assinatura
    pub subscription: Subscription,
    /// Cache derivado de elegibilidade premium; nunca fonte de verdade
    pub premium_features: bool,
}

impl FromRow<'_, SqliteRow> for Account {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let role: String = row.try_get("role")?;
        let role = Role::parse(&role).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: String::from("role"),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Valor de papel inválido: {}", role),
            )),
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            role,
            display_name: row.try_get("display_name")?,
            created_at: row.try_get("created_at")?,
            subscription: Subscription {
                plan: row.try_get("subscription_plan")?,
                start: row.try_get("subscription_start")?,
                end: row.try_get("subscription_end")?,
                active: row.try_get("subscription_active")?,
            },
            premium_features: row.try_get("premium_features")?,
        })
    }
}

/// Chave de compartilhamento: capacidade de uso único e janela fixa
///
/// O valor em claro da chave existe apenas na resposta de emissão;
/// o banco guarda somente o hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareKey {
    /// Identificador único do registro
    pub id: Uuid,
    /// Paciente emissor da chave
    pub patient_id: Uuid,
    /// Médico que resgatou a chave (preenchido no resgate)
    pub doctor_id: Option<Uuid>,
    /// Data e hora de emissão
    pub created_at: DateTime<Utc>,
    /// Expiração, fixada na emissão e nunca estendida
    pub expires_at: DateTime<Utc>,
    /// Indica se a chave já foi resgatada
    pub used: bool,
}

impl FromRow<'_, SqliteRow> for ShareKey {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            doctor_id: row.try_get("doctor_id")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            used: row.try_get("used")?,
        })
    }
}

/// Status possíveis de uma consulta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Agendamento inicial, pendente de confirmação
    Pending,
    /// Confirmado
    Confirmed,
    /// Cancelado
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Representa uma consulta agendada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Identificador único da consulta
    pub id: Uuid,
    /// Identificador do paciente
    pub patient_id: Uuid,
    /// Identificador do médico
    pub doctor_id: Uuid,
    /// Data e hora de criação do registro
    pub created_at: DateTime<Utc>,
    /// Data e hora agendada para a consulta
    pub scheduled_at: DateTime<Utc>,
    /// Status atual da consulta
    pub status: AppointmentStatus,
}

impl FromRow<'_, SqliteRow> for Appointment {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let status = AppointmentStatus::parse(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: String::from("status"),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Valor de status inválido: {}", status),
            )),
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            doctor_id: row.try_get("doctor_id")?,
            created_at: row.try_get("created_at")?,
            scheduled_at: row.try_get("scheduled_at")?,
            status,
        })
    }
}

/// Notificação entregue a uma conta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Identificador único
    pub id: Uuid,
    /// Conta destinatária
    pub account_id: Uuid,
    /// Texto da notificação
    pub message: String,
    /// Data e hora de criação
    pub created_at: DateTime<Utc>,
    /// Indica se já foi lida
    pub read: bool,
}

impl FromRow<'_, SqliteRow> for Notification {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
            read: row.try_get("read")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Patient, Role::Doctor, Role::Nurse, Role::Admin, Role::Clinic] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
        assert_eq!(Role::parse("secretary"), None);
    }

    #[test]
    fn test_weekday_from_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Mon), Weekday::Monday);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
        assert_eq!(Weekday::parse("wednesday"), Some(Weekday::Wednesday));
        assert_eq!(Weekday::parse("Wednesday"), None);
    }

    #[test]
    fn test_subscription_default_is_inactive() {
        let sub = Subscription::default();
        assert!(!sub.active);
        assert!(sub.plan.is_none());
        assert!(sub.end.is_none());
    }
}
