//! Sistema de migrações para banco de dados
//!
//! Este módulo gerencia as migrações do banco de dados SQLite

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

/// Lista de migrações SQL a serem aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_initial_schema.sql
    r#"
    -- Tabela de contas (pacientes, médicos, enfermeiros, admins e clínicas)
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        role TEXT NOT NULL CHECK (role IN ('patient', 'doctor', 'nurse', 'admin', 'clinic')),
        display_name TEXT NOT NULL,
        subscription_plan TEXT,
        subscription_start TIMESTAMP,
        subscription_end TIMESTAMP,
        subscription_active BOOLEAN NOT NULL DEFAULT 0,
        premium_features BOOLEAN NOT NULL DEFAULT 0
    );

    -- Tabela de chaves de compartilhamento (uso único, janela de validade fixa)
    -- Apenas o hash da chave é persistido, nunca o valor em claro
    CREATE TABLE IF NOT EXISTS share_keys (
        id TEXT PRIMARY KEY NOT NULL,
        key_hash TEXT NOT NULL UNIQUE,
        patient_id TEXT NOT NULL,
        doctor_id TEXT,
        created_at TIMESTAMP NOT NULL,
        expires_at TIMESTAMP NOT NULL,
        used BOOLEAN NOT NULL DEFAULT 0,
        FOREIGN KEY (patient_id) REFERENCES accounts (id) ON DELETE CASCADE
    );

    -- Agenda semanal dos médicos (horários em HH:MM, fuso da plataforma)
    CREATE TABLE IF NOT EXISTS doctor_schedules (
        id TEXT PRIMARY KEY NOT NULL,
        doctor_id TEXT NOT NULL,
        weekday TEXT NOT NULL CHECK (weekday IN ('monday', 'tuesday', 'wednesday', 'thursday', 'friday', 'saturday', 'sunday')),
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        FOREIGN KEY (doctor_id) REFERENCES accounts (id) ON DELETE CASCADE
    );

    -- Tabela de consultas
    CREATE TABLE IF NOT EXISTS appointments (
        id TEXT PRIMARY KEY NOT NULL,
        patient_id TEXT NOT NULL,
        doctor_id TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        scheduled_at TIMESTAMP NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'cancelled')),
        FOREIGN KEY (patient_id) REFERENCES accounts (id) ON DELETE CASCADE,
        FOREIGN KEY (doctor_id) REFERENCES accounts (id) ON DELETE CASCADE
    );

    -- Notificações por conta (somente INSERT; apenas a coluna read é mutável)
    CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY NOT NULL,
        account_id TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL,
        read BOOLEAN NOT NULL DEFAULT 0,
        FOREIGN KEY (account_id) REFERENCES accounts (id) ON DELETE CASCADE
    );

    -- Índices para otimização
    CREATE INDEX IF NOT EXISTS idx_share_keys_patient_id ON share_keys (patient_id);
    CREATE INDEX IF NOT EXISTS idx_share_keys_doctor_id ON share_keys (doctor_id);
    CREATE INDEX IF NOT EXISTS idx_share_keys_expires_at ON share_keys (expires_at);
    CREATE INDEX IF NOT EXISTS idx_doctor_schedules_doctor_id ON doctor_schedules (doctor_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_doctor_id ON appointments (doctor_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments (patient_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_scheduled_at ON appointments (scheduled_at);
    CREATE INDEX IF NOT EXISTS idx_notifications_account_id ON notifications (account_id);
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    // Obter a versão atual do banco de dados
    let mut version: i64 = 0;
    match sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
    {
        Ok(v) => version = v,
        Err(e) => {
            error!("Erro ao obter versão do banco: {}", e);
            // Continuar mesmo assim, pois pode ser a primeira execução
        }
    }

    info!("Versão atual do banco: {}", version);

    // Aplicar cada migração pendente sequencialmente
    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        // Pular migrações já aplicadas
        if migration_version <= version {
            info!("Migração {} já aplicada", migration_version);
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        // Executar em uma transação para garantir atomicidade
        let mut transaction = pool.begin().await
            .context(format!("Falha ao iniciar transação para migração {}", migration_version))?;

        // Executar os comandos SQL
        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .context(format!("Falha ao executar migração {}", migration_version))?;

        // Atualizar versão do banco
        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .context(format!("Falha ao atualizar versão para {}", migration_version))?;

        // Commit da transação
        transaction.commit().await
            .context(format!("Falha ao confirmar transação para migração {}", migration_version))?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}
