//! Common DB - Biblioteca compartilhada para acesso ao banco de dados da clínica
//!
//! Esta biblioteca fornece:
//! - Modelos de dados compartilhados (contas, chaves de acesso, agenda, consultas)
//! - Migrações automáticas do banco de dados
//! - Pool de conexão e funções de utilidades para SQLite

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod error;
pub mod migrations;
pub mod models;

/// Configuração da conexão com o banco de dados
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: "data/clinic.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Inicializa uma conexão com o banco de dados SQLite
pub async fn init_db_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.db_path);

    // Verifica se o diretório pai existe
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    // Configura as opções de conexão SQLite
    let connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .pragma("synchronous", "NORMAL");

    // Cria o pool de conexões
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    // Aplica migrações automáticas
    migrations::run_migrations(&pool).await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", config.db_path);
    Ok(pool)
}

/// Cria um pool em memória já migrado, para uso em testes
#[cfg(any(test, feature = "test-utils"))]
pub async fn init_test_pool() -> Result<SqlitePool> {
    let connection_options = SqliteConnectOptions::new()
        .filename(":memory:")
        .foreign_keys(true);

    // Uma única conexão evita bancos :memory: distintos por conexão do pool
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connection_options)
        .await
        .context("Falha ao criar banco em memória")?;

    migrations::run_migrations(&pool).await?;
    Ok(pool)
}

/// Insere uma conta mínima com o papel dado, para satisfazer chaves
/// estrangeiras em testes
#[cfg(any(test, feature = "test-utils"))]
pub async fn seed_account(pool: &SqlitePool, role: &str) -> Result<uuid::Uuid> {
    let id = uuid::Uuid::new_v4();
    sqlx::query(
        "INSERT INTO accounts (id, role, display_name, created_at, updated_at) \
         VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
    )
    .bind(id)
    .bind(role)
    .bind("Conta de teste")
    .execute(pool)
    .await
    .context("Falha ao semear conta de teste")?;
    Ok(id)
}
