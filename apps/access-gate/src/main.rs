//! Access Gate - Micro-serviço de controle de acesso e admissão
//!
//! Expõe sobre HTTP as decisões do núcleo `common-access`: emissão e
//! resgate de chaves de compartilhamento, login condicionado a assinatura,
//! acesso guardado a perfis e admissão de agendamentos.

use access_gate::{routes, state::AppState};
use anyhow::{Context, Result};
use common_access::SystemClock;
use common_db::DbConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Metadados gerados em tempo de build
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Configuração do serviço, lida do ambiente
struct GateConfig {
    bind_addr: SocketAddr,
    db_path: String,
    jwt_secret: String,
}

impl GateConfig {
    fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("GATE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8087".to_string())
            .parse()
            .context("GATE_BIND_ADDR inválido")?;
        let db_path =
            std::env::var("GATE_DB_PATH").unwrap_or_else(|_| "data/clinic.db".to_string());
        let jwt_secret =
            std::env::var("GATE_JWT_SECRET").context("GATE_JWT_SECRET não definido")?;
        Ok(Self {
            bind_addr,
            db_path,
            jwt_secret,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("access-gate v{} iniciando", built_info::PKG_VERSION);

    let config = GateConfig::from_env()?;

    let pool = common_db::init_db_pool(&DbConfig {
        db_path: config.db_path.clone(),
        max_connections: 5,
    })
    .await?;

    let state = AppState::new(pool, config.jwt_secret, Arc::new(SystemClock));
    let app = routes::router(state);

    info!("Escutando em {}", config.bind_addr);
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await
        .context("Servidor HTTP encerrou com erro")?;

    Ok(())
}
