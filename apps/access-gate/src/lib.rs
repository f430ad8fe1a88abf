//! Access Gate - biblioteca do micro-serviço de controle de acesso
//!
//! O binário em `main.rs` só cuida de configuração e do laço do servidor;
//! o roteador e os handlers vivem aqui para serem exercitáveis em testes.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
