//! Common Access - Núcleo de controle de acesso e admissão da clínica
//!
//! Esta biblioteca concentra as decisões sensíveis a tempo e concorrência
//! da plataforma:
//! - Chaves de compartilhamento de uso único com janela de validade fixa
//! - Estado de assinatura (bloqueio duro de clínicas, premium de médicos)
//! - Admissão de agendamentos contra a agenda semanal do médico
//! - Fachada de autorização consultada pelos handlers de rota
//!
//! Toda mutação de estado compartilhado passa por atualizações condicionais
//! atômicas no banco; nenhum cache em processo sobrevive entre requisições.

pub mod accounts;
pub mod appointments;
pub mod clock;
pub mod error;
pub mod guard;
pub mod schedule;
pub mod share_key;
pub mod subscription;

pub use clock::{Clock, SystemClock};
pub use error::AccessError;
pub use guard::AccessGuard;
