//! Fonte de tempo injetável
//!
//! Toda lógica de expiração recebe o instante atual de fora, o que permite
//! testar janelas de validade sem dormir nem depender do relógio da máquina.

use chrono::{DateTime, Utc};

/// Fonte do instante atual
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Relógio do sistema, usado em produção
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Relógio fixo controlável, para testes
#[cfg(any(test, feature = "test-utils"))]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// Avança o relógio pela duração informada
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
