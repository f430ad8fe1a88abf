//! Estado compartilhado dos handlers

use common_access::accounts::AccountStore;
use common_access::appointments::AppointmentStore;
use common_access::schedule::ScheduleStore;
use common_access::share_key::ShareKeyStore;
use common_access::subscription::SubscriptionLedger;
use common_access::{AccessGuard, Clock};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Estado injetado em todas as rotas
///
/// Nenhum cache de chaves ou assinaturas vive aqui: cada decisão vai ao
/// banco, que é quem garante as atualizações condicionais atômicas.
#[derive(Clone)]
pub struct AppState {
    pub guard: AccessGuard,
    pub accounts: AccountStore,
    pub ledger: SubscriptionLedger,
    pub share_keys: ShareKeyStore,
    pub schedules: ScheduleStore,
    pub appointments: AppointmentStore,
    pub clock: Arc<dyn Clock>,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt_secret: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            guard: AccessGuard::new(pool.clone()),
            accounts: AccountStore::new(pool.clone()),
            ledger: SubscriptionLedger::new(pool.clone()),
            share_keys: ShareKeyStore::new(pool.clone()),
            schedules: ScheduleStore::new(pool.clone()),
            appointments: AppointmentStore::new(pool),
            clock,
            jwt_secret,
        }
    }
}
