//! Rotas HTTP do serviço

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod accounts;
pub mod appointments;
pub mod schedule;
pub mod share_keys;

/// Monta o roteador completo do serviço
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::register))
        .route("/login", post(accounts::login))
        .route(
            "/accounts/:id/profile",
            get(accounts::get_profile).put(accounts::update_profile),
        )
        .route(
            "/accounts/:id/notifications",
            get(accounts::list_notifications),
        )
        .route(
            "/notifications/:id/read",
            post(accounts::mark_notification_read),
        )
        .route("/share-keys", post(share_keys::issue))
        .route("/share-keys/redeem", post(share_keys::redeem))
        .route(
            "/doctors/:id/schedule",
            get(schedule::get_schedule).put(schedule::put_schedule),
        )
        .route("/appointments", post(appointments::book))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
