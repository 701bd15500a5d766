pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::db::DbPool;
use crate::middleware::auth::{with_request_context, AuthState};

/// Router completo dell'API.
///
/// Health e metriche restano fuori dal middleware di autenticazione, così le
/// sonde non creano sessioni.
pub fn create_router(db: DbPool, auth_state: AuthState) -> Router {
    let public = health::router(
        auth_state.sessions.provider_name(),
        auth_state.metrics.clone(),
    );

    let api = Router::new()
        .merge(auth::router(db.clone()))
        .merge(admin::router(db));

    with_request_context(api, auth_state).merge(public)
}
