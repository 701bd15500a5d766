use axum::response::Response;
use std::sync::Arc;

use super::{AnonymousStrategy, ApiKeyStrategy, AuthOutcome, AuthStrategy, SessionCookieStrategy};
use crate::config::AnonymousSettings;
use crate::db::IdentityStore;
use crate::middleware::context::RequestContext;

/// Esegue le strategie in ordine e si ferma alla prima che gestisce la richiesta
pub struct AuthResolver {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthResolver {
    /// Catena standard: API Key, cookie di sessione, accesso anonimo
    pub fn new(store: Arc<dyn IdentityStore>, anonymous: AnonymousSettings) -> Self {
        Self::with_strategies(vec![
            Box::new(ApiKeyStrategy::new(store.clone())),
            Box::new(SessionCookieStrategy::new(store.clone())),
            Box::new(AnonymousStrategy::new(store, anonymous)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    /// Risolve l'identità nel contesto.
    ///
    /// Restituisce la risposta di errore se una strategia ha rifiutato la
    /// richiesta; `None` se la richiesta può proseguire, anche senza identità.
    pub async fn resolve(&self, ctx: &mut RequestContext) -> Option<Response> {
        for strategy in &self.strategies {
            match strategy.try_authenticate(ctx).await {
                AuthOutcome::Declined => continue,
                AuthOutcome::Accepted => {
                    tracing::debug!(
                        "Richiesta {} autenticata da '{}' (org {})",
                        ctx.uri.path(),
                        strategy.name(),
                        ctx.signed_in_user.org_id
                    );
                    return None;
                }
                AuthOutcome::Rejected(response) => {
                    tracing::debug!(
                        "Richiesta {} rifiutata da '{}'",
                        ctx.uri.path(),
                        strategy.name()
                    );
                    return Some(response);
                }
            }
        }

        tracing::debug!("Richiesta {} senza identità", ctx.uri.path());
        None
    }
}
