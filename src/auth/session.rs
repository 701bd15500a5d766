use async_trait::async_trait;
use std::sync::Arc;

use super::{AuthOutcome, AuthStrategy};
use crate::db::IdentityStore;
use crate::middleware::context::RequestContext;
use crate::session::SESS_KEY_USERID;

/// Autenticazione tramite cookie di sessione.
///
/// Gli errori non sono mai terminali: una sessione mancante o scaduta fa
/// proseguire la richiesta verso l'accesso anonimo.
pub struct SessionCookieStrategy {
    store: Arc<dyn IdentityStore>,
}

impl SessionCookieStrategy {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthStrategy for SessionCookieStrategy {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn try_authenticate(&self, ctx: &mut RequestContext) -> AuthOutcome {
        if let Err(e) = ctx.session.start(&ctx.headers).await {
            tracing::error!("Impossibile avviare la sessione: {}", e);
            return AuthOutcome::Declined;
        }

        let user_id = ctx
            .session
            .get(SESS_KEY_USERID)
            .await
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        if user_id == 0 {
            return AuthOutcome::Declined;
        }

        match self.store.get_signed_in_user(user_id).await {
            Ok(user) => {
                ctx.signed_in_user = user;
                ctx.is_signed_in = true;
                AuthOutcome::Accepted
            }
            Err(e) => {
                tracing::error!("Impossibile caricare l'utente {}: {}", user_id, e);
                AuthOutcome::Declined
            }
        }
    }
}
