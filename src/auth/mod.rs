//! Risoluzione dell'identità di una richiesta.
//!
//! Tre strategie in ordine fisso: API Key, cookie di sessione, accesso anonimo.
//! La prima che gestisce la richiesta (accettandola o rifiutandola) chiude la
//! catena.

pub mod anonymous;
pub mod api_key;
pub mod credential;
pub mod resolver;
pub mod session;

pub use anonymous::AnonymousStrategy;
pub use api_key::ApiKeyStrategy;
pub use credential::{ApiKeyCredential, CredentialError};
pub use resolver::AuthResolver;
pub use session::SessionCookieStrategy;

use async_trait::async_trait;
use axum::response::Response;

use crate::middleware::context::RequestContext;

/// Esito di una strategia
#[derive(Debug)]
pub enum AuthOutcome {
    /// Nessuna credenziale di questo tipo: si passa alla strategia successiva
    Declined,
    /// Identità stabilita nel contesto
    Accepted,
    /// Credenziale presente ma non valida: la risposta di errore è già pronta
    Rejected(Response),
}

#[async_trait]
pub trait AuthStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_authenticate(&self, ctx: &mut RequestContext) -> AuthOutcome;
}
