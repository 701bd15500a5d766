use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::SessionError;

/// Contenuto di una sessione
pub type SessionData = HashMap<String, serde_json::Value>;

/// Backend di persistenza delle sessioni.
///
/// Le implementazioni sono condivise tra tutte le richieste e il task di GC,
/// quindi devono gestire da sole la concorrenza interna.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Legge una sessione, creandola vuota se non esiste, e ne aggiorna l'ultimo accesso
    async fn read(&self, sid: &str) -> Result<SessionData, SessionError>;

    async fn exists(&self, sid: &str) -> Result<bool, SessionError>;

    /// Salva il contenuto della sessione
    async fn write(&self, sid: &str, data: &SessionData) -> Result<(), SessionError>;

    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Elimina le sessioni inattive da più di `max_lifetime`, restituisce quante
    async fn gc(&self, max_lifetime: Duration) -> Result<u64, SessionError>;
}
