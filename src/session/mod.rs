//! Sessioni lato server: provider intercambiabili, manager con garbage
//! collection periodica e adattatore per richiesta.

pub mod manager;
pub mod memory;
pub mod provider;
pub mod sqlite;
pub mod store;

pub use manager::{RawSession, SessionManager};
pub use memory::MemoryProvider;
pub use provider::{SessionData, SessionProvider};
pub use sqlite::SqliteProvider;
pub use store::SessionStore;

/// Chiave di sessione che contiene l'ID dell'utente autenticato
pub const SESS_KEY_USERID: &str = "uid";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("provider di sessione sconosciuto: {0}")]
    UnknownProvider(String),
    #[error("errore database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("dati di sessione non validi: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Opzioni del gestore di sessioni
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Backend: "memory" o "sqlite"
    pub provider: String,
    /// Stringa di connessione del provider; vuota per riusare il database principale
    pub provider_config: String,
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_secure: bool,
    /// Durata del cookie in secondi, 0 per un cookie di sessione del browser
    pub cookie_lifetime_secs: u64,
    /// Intervallo tra due cicli di garbage collection, in secondi
    pub gc_lifetime_secs: u64,
    /// Inattività dopo la quale una sessione viene eliminata dalla GC, in secondi
    pub max_lifetime_secs: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            provider_config: String::new(),
            cookie_name: "authgate_sess".to_string(),
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_lifetime_secs: 86400,
            gc_lifetime_secs: 86400,
            max_lifetime_secs: 86400,
        }
    }
}
