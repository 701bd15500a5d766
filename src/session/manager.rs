use axum::http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{
    MemoryProvider, SessionData, SessionError, SessionOptions, SessionProvider, SqliteProvider,
};
use crate::db::DbPool;
use crate::utils::{get_cookie, random_hex};

/// Sessione avviata per una richiesta
#[derive(Debug, Clone)]
pub struct RawSession {
    id: String,
    values: SessionData,
}

impl RawSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Gestore delle sessioni del processo.
///
/// Viene creato una sola volta all'avvio e condiviso tra le richieste. Alla
/// costruzione avvia il task di garbage collection, che esegue una pulizia
/// subito e poi ogni `gc_lifetime_secs` secondi finché non viene chiamato
/// [`SessionManager::shutdown`] o il manager viene rilasciato.
pub struct SessionManager {
    provider: Arc<dyn SessionProvider>,
    options: SessionOptions,
    shutdown_tx: watch::Sender<bool>,
    gc_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Crea il manager con il provider indicato dalle opzioni
    pub async fn new(options: SessionOptions, db: &DbPool) -> Result<Arc<Self>, SessionError> {
        let provider: Arc<dyn SessionProvider> = match options.provider.as_str() {
            "memory" => Arc::new(MemoryProvider::new()),
            "sqlite" if options.provider_config.is_empty() => {
                Arc::new(SqliteProvider::new(db.clone()))
            }
            "sqlite" => Arc::new(SqliteProvider::connect(&options.provider_config).await?),
            other => return Err(SessionError::UnknownProvider(other.to_string())),
        };

        Ok(Self::with_provider(provider, options))
    }

    /// Crea il manager su un provider già costruito
    pub fn with_provider(provider: Arc<dyn SessionProvider>, options: SessionOptions) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let gc_task = spawn_gc(
            provider.clone(),
            Duration::from_secs(options.gc_lifetime_secs.max(1)),
            Duration::from_secs(options.max_lifetime_secs),
            shutdown_rx,
        );

        tracing::info!(
            "Session manager avviato: provider={}, gc ogni {}s",
            provider.name(),
            options.gc_lifetime_secs.max(1)
        );

        Arc::new(Self {
            provider,
            options,
            shutdown_tx,
            gc_task: Mutex::new(Some(gc_task)),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Avvia la sessione per una richiesta: riprende quella indicata dal cookie
    /// se esiste ancora, altrimenti ne crea una nuova
    pub async fn start(&self, headers: &HeaderMap) -> Result<RawSession, SessionError> {
        if let Some(sid) = get_cookie(headers, &self.options.cookie_name) {
            if is_valid_sid(&sid) && self.provider.exists(&sid).await? {
                let values = self.provider.read(&sid).await?;
                return Ok(RawSession {
                    id: sid,
                    values,
                });
            }
        }

        let sid = random_hex(16);
        let values = self.provider.read(&sid).await?;
        Ok(RawSession {
            id: sid,
            values,
        })
    }

    /// Salva il contenuto della sessione nel provider
    pub async fn release(&self, session: &RawSession) -> Result<(), SessionError> {
        self.provider.write(&session.id, &session.values).await
    }

    pub async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.provider.destroy(sid).await
    }

    /// Header `Set-Cookie` che lega il client alla sessione
    pub fn cookie(&self, sid: &str) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path={}; HttpOnly; SameSite=Lax",
            self.options.cookie_name, sid, self.options.cookie_path
        );
        if self.options.cookie_lifetime_secs > 0 {
            cookie.push_str(&format!("; Max-Age={}", self.options.cookie_lifetime_secs));
        }
        if self.options.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// Header `Set-Cookie` che rimuove il cookie di sessione dal client
    pub fn expired_cookie(&self) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}=; Path={}; HttpOnly; SameSite=Lax; Max-Age=0",
            self.options.cookie_name, self.options.cookie_path
        );
        if self.options.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// Ferma il task di garbage collection e ne attende la terminazione
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.gc_task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::warn!("Task GC sessioni terminato con errore: {}", e);
            }
        }
    }
}

fn is_valid_sid(sid: &str) -> bool {
    sid.len() == 32 && sid.chars().all(|c| c.is_ascii_hexdigit())
}

fn spawn_gc(
    provider: Arc<dyn SessionProvider>,
    interval: Duration,
    max_lifetime: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match provider.gc(max_lifetime).await {
                        Ok(0) => {}
                        Ok(count) => tracing::debug!("GC sessioni: {} sessioni scadute eliminate", count),
                        Err(e) => tracing::error!("Errore GC sessioni: {}", e),
                    }
                }
                // Shutdown richiesto oppure manager rilasciato
                _ = shutdown_rx.changed() => {
                    tracing::debug!("GC sessioni fermata");
                    break;
                }
            }
        }
    })
}
