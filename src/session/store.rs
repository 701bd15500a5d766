use axum::http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{RawSession, SessionError, SessionManager};

#[derive(Default)]
struct StoreState {
    session: Option<RawSession>,
    destroyed: bool,
}

/// Sessione della singola richiesta.
///
/// Finché `start` non è stato chiamato (o se è fallito) tutte le operazioni
/// sono no-op che restituiscono valori vuoti. I cloni condividono lo stesso
/// stato, così gli handler vedono la sessione avviata dal middleware.
#[derive(Clone)]
pub struct SessionStore {
    manager: Arc<SessionManager>,
    state: Arc<Mutex<StoreState>>,
}

impl SessionStore {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// Avvia (o riprende dal cookie) la sessione. Se è già avviata non fa nulla.
    pub async fn start(&self, headers: &HeaderMap) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            return Ok(());
        }

        state.session = Some(self.manager.start(headers).await?);
        state.destroyed = false;
        Ok(())
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let state = self.state.lock().await;
        state.session.as_ref().and_then(|s| s.get(key).cloned())
    }

    pub async fn set(
        &self,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), SessionError> {
        if let Some(session) = self.state.lock().await.session.as_mut() {
            session.set(key, value.into());
        }
        Ok(())
    }

    /// ID della sessione, stringa vuota se non avviata
    pub async fn id(&self) -> String {
        let state = self.state.lock().await;
        state
            .session
            .as_ref()
            .map(|s| s.id().to_string())
            .unwrap_or_default()
    }

    /// Salva la sessione nel provider. Le chiamate successive alla prima sono no-op.
    pub async fn release(&self) -> Result<(), SessionError> {
        let session = self.state.lock().await.session.take();
        match session {
            Some(session) => self.manager.release(&session).await,
            None => Ok(()),
        }
    }

    /// Invalida la sessione (logout)
    pub async fn destroy(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            self.manager.destroy(session.id()).await?;
            state.destroyed = true;
        }
        Ok(())
    }

    /// `Set-Cookie` da allegare alla risposta, se la sessione è stata toccata
    pub async fn pending_cookie(&self) -> Option<HeaderValue> {
        let state = self.state.lock().await;
        match (&state.session, state.destroyed) {
            (Some(session), _) => self.manager.cookie(session.id()),
            (None, true) => self.manager.expired_cookie(),
            (None, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryProvider, SessionOptions, SessionProvider};
    use axum::http::header;
    use serde_json::json;

    fn manager_with(provider: Arc<MemoryProvider>) -> Arc<SessionManager> {
        SessionManager::with_provider(provider, SessionOptions::default())
    }

    #[tokio::test]
    async fn test_unstarted_store_is_noop() {
        let provider = Arc::new(MemoryProvider::new());
        let store = SessionStore::new(manager_with(provider.clone()));

        assert!(store.set("uid", 42).await.is_ok());
        assert_eq!(store.get("uid").await, None);
        assert_eq!(store.id().await, "");
        assert!(store.release().await.is_ok());
        assert!(store.destroy().await.is_ok());
        assert!(store.pending_cookie().await.is_none());
        assert!(provider.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_persists_values() {
        let provider = Arc::new(MemoryProvider::new());
        let store = SessionStore::new(manager_with(provider.clone()));

        store.start(&HeaderMap::new()).await.unwrap();
        let sid = store.id().await;
        assert_eq!(sid.len(), 32);

        store.set("uid", 42).await.unwrap();
        assert_eq!(store.get("uid").await, Some(json!(42)));
        assert!(store.pending_cookie().await.is_some());

        store.release().await.unwrap();
        assert_eq!(provider.read(&sid).await.unwrap()["uid"], json!(42));

        // Il secondo rilascio non scrive di nuovo
        provider.destroy(&sid).await.unwrap();
        store.release().await.unwrap();
        assert!(!provider.exists(&sid).await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SessionStore::new(manager_with(Arc::new(MemoryProvider::new())));
        let handler_view = store.clone();

        store.start(&HeaderMap::new()).await.unwrap();
        handler_view.set("uid", 7).await.unwrap();

        assert_eq!(store.get("uid").await, Some(json!(7)));
        assert_eq!(store.id().await, handler_view.id().await);
    }

    #[tokio::test]
    async fn test_start_twice_keeps_session() {
        let store = SessionStore::new(manager_with(Arc::new(MemoryProvider::new())));

        store.start(&HeaderMap::new()).await.unwrap();
        let first = store.id().await;
        store.start(&HeaderMap::new()).await.unwrap();

        assert_eq!(store.id().await, first);
    }

    #[tokio::test]
    async fn test_destroy_expires_cookie() {
        let provider = Arc::new(MemoryProvider::new());
        let manager = manager_with(provider.clone());

        let first = SessionStore::new(manager.clone());
        first.start(&HeaderMap::new()).await.unwrap();
        first.set("uid", 1).await.unwrap();
        let sid = first.id().await;
        first.release().await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("authgate_sess={}", sid)).unwrap(),
        );
        let second = SessionStore::new(manager);
        second.start(&headers).await.unwrap();
        assert_eq!(second.id().await, sid);

        second.destroy().await.unwrap();
        assert!(!provider.exists(&sid).await.unwrap());
        assert_eq!(second.id().await, "");

        let cookie = second.pending_cookie().await.unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
        assert!(second.release().await.is_ok());
    }
}
