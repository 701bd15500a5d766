use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{SessionData, SessionError, SessionProvider};

struct Entry {
    data: SessionData,
    last_access: Instant,
}

/// Provider in memoria: le sessioni non sopravvivono al riavvio del processo
#[derive(Default)]
pub struct MemoryProvider {
    sessions: RwLock<HashMap<String, Entry>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, sid: &str) -> Result<SessionData, SessionError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(sid.to_string()).or_insert_with(|| Entry {
            data: SessionData::new(),
            last_access: Instant::now(),
        });
        entry.last_access = Instant::now();
        Ok(entry.data.clone())
    }

    async fn exists(&self, sid: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.read().await.contains_key(sid))
    }

    async fn write(&self, sid: &str, data: &SessionData) -> Result<(), SessionError> {
        self.sessions.write().await.insert(
            sid.to_string(),
            Entry {
                data: data.clone(),
                last_access: Instant::now(),
            },
        );
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(sid);
        Ok(())
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_access.elapsed() < max_lifetime);
        Ok((before - sessions.len()) as u64)
    }
}
