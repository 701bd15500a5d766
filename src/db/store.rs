//! Interrogazioni sull'archivio di organizzazioni, utenti e API Keys usate
//! dalle strategie di autenticazione.

use async_trait::async_trait;

use super::{api_keys, orgs, users, DbPool};
use crate::db::api_keys::ApiKeyRecord;
use crate::models::{Org, SignedInUser};

/// Errori di lookup sull'archivio
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} non trovato")]
    NotFound(String),
    #[error("errore database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Archivio delle identità. Ogni query restituisce un risultato completo o un errore.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_org_by_name(&self, name: &str) -> Result<Org, StoreError>;

    async fn get_signed_in_user(&self, user_id: i64) -> Result<SignedInUser, StoreError>;

    async fn get_api_key_by_name(
        &self,
        name: &str,
        org_id: i64,
    ) -> Result<ApiKeyRecord, StoreError>;

    /// Registra l'uso di una API Key già verificata
    async fn touch_api_key(&self, id: i64) -> Result<(), StoreError>;
}

/// Implementazione su SQLite
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn get_org_by_name(&self, name: &str) -> Result<Org, StoreError> {
        orgs::find_by_name(&self.db, name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("organizzazione '{}'", name)))
    }

    async fn get_signed_in_user(&self, user_id: i64) -> Result<SignedInUser, StoreError> {
        users::get_signed_in_user(&self.db, user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("utente {}", user_id)))
    }

    async fn get_api_key_by_name(
        &self,
        name: &str,
        org_id: i64,
    ) -> Result<ApiKeyRecord, StoreError> {
        api_keys::find_by_name(&self.db, name, org_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("API Key '{}' (org {})", name, org_id)))
    }

    async fn touch_api_key(&self, id: i64) -> Result<(), StoreError> {
        api_keys::update_last_used(&self.db, id).await?;
        Ok(())
    }
}
