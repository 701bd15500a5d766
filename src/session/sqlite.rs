use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::{SessionData, SessionError, SessionProvider};
use crate::db::{self, DbPool};

/// Provider su SQLite, tabella `sessions`
#[derive(Clone)]
pub struct SqliteProvider {
    db: DbPool,
}

impl SqliteProvider {
    /// Usa un pool già migrato (tipicamente il database principale)
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Apre un database dedicato alle sessioni
    pub async fn connect(database_url: &str) -> Result<Self, SessionError> {
        let db = db::init_db(database_url).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl SessionProvider for SqliteProvider {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn read(&self, sid: &str) -> Result<SessionData, SessionError> {
        let now = Utc::now().timestamp();

        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM sessions WHERE key = ?")
            .bind(sid)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some((data,)) => {
                sqlx::query("UPDATE sessions SET expiry = ? WHERE key = ?")
                    .bind(now)
                    .bind(sid)
                    .execute(&self.db)
                    .await?;
                Ok(serde_json::from_str(&data)?)
            }
            None => {
                sqlx::query("INSERT OR IGNORE INTO sessions (key, data, expiry) VALUES (?, '{}', ?)")
                    .bind(sid)
                    .bind(now)
                    .execute(&self.db)
                    .await?;
                Ok(SessionData::new())
            }
        }
    }

    async fn exists(&self, sid: &str) -> Result<bool, SessionError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE key = ?")
            .bind(sid)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn write(&self, sid: &str, data: &SessionData) -> Result<(), SessionError> {
        let data = serde_json::to_string(data)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (key, data, expiry) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET data = excluded.data, expiry = excluded.expiry
            "#,
        )
        .bind(sid)
        .bind(data)
        .bind(Utc::now().timestamp())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE key = ?")
            .bind(sid)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<u64, SessionError> {
        let max_lifetime = i64::try_from(max_lifetime.as_secs()).unwrap_or(i64::MAX);
        let cutoff = Utc::now().timestamp().saturating_sub(max_lifetime);

        let result = sqlx::query("DELETE FROM sessions WHERE expiry < ?")
            .bind(cutoff)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_roundtrip_through_database() {
        let provider = SqliteProvider::new(init_memory_db().await.unwrap());

        assert!(provider.read("sid").await.unwrap().is_empty());
        assert!(provider.exists("sid").await.unwrap());

        let mut data = SessionData::new();
        data.insert("uid".to_string(), json!(7));
        provider.write("sid", &data).await.unwrap();

        assert_eq!(provider.read("sid").await.unwrap(), data);

        provider.destroy("sid").await.unwrap();
        assert!(!provider.exists("sid").await.unwrap());
    }

    #[tokio::test]
    async fn test_gc_only_removes_stale_rows() {
        let pool = init_memory_db().await.unwrap();
        let provider = SqliteProvider::new(pool.clone());

        provider.read("fresh").await.unwrap();
        provider.read("stale").await.unwrap();
        sqlx::query("UPDATE sessions SET expiry = ? WHERE key = 'stale'")
            .bind(Utc::now().timestamp() - 7200)
            .execute(&pool)
            .await
            .unwrap();

        let removed = provider.gc(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(provider.exists("fresh").await.unwrap());
        assert!(!provider.exists("stale").await.unwrap());
    }

    #[tokio::test]
    async fn test_gc_with_huge_lifetime_keeps_everything() {
        let pool = init_memory_db().await.unwrap();
        let provider = SqliteProvider::new(pool.clone());

        provider.read("ancient").await.unwrap();
        sqlx::query("UPDATE sessions SET expiry = 0 WHERE key = 'ancient'")
            .execute(&pool)
            .await
            .unwrap();

        let removed = provider.gc(Duration::from_secs(u64::MAX)).await.unwrap();
        assert_eq!(removed, 0);
        assert!(provider.exists("ancient").await.unwrap());
    }
}
