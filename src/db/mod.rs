pub mod api_keys;
pub mod orgs;
pub mod store;
pub mod users;

pub use store::{IdentityStore, SqliteStore, StoreError};

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::models::OrgRole;
use crate::utils::random_hex;

pub type DbPool = SqlitePool;

/// Inizializza il database SQLite
pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Crea il pool di connessioni
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .idle_timeout(Duration::from_secs(60))
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    // Esegui le migrazioni
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Database SQLite in memoria con una sola connessione persistente
pub async fn init_memory_db() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Esegue le migrazioni del database
async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // Organizzazioni
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orgs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Utenti
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            login TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            org_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (org_id) REFERENCES orgs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Appartenenza utenti/organizzazioni con ruolo
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS org_users (
            org_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (org_id, user_id),
            FOREIGN KEY (org_id) REFERENCES orgs(id),
            FOREIGN KEY (user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // API Keys (il segreto è salvato solo come hash)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            key TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_used_at TEXT,
            UNIQUE (org_id, name),
            FOREIGN KEY (org_id) REFERENCES orgs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Sessioni (provider "sqlite")
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            key TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            expiry INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expiry)"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_api_keys_org ON api_keys(org_id)"#)
        .execute(pool)
        .await?;

    Ok(())
}

/// Converte un timestamp RFC 3339 salvato come testo
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Admin iniziale creato al primo avvio
#[derive(Debug)]
pub struct InitialAdmin {
    pub login: String,
    /// Password generata, `None` se fornita dalla configurazione
    pub generated_password: Option<String>,
}

/// Crea l'organizzazione principale e l'utente admin se il database è vuoto
pub async fn ensure_initial_setup(
    pool: &DbPool,
    org_name: &str,
    admin_login: &str,
    admin_password: Option<&str>,
) -> Result<Option<InitialAdmin>, users::UserError> {
    let org = match orgs::find_by_name(pool, org_name).await? {
        Some(org) => org,
        None => {
            tracing::info!("Creazione organizzazione principale '{}'", org_name);
            orgs::create_org(pool, org_name).await?
        }
    };

    let (user_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        return Ok(None);
    }

    let generated_password = match admin_password {
        Some(_) => None,
        None => Some(random_hex(12)),
    };
    let password = admin_password
        .map(str::to_string)
        .or_else(|| generated_password.clone())
        .unwrap_or_default();

    let new_user = users::NewUser {
        login: admin_login.to_string(),
        email: format!("{}@localhost", admin_login),
        name: "Administrator".to_string(),
        password,
        org_id: org.id,
        role: OrgRole::Admin,
    };
    users::create_user(pool, &new_user).await?;

    Ok(Some(InitialAdmin {
        login: admin_login.to_string(),
        generated_password,
    }))
}
