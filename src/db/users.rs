use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{parse_timestamp, DbPool};
use crate::models::{OrgRole, SignedInUser};

/// Errori delle operazioni sugli utenti
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("errore database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("errore hash password: {0}")]
    PasswordHash(String),
}

/// Utente nel database
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub name: String,
    /// Organizzazione corrente dell'utente
    pub org_id: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Dati per la creazione di un utente
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub org_id: i64,
    pub role: OrgRole,
}

/// Hash Argon2 della password in formato PHC (il salt è incluso nella stringa)
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// Verifica una password contro l'hash PHC salvato
pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserError> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserError::PasswordHash(e.to_string())),
    }
}

/// Crea un utente e lo associa alla sua organizzazione con il ruolo indicato
pub async fn create_user(pool: &DbPool, new_user: &NewUser) -> Result<User, UserError> {
    let now = Utc::now();
    let password_hash = hash_password(&new_user.password)?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (login, email, name, password_hash, org_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new_user.login)
    .bind(&new_user.email)
    .bind(&new_user.name)
    .bind(&password_hash)
    .bind(new_user.org_id)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_rowid();

    sqlx::query(
        r#"
        INSERT INTO org_users (org_id, user_id, role, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(new_user.org_id)
    .bind(id)
    .bind(new_user.role.to_string())
    .bind(now.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(User {
        id,
        login: new_user.login.clone(),
        email: new_user.email.clone(),
        name: new_user.name.clone(),
        org_id: new_user.org_id,
        created_at: now,
    })
}

/// Verifica login (o email) e password, restituisce l'utente se valide
#[allow(clippy::type_complexity)]
pub async fn authenticate(
    pool: &DbPool,
    login_or_email: &str,
    password: &str,
) -> Result<Option<User>, UserError> {
    let row: Option<(i64, String, String, String, i64, String, String)> =
        sqlx::query_as(
            r#"
            SELECT id, login, email, name, org_id, created_at, password_hash
            FROM users
            WHERE login = ? OR email = ?
            "#,
        )
        .bind(login_or_email)
        .bind(login_or_email)
        .fetch_optional(pool)
        .await?;

    let Some((id, login, email, name, org_id, created_at, password_hash)) = row else {
        return Ok(None);
    };

    if !verify_password(password, &password_hash)? {
        return Ok(None);
    }

    Ok(Some(User {
        id,
        login,
        email,
        name,
        org_id,
        created_at: parse_timestamp(&created_at),
    }))
}

/// Costruisce l'identità completa di un utente nella sua organizzazione corrente
#[allow(clippy::type_complexity)]
pub async fn get_signed_in_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Option<SignedInUser>, sqlx::Error> {
    let row: Option<(
        i64,
        String,
        String,
        String,
        i64,
        Option<String>,
        Option<String>,
    )> = sqlx::query_as(
        r#"
        SELECT u.id, u.login, u.email, u.name, u.org_id, o.name, ou.role
        FROM users u
        LEFT JOIN orgs o ON o.id = u.org_id
        LEFT JOIN org_users ou ON ou.org_id = u.org_id AND ou.user_id = u.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, login, email, name, org_id, org_name, role)| SignedInUser {
            user_id: id,
            org_id,
            org_role: role.as_deref().map(OrgRole::from),
            org_name: org_name.unwrap_or_default(),
            api_key_id: 0,
            login,
            email,
            name,
        },
    ))
}
