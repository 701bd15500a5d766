use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_timestamp, DbPool};
use crate::auth::credential;
use crate::models::OrgRole;

/// API Key nel database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyRecord {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    /// Hash del segreto
    #[serde(skip_serializing)]
    pub key: String,
    pub role: OrgRole,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_used_at: Option<DateTime<Utc>>,
}

type ApiKeyRow = (i64, i64, String, String, String, String, Option<String>);

fn from_row(row: ApiKeyRow) -> ApiKeyRecord {
    let (id, org_id, name, key, role, created_at, last_used_at) = row;
    ApiKeyRecord {
        id,
        org_id,
        name,
        key,
        role: OrgRole::from(role.as_str()),
        created_at: parse_timestamp(&created_at),
        last_used_at: last_used_at.as_deref().map(parse_timestamp),
    }
}

/// Crea una nuova API Key, restituisce il record e la chiave in chiaro
pub async fn create_api_key(
    pool: &DbPool,
    org_id: i64,
    name: &str,
    role: OrgRole,
) -> Result<(ApiKeyRecord, String), sqlx::Error> {
    let generated = credential::generate(org_id, name);
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO api_keys (org_id, name, key, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(org_id)
    .bind(name)
    .bind(&generated.hashed_key)
    .bind(role.to_string())
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    let record = ApiKeyRecord {
        id: result.last_insert_rowid(),
        org_id,
        name: name.to_string(),
        key: generated.hashed_key,
        role,
        created_at: now,
        last_used_at: None,
    };

    Ok((record, generated.client_secret))
}

/// Trova API Key per nome all'interno di un'organizzazione
pub async fn find_by_name(
    pool: &DbPool,
    name: &str,
    org_id: i64,
) -> Result<Option<ApiKeyRecord>, sqlx::Error> {
    let row: Option<ApiKeyRow> = sqlx::query_as(
        r#"
        SELECT id, org_id, name, key, role, created_at, last_used_at
        FROM api_keys
        WHERE name = ? AND org_id = ?
        "#,
    )
    .bind(name)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

/// Lista le API Keys di un'organizzazione
pub async fn list_by_org(pool: &DbPool, org_id: i64) -> Result<Vec<ApiKeyRecord>, sqlx::Error> {
    let rows: Vec<ApiKeyRow> = sqlx::query_as(
        r#"
        SELECT id, org_id, name, key, role, created_at, last_used_at
        FROM api_keys
        WHERE org_id = ?
        ORDER BY name ASC
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_row).collect())
}

/// Aggiorna timestamp ultimo uso
pub async fn update_last_used(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Elimina API Key di un'organizzazione
pub async fn delete_api_key(pool: &DbPool, org_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM api_keys WHERE id = ? AND org_id = ?")
        .bind(id)
        .bind(org_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential::ApiKeyCredential;
    use crate::db::{init_memory_db, orgs};

    #[tokio::test]
    async fn test_create_and_verify_api_key() {
        let pool = init_memory_db().await.unwrap();
        let org = orgs::create_org(&pool, "Acme").await.unwrap();

        let (record, secret) = create_api_key(&pool, org.id, "ci", OrgRole::Editor)
            .await
            .unwrap();

        let decoded = ApiKeyCredential::decode(&secret).unwrap();
        assert_eq!(decoded.name, "ci");
        assert_eq!(decoded.org_id, org.id);

        let stored = find_by_name(&pool, &decoded.name, decoded.org_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.role, OrgRole::Editor);
        assert!(decoded.is_valid(&stored.key));
    }

    #[tokio::test]
    async fn test_names_are_scoped_to_org() {
        let pool = init_memory_db().await.unwrap();
        let acme = orgs::create_org(&pool, "Acme").await.unwrap();
        let other = orgs::create_org(&pool, "Other").await.unwrap();

        create_api_key(&pool, acme.id, "ci", OrgRole::Viewer)
            .await
            .unwrap();
        create_api_key(&pool, other.id, "ci", OrgRole::Admin)
            .await
            .unwrap();
        assert!(create_api_key(&pool, acme.id, "ci", OrgRole::Viewer)
            .await
            .is_err());

        assert_eq!(list_by_org(&pool, acme.id).await.unwrap().len(), 1);
        let found = find_by_name(&pool, "ci", other.id).await.unwrap().unwrap();
        assert_eq!(found.role, OrgRole::Admin);
    }

    #[tokio::test]
    async fn test_delete_and_last_used() {
        let pool = init_memory_db().await.unwrap();
        let org = orgs::create_org(&pool, "Acme").await.unwrap();
        let (record, _) = create_api_key(&pool, org.id, "ci", OrgRole::Viewer)
            .await
            .unwrap();

        update_last_used(&pool, record.id).await.unwrap();
        let found = find_by_name(&pool, "ci", org.id).await.unwrap().unwrap();
        assert!(found.last_used_at.is_some());

        // Non si può eliminare una chiave di un'altra organizzazione
        assert!(!delete_api_key(&pool, org.id + 1, record.id).await.unwrap());
        assert!(delete_api_key(&pool, org.id, record.id).await.unwrap());
        assert!(find_by_name(&pool, "ci", org.id).await.unwrap().is_none());
    }
}
