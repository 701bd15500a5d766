use chrono::Utc;

use super::DbPool;
use crate::models::Org;

/// Crea una nuova organizzazione
pub async fn create_org(pool: &DbPool, name: &str) -> Result<Org, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO orgs (name, created_at, updated_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(Org {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Trova organizzazione per nome
pub async fn find_by_name(pool: &DbPool, name: &str) -> Result<Option<Org>, sqlx::Error> {
    let row: Option<(i64, String)> = sqlx::query_as("SELECT id, name FROM orgs WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(id, name)| Org { id, name }))
}
