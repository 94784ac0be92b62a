use std::collections::HashMap;

use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{TaxonomyKind, Term};

pub async fn list(db: &PgPool, kind: TaxonomyKind) -> anyhow::Result<Vec<Term>> {
    let rows = sqlx::query_as::<_, Term>(&format!(
        "SELECT id, name, created_at, updated_at FROM {} ORDER BY name ASC",
        kind.table()
    ))
    .fetch_all(db)
    .await
    .with_context(|| format!("list {}", kind.table()))?;
    Ok(rows)
}

pub async fn find(db: &PgPool, kind: TaxonomyKind, id: &str) -> anyhow::Result<Option<Term>> {
    let row = sqlx::query_as::<_, Term>(&format!(
        "SELECT id, name, created_at, updated_at FROM {} WHERE id = $1",
        kind.table()
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .with_context(|| format!("find {} {}", kind.label(), id))?;
    Ok(row)
}

/// Insert a term under a caller-chosen id; `None` when the id is taken.
pub async fn insert(
    db: &PgPool,
    kind: TaxonomyKind,
    id: &str,
    name: &str,
) -> anyhow::Result<Option<Term>> {
    let row = sqlx::query_as::<_, Term>(&format!(
        r#"
        INSERT INTO {} (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        RETURNING id, name, created_at, updated_at
        "#,
        kind.table()
    ))
    .bind(id)
    .bind(name)
    .fetch_optional(db)
    .await
    .with_context(|| format!("insert {} {}", kind.label(), id))?;
    Ok(row)
}

/// id -> display name, for resolving tool references in bulk.
pub async fn name_index(db: &PgPool, kind: TaxonomyKind) -> anyhow::Result<HashMap<String, String>> {
    let rows = sqlx::query_as::<_, (String, String)>(&format!("SELECT id, name FROM {}", kind.table()))
        .fetch_all(db)
        .await
        .with_context(|| format!("name index {}", kind.table()))?;
    Ok(rows.into_iter().collect())
}
