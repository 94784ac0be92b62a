use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{DeletedTool, Tool, ToolDraft};

const TOOL_COLUMNS: &str = "id, name, description, category_id, ecosystem_id, github_link, \
                            github_stars, website_url, logo_url, badges, like_count, \
                            created_at, updated_at";

/// Whole collection in store order.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Tool>> {
    let rows = sqlx::query_as::<_, Tool>(&format!(
        "SELECT {TOOL_COLUMNS} FROM tools ORDER BY created_at ASC, id ASC"
    ))
    .fetch_all(db)
    .await
    .context("list tools")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Tool>> {
    let row = sqlx::query_as::<_, Tool>(&format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find tool")?;
    Ok(row)
}

/// Insert with `like_count = 0` and server timestamps.
pub async fn insert(db: &PgPool, draft: &ToolDraft) -> anyhow::Result<Tool> {
    let row = sqlx::query_as::<_, Tool>(&format!(
        r#"
        INSERT INTO tools (id, name, description, category_id, ecosystem_id, github_link,
                           github_stars, website_url, logo_url, badges, like_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0)
        RETURNING {TOOL_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.category_id)
    .bind(&draft.ecosystem_id)
    .bind(&draft.github_link)
    .bind(draft.github_stars)
    .bind(&draft.website_url)
    .bind(&draft.logo_url)
    .bind(&draft.badges)
    .fetch_one(db)
    .await
    .context("insert tool")?;
    Ok(row)
}

/// Overwrite the editable fields; `like_count` and `created_at` are untouched.
pub async fn update(db: &PgPool, id: Uuid, draft: &ToolDraft) -> anyhow::Result<Option<Tool>> {
    let row = sqlx::query_as::<_, Tool>(&format!(
        r#"
        UPDATE tools
           SET name = $2, description = $3, category_id = $4, ecosystem_id = $5,
               github_link = $6, github_stars = $7, website_url = $8, logo_url = $9,
               badges = $10, updated_at = now()
         WHERE id = $1
        RETURNING {TOOL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.category_id)
    .bind(&draft.ecosystem_id)
    .bind(&draft.github_link)
    .bind(draft.github_stars)
    .bind(&draft.website_url)
    .bind(&draft.logo_url)
    .bind(&draft.badges)
    .fetch_optional(db)
    .await
    .context("update tool")?;
    Ok(row)
}

/// Delete a tool with its likes and comments as one commit. `None` if the tool is missing.
pub async fn delete_with_relations(db: &PgPool, id: Uuid) -> anyhow::Result<Option<DeletedTool>> {
    let mut tx = db.begin().await.context("begin tx")?;

    let likes = sqlx::query("DELETE FROM likes WHERE tool_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete likes")?
        .rows_affected();
    let comments = sqlx::query("DELETE FROM comments WHERE tool_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete comments")?
        .rows_affected();
    let logo_url: Option<String> =
        sqlx::query_scalar("DELETE FROM tools WHERE id = $1 RETURNING logo_url")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("delete tool")?;

    let Some(logo_url) = logo_url else {
        tx.rollback().await.context("rollback tx")?;
        return Ok(None);
    };
    tx.commit().await.context("commit tx")?;
    Ok(Some(DeletedTool {
        likes,
        comments,
        logo_url,
    }))
}
