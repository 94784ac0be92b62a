use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Like rows are keyed `{user}_{tool}`, so a user can like a tool at most once.
pub fn like_id(user_id: Uuid, tool_id: Uuid) -> String {
    format!("{}_{}", user_id, tool_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

pub async fn is_liked(db: &PgPool, user_id: Uuid, tool_id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM likes WHERE id = $1)")
        .bind(like_id(user_id, tool_id))
        .fetch_one(db)
        .await
        .context("check like")?;
    Ok(exists)
}

pub async fn like_state(db: &PgPool, user_id: Uuid, tool_id: Uuid) -> anyhow::Result<Option<LikeState>> {
    let row = sqlx::query_as::<_, (i64, bool)>(
        r#"
        SELECT t.like_count,
               EXISTS (SELECT 1 FROM likes l WHERE l.id = $2)
          FROM tools t
         WHERE t.id = $1
        "#,
    )
    .bind(tool_id)
    .bind(like_id(user_id, tool_id))
    .fetch_optional(db)
    .await
    .context("like state")?;
    Ok(row.map(|(like_count, liked)| LikeState { liked, like_count }))
}

/// Flip the caller's like on a tool. The like row and the counter move together in
/// one transaction with the tool row locked. `None` if the tool does not exist.
pub async fn toggle_like(db: &PgPool, user_id: Uuid, tool_id: Uuid) -> anyhow::Result<Option<LikeState>> {
    let id = like_id(user_id, tool_id);
    let mut tx = db.begin().await.context("begin tx")?;

    let locked: Option<i64> =
        sqlx::query_scalar("SELECT like_count FROM tools WHERE id = $1 FOR UPDATE")
            .bind(tool_id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock tool")?;
    if locked.is_none() {
        tx.rollback().await.context("rollback tx")?;
        return Ok(None);
    }

    let removed = sqlx::query("DELETE FROM likes WHERE id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await
        .context("delete like")?
        .rows_affected();

    let state = if removed > 0 {
        let like_count: i64 = sqlx::query_scalar(
            "UPDATE tools SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1 RETURNING like_count",
        )
        .bind(tool_id)
        .fetch_one(&mut *tx)
        .await
        .context("decrement like_count")?;
        LikeState { liked: false, like_count }
    } else {
        sqlx::query("INSERT INTO likes (id, user_id, tool_id) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(user_id)
            .bind(tool_id)
            .execute(&mut *tx)
            .await
            .context("insert like")?;
        let like_count: i64 = sqlx::query_scalar(
            "UPDATE tools SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
        )
        .bind(tool_id)
        .fetch_one(&mut *tx)
        .await
        .context("increment like_count")?;
        LikeState { liked: true, like_count }
    };

    tx.commit().await.context("commit tx")?;
    Ok(Some(state))
}
