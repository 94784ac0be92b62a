use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Comment;

pub async fn list_for_tool(db: &PgPool, tool_id: Uuid) -> anyhow::Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, Comment>(
        r#"
        SELECT c.id, c.tool_id, c.user_id,
               u.display_name AS author_name,
               c.body, c.created_at
          FROM comments c
          LEFT JOIN users u ON u.id = c.user_id
         WHERE c.tool_id = $1
         ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(tool_id)
    .fetch_all(db)
    .await
    .context("list comments")?;
    Ok(rows)
}

/// `None` when the tool does not exist.
pub async fn insert(db: &PgPool, tool_id: Uuid, user_id: Uuid, body: &str) -> anyhow::Result<Option<Comment>> {
    let row = sqlx::query_as::<_, Comment>(
        r#"
        WITH inserted AS (
            INSERT INTO comments (id, tool_id, user_id, body)
            SELECT $1, t.id, $3, $4 FROM tools t WHERE t.id = $2
            RETURNING id, tool_id, user_id, body, created_at
        )
        SELECT i.id, i.tool_id, i.user_id,
               u.display_name AS author_name,
               i.body, i.created_at
          FROM inserted i
          LEFT JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tool_id)
    .bind(user_id)
    .bind(body)
    .fetch_optional(db)
    .await
    .context("insert comment")?;
    Ok(row)
}

/// Author of a comment, if it exists.
pub async fn author_of(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Uuid>> {
    let author = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("comment author")?;
    Ok(author)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let n = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete comment")?
        .rows_affected();
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{db_state, seed_tool, seed_user, DbFixture};

    #[tokio::test]
    async fn listed_newest_first_with_author_name() {
        let Some(DbFixture { state, .. }) = db_state().await else {
            return;
        };
        let tool = seed_tool(&state).await;
        let user = seed_user(&state, false).await;

        for (body, minutes_ago) in [("oldest", 30), ("newest", 1), ("middle", 10)] {
            let c = insert(&state.db, tool.id, user.id, body).await.unwrap().unwrap();
            sqlx::query("UPDATE comments SET created_at = now() - make_interval(mins => $2) WHERE id = $1")
                .bind(c.id)
                .bind(minutes_ago)
                .execute(&state.db)
                .await
                .unwrap();
        }

        let listed = list_for_tool(&state.db, tool.id).await.unwrap();
        let bodies: Vec<&str> = listed.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["newest", "middle", "oldest"]);
        assert!(listed.iter().all(|c| c.author_name.as_deref() == Some("Tester")));
    }

    #[tokio::test]
    async fn comment_on_missing_tool_is_none() {
        let Some(DbFixture { state, .. }) = db_state().await else {
            return;
        };
        let user = seed_user(&state, false).await;
        assert!(insert(&state.db, Uuid::new_v4(), user.id, "hi").await.unwrap().is_none());
    }
}
