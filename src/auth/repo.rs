use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, photo_url, email_verified, \
                            is_anonymous, phone_number, is_admin, created_at, updated_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password; `None` when the email is already taken.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
        is_admin: bool,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .bind(is_admin)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn set_photo_url(db: &PgPool, id: Uuid, photo_url: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET photo_url = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(photo_url)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Update profile fields; `None` keeps the stored value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        display_name: Option<&str>,
        phone_number: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET display_name = COALESCE($2, display_name),
                   phone_number = COALESCE($3, phone_number),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(display_name)
        .bind(phone_number)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
