use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use super::repo_types::User;
use crate::state::AppState;

pub fn avatar_key(user_id: Uuid) -> String {
    format!("users_avatar/{}.svg", user_id)
}

/// Up to two uppercase initials taken from the display name, or the email's local part.
fn initials(display_name: Option<&str>, email: &str) -> String {
    let source = display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email));

    let mut out: String = source
        .split(|c: char| c.is_whitespace() || c == '.' || c == '_' || c == '-')
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if out.is_empty() {
        out.push('?');
    }
    out
}

/// Deterministic initials avatar; the background hue is derived from the user id.
pub fn render_avatar(user_id: Uuid, display_name: Option<&str>, email: &str) -> String {
    let bytes = user_id.as_bytes();
    let hue = (u16::from(bytes[0]) << 8 | u16::from(bytes[1])) % 360;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128">"#,
            r#"<rect width="128" height="128" rx="64" fill="hsl({hue}, 55%, 45%)"/>"#,
            r#"<text x="50%" y="50%" dy=".35em" text-anchor="middle" font-family="sans-serif" "#,
            r##"font-size="52" fill="#ffffff">{initials}</text></svg>"##
        ),
        hue = hue,
        initials = initials(display_name, email),
    )
}

/// Upload a generated avatar and record its URL on the user.
pub async fn upload_avatar(st: &AppState, user: &User) -> anyhow::Result<String> {
    let key = avatar_key(user.id);
    let svg = render_avatar(user.id, user.display_name.as_deref(), &user.email);
    st.storage
        .put_object(&key, Bytes::from(svg), "image/svg+xml")
        .await
        .with_context(|| format!("put_object {}", key))?;
    let url = st.storage.object_url(&key);
    User::set_photo_url(&st.db, user.id, &url).await?;
    Ok(url)
}
