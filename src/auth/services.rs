use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo_types::User,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue a fresh access/refresh pair; the admin claim comes from the stored user.
pub(crate) fn issue_tokens(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    let access_token = keys.sign_access(user.id, user.is_admin)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    })
}
