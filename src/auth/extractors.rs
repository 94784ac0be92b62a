use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Signed-in caller, read from a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub admin: bool,
}

/// Caller that may be anonymous. A missing header is anonymous, a bad token is not.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Caller holding the `admin` claim.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

fn authenticate(parts: &Parts, keys: &JwtKeys) -> Result<Option<AuthUser>, AppError> {
    let Some(auth_header) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let claims = keys.verify_access(token).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    Ok(Some(AuthUser {
        id: claims.sub,
        admin: claims.admin,
    }))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(parts, &keys)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(MaybeAuthUser(authenticate(parts, &keys)?))
    }
}

/// Why an admin route was not served.
#[derive(Debug)]
pub enum AdminRejection {
    /// Browser navigation: send the visitor home instead of rendering anything.
    RedirectHome,
    Denied(AppError),
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            AdminRejection::RedirectHome => Redirect::to("/").into_response(),
            AdminRejection::Denied(e) => e.into_response(),
        }
    }
}

fn wants_html(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let user = authenticate(parts, &keys);
        let denied = match user {
            Ok(Some(user)) if user.admin => return Ok(AdminUser(user)),
            Ok(Some(user)) => {
                warn!(user_id = %user.id, "admin route without admin claim");
                AppError::Forbidden("Access denied".into())
            }
            Ok(None) => AppError::Unauthorized("Sign in required".into()),
            Err(e) => e,
        };

        if wants_html(parts) {
            Err(AdminRejection::RedirectHome)
        } else {
            Err(AdminRejection::Denied(denied))
        }
    }
}
