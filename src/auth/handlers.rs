use axum::{extract::State, routing::get, routing::post, Json, Router};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        avatar,
        dto::{
            AdminAccess, AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        extractors::{AdminUser, AuthUser},
        password::{check_policy, hash_password, verify_password},
        repo_types::User,
        services::{is_valid_email, issue_tokens, normalize_email},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/admin/access", get(admin_access))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::field("email", "Invalid email"));
    }

    if let Err(msg) = check_policy(&payload.password) {
        warn!(email = %payload.email, "password rejected by policy");
        return Err(AppError::field("password", msg));
    }

    let hash = hash_password(&payload.password)?;
    let display_name = payload
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let is_admin = state.config.is_admin_email(&payload.email);

    // The unique email index decides between concurrent sign-ups.
    let Some(mut user) =
        User::create(&state.db, &payload.email, &hash, display_name, is_admin).await?
    else {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    };

    // A missing avatar never blocks sign-up.
    match avatar::upload_avatar(&state, &user).await {
        Ok(url) => user.photo_url = Some(url),
        Err(e) => error!(error = %e, user_id = %user.id, "avatar upload failed"),
    }

    info!(user_id = %user.id, email = %user.email, is_admin, "user registered");
    Ok(Json(issue_tokens(&state.jwt, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::field("email", "Invalid email"));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state.jwt, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = state
        .jwt
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&state.jwt, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user.id).await?.ok_or_else(|| {
        error!(user_id = %user.id, "user not found");
        AppError::Unauthorized("User not found".into())
    })?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let display_name = payload.display_name.as_deref().map(str::trim);
    if display_name == Some("") {
        return Err(AppError::field("display_name", "Display name cannot be empty"));
    }
    let phone_number = payload.phone_number.as_deref().map(str::trim);

    let updated = User::update_profile(&state.db, user.id, display_name, phone_number)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(PublicUser::from(updated)))
}

pub async fn admin_access(AdminUser(_admin): AdminUser) -> Json<AdminAccess> {
    Json(AdminAccess { is_admin: true })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{app::build_app, state::AppState};

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder().method("GET").uri(uri)
    }

    #[tokio::test]
    async fn admin_gate_redirects_signed_out_navigation_home() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(
                get("/api/v1/admin/access")
                    .header(header::ACCEPT, "text/html,application/xhtml+xml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn admin_gate_redirects_non_admin_navigation_home() {
        let state = AppState::fake();
        let token = state.jwt.sign_access(Uuid::new_v4(), false).unwrap();
        let resp = build_app(state)
            .oneshot(
                get("/api/v1/admin/access")
                    .header(header::ACCEPT, "text/html")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn admin_gate_api_statuses() {
        let state = AppState::fake();
        let token = state.jwt.sign_access(Uuid::new_v4(), false).unwrap();
        let app = build_app(state);

        let signed_out = app
            .clone()
            .oneshot(get("/api/v1/admin/access").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(signed_out.status(), StatusCode::UNAUTHORIZED);

        let not_admin = app
            .oneshot(
                get("/api/v1/admin/access")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(not_admin.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_gate_admits_admin_claim() {
        let state = AppState::fake();
        let token = state.jwt.sign_access(Uuid::new_v4(), true).unwrap();
        let resp = build_app(state)
            .oneshot(
                get("/api/v1/admin/access")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["is_admin"], true);
    }

    #[tokio::test]
    async fn refresh_token_cannot_open_admin_routes() {
        let state = AppState::fake();
        let token = state.jwt.sign_refresh(Uuid::new_v4()).unwrap();
        let resp = build_app(state)
            .oneshot(
                get("/api/v1/admin/access")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let resp = build_app(AppState::fake())
            .oneshot(get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_bad_email_before_touching_db() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"nope","password":"longenough"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, v)
    }

    fn signup(email: &str, password: &str) -> Request<Body> {
        post_json(
            "/api/v1/auth/register",
            serde_json::json!({ "email": email, "password": password, "display_name": "Ada" }),
        )
    }

    fn fresh_email() -> String {
        format!("{}@toolstack.test", crate::testing::unique("signup"))
    }

    #[tokio::test]
    async fn taken_email_is_a_conflict() {
        let Some(fx) = crate::testing::db_state().await else {
            return;
        };
        let app = build_app(fx.state);
        let email = fresh_email();

        let (first, body) = send(app.clone(), signup(&email, "longenough")).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(body["user"]["email"], email.as_str());

        let (again, body) = send(app, signup(&email.to_uppercase(), "longenough")).await;
        assert_eq!(again, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_signups_with_one_email_conflict_cleanly() {
        let Some(fx) = crate::testing::db_state().await else {
            return;
        };
        let app = build_app(fx.state);

        for _ in 0..5 {
            let email = fresh_email();
            let a = tokio::spawn(send(app.clone(), signup(&email, "longenough")));
            let b = tokio::spawn(send(app.clone(), signup(&email, "longenough")));
            let mut statuses = [a.await.unwrap().0, b.await.unwrap().0];
            statuses.sort();
            assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
        }
    }

    #[tokio::test]
    async fn login_checks_the_password() {
        let Some(fx) = crate::testing::db_state().await else {
            return;
        };
        let app = build_app(fx.state);
        let email = fresh_email();
        send(app.clone(), signup(&email, "correct-horse")).await;

        let (wrong, _) = send(
            app.clone(),
            post_json("/api/v1/auth/login", serde_json::json!({ "email": email, "password": "wrong-horse" })),
        )
        .await;
        assert_eq!(wrong, StatusCode::UNAUTHORIZED);

        let (right, body) = send(
            app,
            post_json("/api/v1/auth/login", serde_json::json!({ "email": email, "password": "correct-horse" })),
        )
        .await;
        assert_eq!(right, StatusCode::OK);
        assert!(body["access_token"].as_str().is_some());
    }

    #[tokio::test]
    async fn refresh_picks_up_promotion_to_admin() {
        let Some(fx) = crate::testing::db_state().await else {
            return;
        };
        let state = fx.state;
        let app = build_app(state.clone());
        let email = fresh_email();

        let (_, body) = send(app.clone(), signup(&email, "longenough")).await;
        let access = body["access_token"].as_str().unwrap();
        assert!(!state.jwt.verify_access(access).unwrap().admin);
        let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

        sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1")
            .bind(&email)
            .execute(&state.db)
            .await
            .unwrap();

        let (status, body) = send(
            app,
            post_json("/api/v1/auth/refresh", serde_json::json!({ "refresh_token": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["is_admin"], true);
        let access = body["access_token"].as_str().unwrap();
        assert!(state.jwt.verify_access(access).unwrap().admin);
    }
}
