use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use axum_extra::extract::SignedCookieJar;
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::users::normalize_email;
use crate::app::AppState;
use crate::auth::password::verify_password;
use crate::db::models::UserProfile;
use crate::db::user_repository::UserRepository;
use crate::error::{require_text, AppError};

/// Signed cookie carrying the id of the logged-in user.
pub const SESSION_COOKIE: &str = "kbase_session";

/// Minimum length of `SESSION_SECRET`, in bytes.
pub const SESSION_SECRET_MIN_BYTES: usize = 64;

const SESSION_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Check credentials against the stored user.
///
/// An unknown email and a wrong password fail with the same message.
pub async fn process_login(
    users: &dyn UserRepository,
    request: LoginRequest,
) -> Result<UserProfile, AppError> {
    const REQUIRED: &str = "Email and password are required";

    let email = normalize_email(&require_text(request.email.as_deref(), REQUIRED)?);
    let password = match request.password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(AppError::BadRequest(REQUIRED.into())),
    };

    let Some(user) = users.find_by_email(&email).await? else {
        tracing::info!("Login rejected: unknown email");
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(user.profile())
}

/// Resolve the session cookie value to a user profile.
pub async fn process_me(
    users: &dyn UserRepository,
    session_user_id: Option<&str>,
) -> Result<UserProfile, AppError> {
    let user_id = session_user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Auth("Not logged in".into()))?;

    users
        .find_by_id(user_id)
        .await?
        .map(|u| u.profile())
        .ok_or_else(|| AppError::Auth("Session user no longer exists".into()))
}

/// Build the session signing key from the configured secret.
///
/// Without a secret a random key is used and sessions end on restart.
pub fn session_key(secret: Option<&str>) -> Result<Key, AppError> {
    match secret.filter(|s| !s.is_empty()) {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
            AppError::Internal(format!(
                "SESSION_SECRET must be at least {} bytes",
                SESSION_SECRET_MIN_BYTES
            ))
        }),
        None => {
            tracing::warn!("SESSION_SECRET not set; using a random session key");
            Ok(Key::generate())
        }
    }
}

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

/// `POST /api/v1/auth/login`
///
/// On success, sets the session cookie and returns the user profile.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(SignedCookieJar, axum::Json<LoginResponse>), AppError> {
    let user = process_login(state.user_repo.as_ref(), request).await?;

    let jar = jar.add(session_cookie(
        user.id.clone(),
        state.session_cookie_secure,
    ));

    Ok((
        jar,
        axum::Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// `GET /api/v1/auth/me`
///
/// A cookie whose signature does not verify counts as no session.
pub async fn me_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<axum::Json<UserProfile>, AppError> {
    let user_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let user = process_me(state.user_repo.as_ref(), user_id.as_deref()).await?;
    Ok(axum::Json(user))
}

/// `POST /api/v1/auth/logout`
pub async fn logout_handler(
    jar: SignedCookieJar,
) -> (SignedCookieJar, axum::Json<serde_json::Value>) {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").removal().build();

    (
        jar.remove(removal),
        axum::Json(serde_json::json!({ "message": "Logged out" })),
    )
}
