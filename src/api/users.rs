use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::responses::{DeleteResponse, IdQuery};
use crate::app::AppState;
use crate::auth::models::Role;
use crate::auth::password::hash_password;
use crate::db::article_repository::ArticleRepository;
use crate::db::models::{new_id, User, UserChanges, UserProfile};
use crate::db::user_repository::{duplicate_email, UserRepository};
use crate::error::{optional_text, require_text, AppError};

/// Request payload for creating a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Request payload for updating a user. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Emails are compared and stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_role(role: &str) -> Result<Role, AppError> {
    Role::from_str_ci(role)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role '{}'", role.trim())))
}

fn require_password(password: Option<&str>) -> Result<&str, AppError> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(AppError::BadRequest("Password is required".into())),
    }
}

pub async fn process_get_user(
    users: &dyn UserRepository,
    id: &str,
) -> Result<UserProfile, AppError> {
    users
        .find_by_id(id)
        .await?
        .map(|u| u.profile())
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn process_list_users(users: &dyn UserRepository) -> Result<Vec<UserProfile>, AppError> {
    Ok(users.list_all().await?.iter().map(User::profile).collect())
}

pub async fn process_create_user(
    users: &dyn UserRepository,
    request: CreateUserRequest,
) -> Result<UserProfile, AppError> {
    const REQUIRED: &str = "Name, email and password are required";

    let name = require_text(request.name.as_deref(), REQUIRED)?;
    let email = normalize_email(&require_text(request.email.as_deref(), REQUIRED)?);
    let password = require_password(request.password.as_deref())
        .map_err(|_| AppError::BadRequest(REQUIRED.into()))?;
    let role = match request.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(role) => parse_role(role)?,
        None => Role::default(),
    };

    if users.find_by_email(&email).await?.is_some() {
        return Err(duplicate_email());
    }

    let now = Utc::now();
    let user = User {
        id: new_id(),
        email,
        name,
        password_hash: hash_password(password)?,
        role,
        acknowledged_articles: vec![],
        created_at: now,
        updated_at: now,
    };

    users.insert(&user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "Created user");

    Ok(user.profile())
}

pub async fn process_update_user(
    users: &dyn UserRepository,
    request: UpdateUserRequest,
) -> Result<UserProfile, AppError> {
    let id = require_text(request.id.as_deref(), "User id is required")?;

    let email = optional_text(request.email, "Email cannot be empty")?
        .map(|e| normalize_email(&e));
    if let Some(email) = &email {
        if let Some(existing) = users.find_by_email(email).await? {
            if existing.id != id {
                return Err(duplicate_email());
            }
        }
    }

    let password_hash = match request.password.as_deref() {
        Some(p) => Some(hash_password(require_password(Some(p))?)?),
        None => None,
    };

    let changes = UserChanges {
        name: optional_text(request.name, "Name cannot be empty")?,
        email,
        password_hash,
        role: request.role.as_deref().map(parse_role).transpose()?,
        updated_at: Utc::now(),
    };

    let user = users
        .update(&id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %id, "Updated user");
    Ok(user.profile())
}

/// Delete a user and withdraw their acknowledgments from every article.
pub async fn process_delete_user(
    users: &dyn UserRepository,
    articles: &dyn ArticleRepository,
    id: Option<&str>,
) -> Result<DeleteResponse, AppError> {
    let id = require_text(id, "User id is required")?;

    if !users.delete(&id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    let cleaned = articles.remove_acknowledgments_by(&id).await?;
    tracing::info!(user_id = %id, articles_cleaned = cleaned, "Deleted user");

    Ok(DeleteResponse::new("User deleted successfully", &id))
}

/// Axum handler for `GET /api/v1/users`.
pub async fn get_users_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) {
        let user = process_get_user(state.user_repo.as_ref(), id).await?;
        return Ok(axum::Json(user).into_response());
    }

    let list = process_list_users(state.user_repo.as_ref()).await?;
    Ok(axum::Json(list).into_response())
}

/// Axum handler for `POST /api/v1/users`.
pub async fn create_user_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<axum::Json<UserProfile>, AppError> {
    let user = process_create_user(state.user_repo.as_ref(), request).await?;
    Ok(axum::Json(user))
}

/// Axum handler for `PUT /api/v1/users`.
pub async fn update_user_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<axum::Json<UserProfile>, AppError> {
    let user = process_update_user(state.user_repo.as_ref(), request).await?;
    Ok(axum::Json(user))
}

/// Axum handler for `DELETE /api/v1/users?id=...`.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<axum::Json<DeleteResponse>, AppError> {
    let response = process_delete_user(
        state.user_repo.as_ref(),
        state.article_repo.as_ref(),
        query.id.as_deref(),
    )
    .await?;

    Ok(axum::Json(response))
}
