use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::app::AppState;
use crate::db::article_repository::ArticleRepository;
use crate::db::user_repository::UserRepository;
use crate::error::{require_text, AppError};

/// Request payload for `POST /api/v1/articles/acknowledge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    pub article_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub success: bool,
    pub message: String,
}

/// Record that a user has read an article.
///
/// Both sides are updated with set semantics, so repeating the call is a
/// no-op. The two writes are independent; there is no transaction.
pub async fn process_acknowledge(
    articles: &dyn ArticleRepository,
    users: &dyn UserRepository,
    request: AcknowledgeRequest,
) -> Result<AcknowledgeResponse, AppError> {
    const REQUIRED: &str = "Article id and user id are required";

    let article_id = require_text(request.article_id.as_deref(), REQUIRED)?;
    let user_id = require_text(request.user_id.as_deref(), REQUIRED)?;

    let (article, user) = futures::try_join!(
        articles.find_by_id(&article_id),
        users.find_by_id(&user_id)
    )?;

    if article.is_none() {
        return Err(AppError::NotFound("Article not found".into()));
    }
    if user.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    if !articles.add_acknowledgment(&article_id, &user_id).await? {
        return Err(AppError::NotFound("Article not found".into()));
    }
    if !users.add_acknowledged_article(&user_id, &article_id).await? {
        tracing::warn!(%article_id, %user_id, "User vanished during acknowledgment");
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(%article_id, %user_id, "Article acknowledged");

    Ok(AcknowledgeResponse {
        success: true,
        message: "Acknowledgment recorded".to_string(),
    })
}

/// Axum handler for `POST /api/v1/articles/acknowledge`.
pub async fn acknowledge_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AcknowledgeRequest>,
) -> Result<axum::Json<AcknowledgeResponse>, AppError> {
    let response = process_acknowledge(
        state.article_repo.as_ref(),
        state.user_repo.as_ref(),
        request,
    )
    .await?;

    Ok(axum::Json(response))
}
