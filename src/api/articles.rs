use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::responses::{DeleteResponse, IdQuery};
use crate::app::AppState;
use crate::db::article_repository::ArticleRepository;
use crate::db::models::{display_date, new_id, Article, ArticleChanges};
use crate::db::section_repository::SectionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::{optional_text, require_text, AppError};
use crate::rendering::html::sanitize_article_html;

const DEFAULT_AUTHOR: &str = "Anonymous";

/// Query parameters for `GET /api/v1/articles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
    /// Return a single article (and count a view).
    pub id: Option<String>,
    /// Restrict the listing to one section.
    pub section: Option<String>,
}

/// Request payload for creating an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_id: Option<String>,
    pub author: Option<String>,
}

/// Request payload for updating an article. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_id: Option<String>,
}

async fn ensure_section_exists(
    sections: &dyn SectionRepository,
    section_id: &str,
) -> Result<(), AppError> {
    if sections.find_by_id(section_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Section '{}' does not exist",
            section_id
        )));
    }
    Ok(())
}

/// Fetch one article, counting the fetch as a view.
pub async fn process_get_article(
    articles: &dyn ArticleRepository,
    id: &str,
) -> Result<Article, AppError> {
    articles
        .record_view(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))
}

pub async fn process_list_articles(
    articles: &dyn ArticleRepository,
    section_id: Option<&str>,
) -> Result<Vec<Article>, AppError> {
    let section_id = section_id.map(str::trim).filter(|s| !s.is_empty());
    let result = articles.list(section_id).await?;
    tracing::debug!(count = result.len(), ?section_id, "Listed articles");
    Ok(result)
}

pub async fn process_create_article(
    articles: &dyn ArticleRepository,
    sections: &dyn SectionRepository,
    request: CreateArticleRequest,
) -> Result<Article, AppError> {
    const REQUIRED: &str = "Title, content and section are required";

    let title = require_text(request.title.as_deref(), REQUIRED)?;
    let content = require_text(
        request.content.as_deref().map(sanitize_article_html).as_deref(),
        REQUIRED,
    )?;
    let section_id = require_text(request.section_id.as_deref(), REQUIRED)?;

    ensure_section_exists(sections, &section_id).await?;

    let author = request
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_AUTHOR)
        .to_string();

    let now = Utc::now();
    let article = Article {
        id: new_id(),
        title,
        content,
        author,
        date: display_date(now),
        section_id,
        acknowledged: vec![],
        view_count: 0,
        created_at: now,
        updated_at: now,
    };

    articles.insert(&article).await?;
    tracing::info!(article_id = %article.id, section_id = %article.section_id, "Created article");

    Ok(article)
}

pub async fn process_update_article(
    articles: &dyn ArticleRepository,
    sections: &dyn SectionRepository,
    request: UpdateArticleRequest,
) -> Result<Article, AppError> {
    let id = require_text(request.id.as_deref(), "Article id is required")?;

    let changes = ArticleChanges {
        title: optional_text(request.title, "Title cannot be empty")?,
        content: optional_text(
            request.content.map(|c| sanitize_article_html(&c)),
            "Content cannot be empty",
        )?,
        section_id: optional_text(request.section_id, "Section cannot be empty")?,
        updated_at: Utc::now(),
    };

    if let Some(section_id) = &changes.section_id {
        ensure_section_exists(sections, section_id).await?;
    }

    let article = articles
        .update(&id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))?;

    tracing::info!(article_id = %id, "Updated article");
    Ok(article)
}

/// Delete an article and drop it from every user's acknowledged list.
pub async fn process_delete_article(
    articles: &dyn ArticleRepository,
    users: &dyn UserRepository,
    id: Option<&str>,
) -> Result<DeleteResponse, AppError> {
    let id = require_text(id, "Article id is required")?;

    if !articles.delete(&id).await? {
        return Err(AppError::NotFound("Article not found".into()));
    }

    let cleaned = users.remove_acknowledged_article(&id).await?;
    tracing::info!(article_id = %id, users_cleaned = cleaned, "Deleted article");

    Ok(DeleteResponse::new("Article deleted successfully", &id))
}

/// Axum handler for `GET /api/v1/articles`.
///
/// With `?id=` returns one article; otherwise a (possibly filtered) list.
pub async fn get_articles_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ArticleQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) {
        let article = process_get_article(state.article_repo.as_ref(), id).await?;
        return Ok(axum::Json(article).into_response());
    }

    let list =
        process_list_articles(state.article_repo.as_ref(), query.section.as_deref()).await?;
    Ok(axum::Json(list).into_response())
}

/// Axum handler for `POST /api/v1/articles`.
pub async fn create_article_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateArticleRequest>,
) -> Result<axum::Json<Article>, AppError> {
    let article = process_create_article(
        state.article_repo.as_ref(),
        state.section_repo.as_ref(),
        request,
    )
    .await?;

    Ok(axum::Json(article))
}

/// Axum handler for `PUT /api/v1/articles`.
pub async fn update_article_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateArticleRequest>,
) -> Result<axum::Json<Article>, AppError> {
    let article = process_update_article(
        state.article_repo.as_ref(),
        state.section_repo.as_ref(),
        request,
    )
    .await?;

    Ok(axum::Json(article))
}

/// Axum handler for `DELETE /api/v1/articles?id=...`.
pub async fn delete_article_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<axum::Json<DeleteResponse>, AppError> {
    let response = process_delete_article(
        state.article_repo.as_ref(),
        state.user_repo.as_ref(),
        query.id.as_deref(),
    )
    .await?;

    Ok(axum::Json(response))
}
