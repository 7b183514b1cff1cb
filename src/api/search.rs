use axum::extract::State;
use serde::Deserialize;

use crate::api::extract::ApiQuery;
use crate::app::AppState;
use crate::db::article_repository::ArticleRepository;
use crate::db::models::Article;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Core search logic: a blank query yields no results.
pub async fn process_search(
    articles: &dyn ArticleRepository,
    query: Option<&str>,
) -> Result<Vec<Article>, AppError> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(vec![]);
    };

    let hits = articles.search(query).await?;
    tracing::debug!(query, hits = hits.len(), "Article search");
    Ok(hits)
}

/// Axum handler for `GET /api/v1/articles/search?q=...`.
pub async fn search_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> Result<axum::Json<Vec<Article>>, AppError> {
    let hits = process_search(state.article_repo.as_ref(), params.q.as_deref()).await?;
    Ok(axum::Json(hits))
}
