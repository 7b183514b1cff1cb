use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiQuery;
use crate::app::AppState;
use crate::db::article_repository::ArticleRepository;
use crate::db::section_repository::SectionRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::catalog::ArticleSummary;

const DEFAULT_TOP_LIMIT: i64 = 3;
const MAX_TOP_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsQuery {
    pub limit: Option<i64>,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub articles_count: u64,
    pub sections_count: u64,
    pub users_count: u64,
    pub top_articles: Vec<ArticleSummary>,
}

pub async fn process_statistics(
    articles: &dyn ArticleRepository,
    sections: &dyn SectionRepository,
    users: &dyn UserRepository,
    limit: Option<i64>,
) -> Result<Statistics, AppError> {
    let limit = limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);

    let (articles_count, sections_count, users_count, top) = futures::try_join!(
        articles.count(),
        sections.count(),
        users.count(),
        articles.most_viewed(limit),
    )?;

    Ok(Statistics {
        articles_count,
        sections_count,
        users_count,
        top_articles: top.iter().map(ArticleSummary::from).collect(),
    })
}

/// Axum handler for `GET /api/v1/statistics`.
pub async fn statistics_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> Result<axum::Json<Statistics>, AppError> {
    let stats = process_statistics(
        state.article_repo.as_ref(),
        state.section_repo.as_ref(),
        state.user_repo.as_ref(),
        query.limit,
    )
    .await?;

    Ok(axum::Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::{MockArticleRepo, MockSectionRepo, MockUserRepo};
    use crate::db::models::Article;
    use chrono::Utc;

    fn articles_with_views(views: &[(&str, i64)]) -> MockArticleRepo {
        let repo = MockArticleRepo::new();
        let now = Utc::now();
        for (title, view_count) in views {
            repo.articles.lock().unwrap().push(Article {
                id: format!("id-{}", title),
                title: title.to_string(),
                content: "<p>text</p>".to_string(),
                author: "Author".to_string(),
                date: "01.01.2024".to_string(),
                section_id: "general".to_string(),
                acknowledged: vec![],
                view_count: *view_count,
                created_at: now,
                updated_at: now,
            });
        }
        repo
    }

    #[tokio::test]
    async fn test_counts_and_default_top_three() {
        let articles =
            articles_with_views(&[("A", 5), ("B", 50), ("C", 1), ("D", 20), ("E", 0)]);
        let sections = MockSectionRepo::new();
        let users = MockUserRepo::new();

        let stats = process_statistics(&articles, &sections, &users, None)
            .await
            .unwrap();

        assert_eq!(stats.articles_count, 5);
        assert_eq!(stats.sections_count, 0);
        assert_eq!(stats.users_count, 0);
        let titles: Vec<&str> = stats.top_articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D", "A"]);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let articles = articles_with_views(&[("A", 5), ("B", 50)]);
        let sections = MockSectionRepo::new();
        let users = MockUserRepo::new();

        let zero = process_statistics(&articles, &sections, &users, Some(0))
            .await
            .unwrap();
        assert_eq!(zero.top_articles.len(), 1);

        let huge = process_statistics(&articles, &sections, &users, Some(10_000))
            .await
            .unwrap();
        assert_eq!(huge.top_articles.len(), 2);
    }
}
