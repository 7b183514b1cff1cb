use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::db::models::{Article, ArticleChanges};
use crate::error::AppError;

/// Repository trait for article operations.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article.
    async fn insert(&self, article: &Article) -> Result<(), AppError>;

    /// Find an article by id without touching its view counter.
    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError>;

    /// Increment the view counter and return the updated article.
    async fn record_view(&self, id: &str) -> Result<Option<Article>, AppError>;

    /// List articles, optionally restricted to one section, sorted by title.
    async fn list(&self, section_id: Option<&str>) -> Result<Vec<Article>, AppError>;

    /// Case-insensitive literal substring search over title and content.
    async fn search(&self, query: &str) -> Result<Vec<Article>, AppError>;

    /// Apply changes and return the updated article, or `None` if absent.
    async fn update(
        &self,
        id: &str,
        changes: &ArticleChanges,
    ) -> Result<Option<Article>, AppError>;

    /// Delete an article. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Add `user_id` to the article's acknowledged set.
    /// Returns `false` if the article does not exist.
    async fn add_acknowledgment(
        &self,
        article_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError>;

    /// Remove `user_id` from every article's acknowledged set.
    async fn remove_acknowledgments_by(&self, user_id: &str) -> Result<u64, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// The `limit` articles with the highest view counts.
    async fn most_viewed(&self, limit: i64) -> Result<Vec<Article>, AppError>;
}

/// Build the `$or` filter used by article search.
///
/// The query is escaped so it matches literally.
pub fn search_filter(query: &str) -> Document {
    let pattern = regex::escape(query);
    doc! {
        "$or": [
            { "title": { "$regex": pattern.as_str(), "$options": "i" } },
            { "content": { "$regex": pattern.as_str(), "$options": "i" } },
        ]
    }
}

/// MongoDB implementation of the ArticleRepository.
pub struct MongoArticleRepository {
    collection: mongodb::Collection<Article>,
}

impl MongoArticleRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("articles"),
        }
    }

    async fn find_sorted(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Article>, AppError> {
        let cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl ArticleRepository for MongoArticleRepository {
    async fn insert(&self, article: &Article) -> Result<(), AppError> {
        self.collection
            .insert_one(article)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn record_view(&self, id: &str) -> Result<Option<Article>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$inc": { "view_count": 1 } })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self, section_id: Option<&str>) -> Result<Vec<Article>, AppError> {
        let filter = match section_id {
            Some(section_id) => doc! { "section_id": section_id },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "title": 1, "_id": 1 })
            .build();

        self.find_sorted(filter, options).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "title": 1, "_id": 1 })
            .build();

        self.find_sorted(search_filter(query), options).await
    }

    async fn update(
        &self,
        id: &str,
        changes: &ArticleChanges,
    ) -> Result<Option<Article>, AppError> {
        let updated_at =
            to_bson(&changes.updated_at).map_err(|e| AppError::Internal(e.to_string()))?;

        let mut set = doc! { "updated_at": updated_at };
        if let Some(title) = &changes.title {
            set.insert("title", title.clone());
        }
        if let Some(content) = &changes.content {
            set.insert("content", content.clone());
        }
        if let Some(section_id) = &changes.section_id {
            set.insert("section_id", section_id.clone());
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn add_acknowledgment(
        &self,
        article_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": article_id },
                doc! { "$addToSet": { "acknowledged": user_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn remove_acknowledgments_by(&self, user_id: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .update_many(
                doc! { "acknowledged": user_id },
                doc! { "$pull": { "acknowledged": user_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.modified_count)
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn most_viewed(&self, limit: i64) -> Result<Vec<Article>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "view_count": -1, "title": 1 })
            .limit(limit)
            .build();

        self.find_sorted(doc! {}, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filter_escapes_metacharacters() {
        let filter = search_filter("c++ (draft)");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);

        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"c\+\+ \(draft\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_search_filter_covers_content() {
        let filter = search_filter("policy");
        let clauses = filter.get_array("$or").unwrap();
        let content = clauses[1]
            .as_document()
            .unwrap()
            .get_document("content")
            .unwrap();
        assert_eq!(content.get_str("$regex").unwrap(), "policy");
    }
}
