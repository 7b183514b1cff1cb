use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::db::models::{Section, SectionChanges};
use crate::error::AppError;

/// Repository trait for section operations.
#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn insert(&self, section: &Section) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Section>, AppError>;

    /// List all sections sorted by priority (ascending), then by name.
    async fn list_all(&self) -> Result<Vec<Section>, AppError>;

    /// Apply changes and return the updated section, or `None` if absent.
    async fn update(
        &self,
        id: &str,
        changes: &SectionChanges,
    ) -> Result<Option<Section>, AppError>;

    /// Delete a section. Returns `false` if it did not exist.
    ///
    /// Articles assigned to the section are left untouched.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the SectionRepository.
pub struct MongoSectionRepository {
    collection: mongodb::Collection<Section>,
}

impl MongoSectionRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("sections"),
        }
    }
}

#[async_trait]
impl SectionRepository for MongoSectionRepository {
    async fn insert(&self, section: &Section) -> Result<(), AppError> {
        self.collection
            .insert_one(section)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Section>, AppError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Section>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "priority": 1, "name": 1 })
            .build();

        let mut cursor = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut sections = Vec::new();
        while let Some(section) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            sections.push(section);
        }

        Ok(sections)
    }

    async fn update(
        &self,
        id: &str,
        changes: &SectionChanges,
    ) -> Result<Option<Section>, AppError> {
        let updated_at =
            to_bson(&changes.updated_at).map_err(|e| AppError::Internal(e.to_string()))?;

        let mut set = doc! { "updated_at": updated_at };
        if let Some(name) = &changes.name {
            set.insert("name", name.clone());
        }
        if let Some(priority) = changes.priority {
            set.insert("priority", priority);
        }
        if let Some(parent_id) = &changes.parent_id {
            let value = match parent_id {
                Some(parent_id) => Bson::String(parent_id.clone()),
                None => Bson::Null,
            };
            set.insert("parent_id", value);
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

    async fn count(&self) -> Result<u64, AppError> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
