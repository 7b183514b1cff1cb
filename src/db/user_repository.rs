use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::IndexModel;

use crate::db::models::{User, UserChanges};
use crate::error::AppError;

/// Repository trait for user operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email is a `BadRequest`.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Find a user by its (already normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// List all users sorted by name.
    async fn list_all(&self) -> Result<Vec<User>, AppError>;

    /// Apply changes and return the updated user, or `None` if absent.
    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, AppError>;

    /// Delete a user. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Add `article_id` to the user's acknowledged set.
    /// Returns `false` if the user does not exist.
    async fn add_acknowledged_article(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<bool, AppError>;

    /// Remove `article_id` from every user's acknowledged set.
    async fn remove_acknowledged_article(&self, article_id: &str) -> Result<u64, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

pub(crate) fn duplicate_email() -> AppError {
    AppError::BadRequest("A user with this email already exists".into())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}

fn map_write_error(err: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&err) {
        duplicate_email()
    } else {
        AppError::Database(err.to_string())
    }
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Create the unique index on `email`. Safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.collection
            .insert_one(user)
            .await
            .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "name": 1, "email": 1 })
            .build();

        let cursor = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let updated_at =
            to_bson(&changes.updated_at).map_err(|e| AppError::Internal(e.to_string()))?;

        let mut set = doc! { "updated_at": updated_at };
        if let Some(name) = &changes.name {
            set.insert("name", name.clone());
        }
        if let Some(email) = &changes.email {
            set.insert("email", email.clone());
        }
        if let Some(hash) = &changes.password_hash {
            set.insert("password_hash", hash.clone());
        }
        if let Some(role) = changes.role {
            set.insert("role", role.to_string());
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .with_options(options)
            .await
            .map_err(map_write_error)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn add_acknowledged_article(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "acknowledged_articles": article_id } },
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.matched_count > 0)
    }

    async fn remove_acknowledged_article(&self, article_id: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .update_many(
                doc! { "acknowledged_articles": article_id },
                doc! { "$pull": { "acknowledged_articles": article_id } },
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
}
