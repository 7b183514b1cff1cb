use async_trait::async_trait;
use mongodb::bson::doc;

use crate::error::AppError;

/// Liveness probe for the backing database.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
}

pub struct MongoHealth {
    db: mongodb::Database,
}

impl MongoHealth {
    pub fn new(db: &mongodb::Database) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait]
impl DatabaseHealth for MongoHealth {
    async fn ping(&self) -> Result<(), AppError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
