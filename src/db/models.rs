use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::Role;

/// A knowledge-base article stored in the `articles` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// UUID v4 identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Sanitized HTML body.
    pub content: String,
    /// Free-text author name.
    pub author: String,
    /// Display date (`DD.MM.YYYY`) fixed at creation.
    pub date: String,
    /// Identifier of the section this article belongs to.
    pub section_id: String,
    /// Ids of the users who acknowledged reading this article.
    #[serde(default)]
    pub acknowledged: Vec<String>,
    /// Number of detail fetches.
    #[serde(default)]
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of an article that an update may change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleChanges {
    /// Apply the changes to an in-memory article.
    pub fn apply(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
        }
        if let Some(section_id) = &self.section_id {
            article.section_id = section_id.clone();
        }
        article.updated_at = self.updated_at;
    }
}

/// A named grouping of articles stored in the `sections` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// UUID v4 identifier.
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Sort order; lower numbers appear first.
    #[serde(default)]
    pub priority: i32,
    /// Optional parent section for nesting.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SectionChanges {
    pub name: Option<String>,
    pub priority: Option<i32>,
    /// `Some(None)` clears the parent.
    pub parent_id: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl SectionChanges {
    pub fn apply(&self, section: &mut Section) {
        if let Some(name) = &self.name {
            section.name = name.clone();
        }
        if let Some(priority) = self.priority {
            section.priority = priority;
        }
        if let Some(parent_id) = &self.parent_id {
            section.parent_id = parent_id.clone();
        }
        section.updated_at = self.updated_at;
    }
}

/// An account stored in the `users` collection.
///
/// Never serialized to API clients directly; see [`UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Lower-cased, unique.
    pub email: String,
    pub name: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub acknowledged_articles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The public view of this user, without credentials.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            acknowledged_articles: self.acknowledged_articles.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A user as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub acknowledged_articles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub updated_at: DateTime<Utc>,
}

impl UserChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user.updated_at = self.updated_at;
    }
}

/// Generate a fresh document identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Format a creation date the way articles display it.
pub fn display_date(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y").to_string()
}
