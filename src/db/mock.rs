//! In-memory repositories for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::db::article_repository::ArticleRepository;
use crate::db::health::DatabaseHealth;
use crate::db::models::{Article, ArticleChanges, Section, SectionChanges, User, UserChanges};
use crate::db::section_repository::SectionRepository;
use crate::db::user_repository::{duplicate_email, UserRepository};
use crate::error::AppError;

pub struct MockArticleRepo {
    pub articles: Mutex<Vec<Article>>,
}

impl MockArticleRepo {
    pub fn new() -> Self {
        Self {
            articles: Mutex::new(vec![]),
        }
    }

    fn sorted(mut articles: Vec<Article>) -> Vec<Article> {
        articles.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        articles
    }
}

#[async_trait]
impl ArticleRepository for MockArticleRepo {
    async fn insert(&self, article: &Article) -> Result<(), AppError> {
        self.articles.lock().unwrap().push(article.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError> {
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn record_view(&self, id: &str) -> Result<Option<Article>, AppError> {
        let mut articles = self.articles.lock().unwrap();
        Ok(articles.iter_mut().find(|a| a.id == id).map(|a| {
            a.view_count += 1;
            a.clone()
        }))
    }

    async fn list(&self, section_id: Option<&str>) -> Result<Vec<Article>, AppError> {
        let articles = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| section_id.map_or(true, |s| a.section_id == s))
            .cloned()
            .collect();
        Ok(Self::sorted(articles))
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, AppError> {
        let needle = query.to_lowercase();
        let articles = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle)
                    || a.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(Self::sorted(articles))
    }

    async fn update(
        &self,
        id: &str,
        changes: &ArticleChanges,
    ) -> Result<Option<Article>, AppError> {
        let mut articles = self.articles.lock().unwrap();
        Ok(articles.iter_mut().find(|a| a.id == id).map(|a| {
            changes.apply(a);
            a.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }

    async fn add_acknowledgment(
        &self,
        article_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let mut articles = self.articles.lock().unwrap();
        let Some(article) = articles.iter_mut().find(|a| a.id == article_id) else {
            return Ok(false);
        };
        if !article.acknowledged.iter().any(|u| u == user_id) {
            article.acknowledged.push(user_id.to_string());
        }
        Ok(true)
    }

    async fn remove_acknowledgments_by(&self, user_id: &str) -> Result<u64, AppError> {
        let mut modified = 0;
        for article in self.articles.lock().unwrap().iter_mut() {
            let before = article.acknowledged.len();
            article.acknowledged.retain(|u| u != user_id);
            if article.acknowledged.len() < before {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.articles.lock().unwrap().len() as u64)
    }

    async fn most_viewed(&self, limit: i64) -> Result<Vec<Article>, AppError> {
        let mut articles = self.articles.lock().unwrap().clone();
        articles.sort_by(|a, b| {
            b.view_count
                .cmp(&a.view_count)
                .then_with(|| a.title.cmp(&b.title))
        });
        articles.truncate(limit.max(0) as usize);
        Ok(articles)
    }
}

pub struct MockSectionRepo {
    pub sections: Mutex<Vec<Section>>,
}

impl MockSectionRepo {
    pub fn new() -> Self {
        Self {
            sections: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SectionRepository for MockSectionRepo {
    async fn insert(&self, section: &Section) -> Result<(), AppError> {
        self.sections.lock().unwrap().push(section.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Section>, AppError> {
        Ok(self
            .sections
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Section>, AppError> {
        let mut sections = self.sections.lock().unwrap().clone();
        sections.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(sections)
    }

    async fn update(
        &self,
        id: &str,
        changes: &SectionChanges,
    ) -> Result<Option<Section>, AppError> {
        let mut sections = self.sections.lock().unwrap();
        Ok(sections.iter_mut().find(|s| s.id == id).map(|s| {
            changes.apply(s);
            s.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut sections = self.sections.lock().unwrap();
        let before = sections.len();
        sections.retain(|s| s.id != id);
        Ok(sections.len() < before)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.sections.lock().unwrap().len() as u64)
    }
}

pub struct MockUserRepo {
    pub users: Mutex<Vec<User>>,
}

impl MockUserRepo {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepo {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(duplicate_email());
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(duplicate_email());
            }
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            changes.apply(u);
            u.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn add_acknowledged_article(
        &self,
        user_id: &str,
        article_id: &str,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(false);
        };
        if !user.acknowledged_articles.iter().any(|a| a == article_id) {
            user.acknowledged_articles.push(article_id.to_string());
        }
        Ok(true)
    }

    async fn remove_acknowledged_article(&self, article_id: &str) -> Result<u64, AppError> {
        let mut modified = 0;
        for user in self.users.lock().unwrap().iter_mut() {
            let before = user.acknowledged_articles.len();
            user.acknowledged_articles.retain(|a| a != article_id);
            if user.acknowledged_articles.len() < before {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

/// Health probe with a switchable outcome.
pub struct MockHealth {
    pub healthy: std::sync::atomic::AtomicBool,
}

impl MockHealth {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy: std::sync::atomic::AtomicBool::new(healthy),
        }
    }
}

#[async_trait]
impl DatabaseHealth for MockHealth {
    async fn ping(&self) -> Result<(), AppError> {
        if self.healthy.load(std::sync::atomic::Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Database("connection refused".into()))
        }
    }
}
