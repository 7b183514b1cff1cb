#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum_extra::extract::cookie::Key;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use kbase::app::{build_router, AppState};
use kbase::db::article_repository::{ArticleRepository, MongoArticleRepository};
use kbase::db::health::MongoHealth;
use kbase::db::section_repository::{MongoSectionRepository, SectionRepository};
use kbase::db::user_repository::{MongoUserRepository, UserRepository};

/// Holds a running MongoDB container and the Axum router wired to it.
///
/// The container lives as long as this struct; dropping it stops the container.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub articles: Arc<dyn ArticleRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("kbase_test");

        let user_repo = MongoUserRepository::new(&mongo_db);
        user_repo
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        let articles: Arc<dyn ArticleRepository> =
            Arc::new(MongoArticleRepository::new(&mongo_db));
        let sections: Arc<dyn SectionRepository> =
            Arc::new(MongoSectionRepository::new(&mongo_db));
        let users: Arc<dyn UserRepository> = Arc::new(user_repo);

        let state = AppState {
            article_repo: articles.clone(),
            section_repo: sections.clone(),
            user_repo: users.clone(),
            health: Arc::new(MongoHealth::new(&mongo_db)),
            session_cookie_secure: false,
            session_key: Key::generate(),
        };

        Self {
            _mongo: mongo_container,
            router: build_router(state, false),
            articles,
            sections,
            users,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
    }

    /// Helper: create a section and return its id.
    pub async fn create_section(
        &self,
        server: &axum_test::TestServer,
        name: &str,
        priority: i32,
    ) -> String {
        let section: serde_json::Value = server
            .post("/api/v1/sections")
            .json(&serde_json::json!({ "name": name, "priority": priority }))
            .await
            .json();
        section["_id"].as_str().expect("section id").to_string()
    }

    /// Helper: create an article and return the response body.
    pub async fn create_article(
        &self,
        server: &axum_test::TestServer,
        title: &str,
        content: &str,
        section_id: &str,
    ) -> serde_json::Value {
        server
            .post("/api/v1/articles")
            .json(&serde_json::json!({
                "title": title,
                "content": content,
                "section_id": section_id,
                "author": "Test Author",
            }))
            .await
            .json()
    }

    /// Helper: create a user and return the profile.
    pub async fn create_user(
        &self,
        server: &axum_test::TestServer,
        name: &str,
        email: &str,
        password: &str,
    ) -> serde_json::Value {
        server
            .post("/api/v1/users")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .await
            .json()
    }
}
