use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::login;
use crate::db::article_repository::ArticleRepository;
use crate::db::health::DatabaseHealth;
use crate::db::section_repository::SectionRepository;
use crate::db::user_repository::UserRepository;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub article_repo: Arc<dyn ArticleRepository>,
    pub section_repo: Arc<dyn SectionRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub health: Arc<dyn DatabaseHealth>,
    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,
    /// Signs the session cookie.
    pub session_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}

/// The `/api/v1` routes, without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/articles",
            get(api::articles::get_articles_handler)
                .post(api::articles::create_article_handler)
                .put(api::articles::update_article_handler)
                .delete(api::articles::delete_article_handler),
        )
        .route("/articles/search", get(api::search::search_handler))
        .route(
            "/articles/acknowledge",
            post(api::acknowledge::acknowledge_handler),
        )
        .route(
            "/sections",
            get(api::sections::get_sections_handler)
                .post(api::sections::create_section_handler)
                .put(api::sections::update_section_handler)
                .delete(api::sections::delete_section_handler),
        )
        .route("/sections/overview", get(api::sections::overview_handler))
        .route(
            "/users",
            get(api::users::get_users_handler)
                .post(api::users::create_user_handler)
                .put(api::users::update_user_handler)
                .delete(api::users::delete_user_handler),
        )
        .route("/auth/login", post(login::login_handler))
        .route("/auth/me", get(login::me_handler))
        .route("/auth/logout", post(login::logout_handler))
        .route("/statistics", get(api::statistics::statistics_handler))
        .route("/health", get(api::health::health_handler))
}

/// Build the full application router.
pub fn build_router(state: AppState, cors_allow_any: bool) -> Router {
    let router = Router::new()
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if cors_allow_any {
        tracing::warn!("CORS: allowing any origin");
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
