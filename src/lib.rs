pub mod app;
pub mod config;
pub mod error;
pub mod api {
    pub mod acknowledge;
    pub mod articles;
    pub mod errors;
    pub mod extract;
    pub mod health;
    pub mod responses;
    pub mod search;
    pub mod sections;
    pub mod statistics;
    pub mod users;
}
pub mod auth {
    pub mod login;
    pub mod models;
    pub mod password;
}
pub mod db {
    pub mod article_repository;
    pub mod health;
    #[cfg(test)]
    pub mod mock;
    pub mod models;
    pub mod section_repository;
    pub mod user_repository;
}
pub mod models {
    pub mod catalog;
}
pub mod rendering {
    pub mod html;
}
