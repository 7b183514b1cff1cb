mod common;

use kbase::db::user_repository::UserRepository;

#[tokio::test]
async fn created_user_never_exposes_password() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let user = env
        .create_user(&server, "Anna", "Anna@Example.com", "secret-1")
        .await;
    assert_eq!(user["email"], "anna@example.com");
    assert_eq!(user["role"], "reader");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let list: Vec<serde_json::Value> = server.get("/api/v1/users").await.json();
    assert_eq!(list.len(), 1);
    assert!(list[0].get("password_hash").is_none());

    let stored = env
        .users
        .find_by_email("anna@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    env.create_user(&server, "Anna", "anna@example.com", "secret-1")
        .await;

    let response = server
        .post("/api/v1/users")
        .json(&serde_json::json!({
            "name": "Impostor",
            "email": "ANNA@example.com",
            "password": "secret-2",
        }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(env.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    server
        .post("/api/v1/users")
        .json(&serde_json::json!({
            "name": "Anna",
            "email": "anna@example.com",
            "password": "secret-1",
            "role": "owner",
        }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn update_role_keeps_other_fields() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let user = env
        .create_user(&server, "Anna", "anna@example.com", "secret-1")
        .await;

    let updated: serde_json::Value = server
        .put("/api/v1/users")
        .json(&serde_json::json!({ "id": user["_id"], "role": "editor" }))
        .await
        .json();

    assert_eq!(updated["role"], "editor");
    assert_eq!(updated["name"], "Anna");
    assert_eq!(updated["email"], "anna@example.com");
}

#[tokio::test]
async fn delete_user_then_fetch_is_not_found() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();

    let user = env
        .create_user(&server, "Anna", "anna@example.com", "secret-1")
        .await;
    let id = user["_id"].as_str().unwrap();

    server
        .delete("/api/v1/users")
        .add_query_param("id", id)
        .await
        .assert_status_ok();

    server
        .get("/api/v1/users")
        .add_query_param("id", id)
        .await
        .assert_status_not_found();
}
