mod common;

#[tokio::test]
async fn search_matches_title_or_content_case_insensitively() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let section_id = env.create_section(&server, "General", 1).await;

    env.create_article(&server, "Vacation Policy", "<p>Days off</p>", &section_id)
        .await;
    env.create_article(&server, "Onboarding", "<p>Read the VACATION rules</p>", &section_id)
        .await;
    env.create_article(&server, "Coding standards", "<p>Use rustfmt</p>", &section_id)
        .await;

    let hits: Vec<serde_json::Value> = server
        .get("/api/v1/articles/search")
        .add_query_param("q", "vacation")
        .await
        .json();

    let mut titles: Vec<&str> = hits.iter().map(|a| a["title"].as_str().unwrap()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Onboarding", "Vacation Policy"]);
}

#[tokio::test]
async fn metacharacters_match_literally() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let section_id = env.create_section(&server, "General", 1).await;

    env.create_article(&server, "C++ (draft)", "<p>Notes</p>", &section_id)
        .await;
    env.create_article(&server, "Cxx draft", "<p>Notes</p>", &section_id)
        .await;

    let hits: Vec<serde_json::Value> = server
        .get("/api/v1/articles/search")
        .add_query_param("q", "c++ (")
        .await
        .json();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "C++ (draft)");

    let dot: Vec<serde_json::Value> = server
        .get("/api/v1/articles/search")
        .add_query_param("q", ".*")
        .await
        .json();
    assert!(dot.is_empty());
}

#[tokio::test]
async fn blank_query_returns_empty_list() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let section_id = env.create_section(&server, "General", 1).await;
    env.create_article(&server, "Anything", "<p>x</p>", &section_id)
        .await;

    let none: Vec<serde_json::Value> = server.get("/api/v1/articles/search").await.json();
    assert!(none.is_empty());

    let blank: Vec<serde_json::Value> = server
        .get("/api/v1/articles/search")
        .add_query_param("q", "   ")
        .await
        .json();
    assert!(blank.is_empty());
}
