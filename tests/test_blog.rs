mod common;

use serde_json::{Value, json};

use common::{TestEnv, id_of};

fn post(title: &str, category: &str) -> Value {
    json!({
        "date": "March 3, 2024",
        "title": title,
        "excerpt": "Short summary",
        "category": category,
    })
}

#[tokio::test]
async fn create_defaults_image_and_lists_newest_first() {
    let env = TestEnv::start().await;
    let server = env.server();

    let first = server.post("/api/blog").json(&post("First", "Events")).await;
    first.assert_status(axum::http::StatusCode::CREATED);
    let first: Value = first.json();
    assert_eq!(first["image"], "/default-image.jpg");

    server
        .post("/api/blog")
        .json(&post("Second", "Products"))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let list: Vec<Value> = server.get("/api/blog").await.json();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["title"], "Second");
    assert_eq!(list[1]["title"], "First");

    let events: Vec<Value> = server.get("/api/blog?category=Events").await.json();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "First");
}

#[tokio::test]
async fn unknown_category_and_missing_fields_are_rejected() {
    let env = TestEnv::start().await;
    let server = env.server();

    server
        .post("/api/blog")
        .json(&post("Title", "Gossip"))
        .await
        .assert_status_bad_request();

    server
        .post("/api/blog")
        .json(&json!({ "title": "No date", "excerpt": "x", "category": "General" }))
        .await
        .assert_status_bad_request();

    server
        .get("/api/blog?category=Gossip")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn update_merges_present_fields() {
    let env = TestEnv::start().await;
    let server = env.server();

    let created: Value = server
        .post("/api/blog")
        .json(&post("Original", "General"))
        .await
        .json();
    let id = id_of(&created);

    let response = server
        .put(&format!("/api/blog/{}", id))
        .json(&json!({ "title": "Renamed" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["excerpt"], "Short summary");
    assert_eq!(updated["category"], "General");
}

#[tokio::test]
async fn delete_then_lookup_is_not_found() {
    let env = TestEnv::start().await;
    let server = env.server();

    let created: Value = server
        .post("/api/blog")
        .json(&post("Doomed", "General"))
        .await
        .json();
    let id = id_of(&created);

    let response = server.delete(&format!("/api/blog/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Blog post deleted");

    server
        .get(&format!("/api/blog/{}", id))
        .await
        .assert_status_not_found();
    server
        .delete(&format!("/api/blog/{}", id))
        .await
        .assert_status_not_found();
    server.get("/api/blog/123").await.assert_status_bad_request();
}
