mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};

use common::{FAKE_BASE, TestEnv, id_of};

fn image_part(name: &str) -> Part {
    Part::bytes(b"\x89PNG fake image".to_vec())
        .file_name(name)
        .mime_type("image/png")
}

#[tokio::test]
async fn single_file_upload_is_forwarded() {
    let env = TestEnv::start().await;
    let server = env.server();

    let form = MultipartForm::new().add_part("image", image_part("cat.png"));
    let response = server.post("/api/media/upload").multipart(form).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["message"], "Uploaded");
    assert_eq!(body["data"]["images"], json!([format!("{}/cat.png", FAKE_BASE)]));
    assert_eq!(env.host.uploaded.lock().unwrap().as_slice(), ["cat.png"]);
}

#[tokio::test]
async fn url_upload_is_stored_without_forwarding() {
    let env = TestEnv::start().await;
    let server = env.server();

    let response = server
        .post("/api/media/upload")
        .json(&json!({ "image": "https://example.com/a.jpg" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["images"], json!(["https://example.com/a.jpg"]));

    let form = MultipartForm::new().add_text("image", "https://example.com/b.jpg");
    let response = server.post("/api/media/upload").multipart(form).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["images"], json!(["https://example.com/b.jpg"]));

    assert!(env.host.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn url_encoded_form_upload_is_stored() {
    let env = TestEnv::start().await;
    let server = env.server();

    let response = server
        .post("/api/media/upload")
        .form(&[("image", "https://example.com/form.jpg")])
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["images"], json!(["https://example.com/form.jpg"]));

    server
        .post("/api/media/upload")
        .form(&[("other", "x")])
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn missing_image_is_bad_request() {
    let env = TestEnv::start().await;
    let server = env.server();

    server
        .post("/api/media/upload")
        .json(&json!({}))
        .await
        .assert_status_bad_request();

    let form = MultipartForm::new().add_part("other", image_part("x.png"));
    server
        .post("/api/media/upload")
        .multipart(form)
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn multiple_upload_keeps_submission_order() {
    let env = TestEnv::start().await;
    let server = env.server();

    let form = MultipartForm::new()
        .add_part("images", image_part("slow-1.png"))
        .add_part("images", image_part("fast-2.png"))
        .add_part("images", image_part("fast-3.png"));
    let response = server
        .post("/api/media/upload-multiple")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(
        body["data"]["images"],
        json!([
            format!("{}/slow-1.png", FAKE_BASE),
            format!("{}/fast-2.png", FAKE_BASE),
            format!("{}/fast-3.png", FAKE_BASE),
        ])
    );
    // The slow file finished last, yet stays first in the record.
    assert_eq!(
        env.host.uploaded.lock().unwrap().last().map(String::as_str),
        Some("slow-1.png")
    );
}

#[tokio::test]
async fn multiple_upload_limits() {
    let env = TestEnv::start().await;
    let server = env.server();

    server
        .post("/api/media/upload-multiple")
        .multipart(MultipartForm::new().add_text("note", "nothing"))
        .await
        .assert_status_bad_request();

    let mut form = MultipartForm::new();
    for i in 0..9 {
        form = form.add_part("images", image_part(&format!("f{}.png", i)));
    }
    server
        .post("/api/media/upload-multiple")
        .multipart(form)
        .await
        .assert_status_bad_request();
    assert!(env.host.uploaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn get_and_delete_with_remote_cleanup() {
    let env = TestEnv::start().await;
    let server = env.server();

    let form = MultipartForm::new()
        .add_part("images", image_part("keep.png"))
        .add_part("images", image_part("fail.png"));
    let created: Value = server
        .post("/api/media/upload-multiple")
        .multipart(form)
        .await
        .json();
    let id = id_of(&created["data"]);

    let fetched: Value = server.get(&format!("/api/media/{}", id)).await.json();
    assert_eq!(fetched["images"].as_array().map(Vec::len), Some(2));

    let response = server
        .delete(&format!("/api/media/{}?deleteFromCloud=true", id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let results = &body["results"];
    assert_eq!(results["deletedFromDb"], true);
    assert_eq!(results["cloudResults"][0]["publicId"], "uploads/keep");
    assert_eq!(results["cloudResults"][0]["result"], "ok");
    assert!(results["cloudResults"][1]["error"].is_string());

    assert_eq!(
        env.host.destroyed.lock().unwrap().as_slice(),
        ["uploads/keep"]
    );
    server
        .get(&format!("/api/media/{}", id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn delete_without_flag_skips_remote() {
    let env = TestEnv::start().await;
    let server = env.server();

    let created: Value = server
        .post("/api/media/upload")
        .json(&json!({ "image": "https://example.com/x.jpg" }))
        .await
        .json();
    let id = id_of(&created["data"]);

    let body: Value = server
        .delete(&format!("/api/media/{}", id))
        .await
        .json();
    assert_eq!(body["results"]["deletedFromDb"], true);
    assert_eq!(body["results"]["cloudResults"], json!([]));
    assert!(env.host.destroyed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_flag_other_than_true_keeps_remote_assets() {
    let env = TestEnv::start().await;
    let server = env.server();

    let form = MultipartForm::new().add_part("images", image_part("kept.png"));
    let created: Value = server
        .post("/api/media/upload-multiple")
        .multipart(form)
        .await
        .json();
    let id = id_of(&created["data"]);

    let response = server
        .delete(&format!("/api/media/{}?deleteFromCloud=yes", id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"]["deletedFromDb"], true);
    assert_eq!(body["results"]["cloudResults"], json!([]));
    assert!(env.host.destroyed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unconfigured_host_answers_service_unavailable() {
    let server = TestServer::builder()
        .build(TestEnv::unconfigured().await)
        .expect("Failed to build TestServer");

    let form = MultipartForm::new().add_part("image", image_part("cat.png"));
    server
        .post("/api/media/upload")
        .multipart(form)
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}
