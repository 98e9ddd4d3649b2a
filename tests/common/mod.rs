#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::{Value, json};

use cms_server::services::media_host::{
    HostError, HostResult, MediaFile, MediaHost, UnconfiguredHost,
};
use cms_server::state::AppState;

/// Base URL the fake host hands out, shaped like the real one.
pub const FAKE_BASE: &str = "https://res.cloudinary.com/demo/image/upload/v1700000000/uploads";

/// In-memory media host. Files named `slow-*` finish last so ordering can be
/// checked; public ids containing `fail` are rejected on destroy.
#[derive(Default)]
pub struct FakeHost {
    pub uploaded: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaHost for FakeHost {
    async fn upload(&self, file: MediaFile) -> HostResult<String> {
        let name = file.file_name.unwrap_or_else(|| "upload.bin".into());
        if name.starts_with("slow-") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.uploaded.lock().unwrap().push(name.clone());
        Ok(format!("{}/{}", FAKE_BASE, name))
    }

    async fn destroy(&self, public_id: &str) -> HostResult<String> {
        if public_id.contains("fail") {
            return Err(HostError::Rejected {
                operation: "destroy",
                status: 500,
                message: "boom".into(),
            });
        }
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok("ok".into())
    }
}

/// A router over a fresh in-memory database.
pub struct TestEnv {
    pub router: Router,
    pub host: Arc<FakeHost>,
}

impl TestEnv {
    pub async fn start() -> Self {
        let host = Arc::new(FakeHost::default());
        let router = build_router(host.clone()).await;
        Self { router, host }
    }

    /// Same app, but with no media host credentials.
    pub async fn unconfigured() -> Router {
        build_router(Arc::new(UnconfiguredHost)).await
    }

    pub fn server(&self) -> TestServer {
        TestServer::builder()
            .build(self.router.clone())
            .expect("Failed to build TestServer")
    }
}

async fn build_router(host: Arc<dyn MediaHost>) -> Router {
    let pool = cms_server::db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    cms_server::app(AppState::new(Arc::new(pool), host))
}

/// Helper: create a category and return its JSON.
pub async fn create_category(
    server: &TestServer,
    name: &str,
    slug: &str,
    parent_id: Option<&str>,
) -> Value {
    let response = server
        .post("/api/categories")
        .json(&json!({
            "name": name,
            "slug": slug,
            "parentId": parent_id,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Helper: create an article and return its JSON.
pub async fn create_article(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/posts").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id should be a string").to_string()
}
