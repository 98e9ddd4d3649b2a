//! Shared router state.

use crate::services::{
    article_service::ArticleService, blog_service::BlogService,
    category_service::CategoryService, media_host::MediaHost, media_service::MediaService,
};
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Instant};

/// Everything handlers need. Each service is extracted on its own with
/// `State<…Service>`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub blog: BlogService,
    pub articles: ArticleService,
    pub categories: CategoryService,
    pub media: MediaService,
    #[from_ref(skip)]
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service to the same pool.
    pub fn new(db: Arc<SqlitePool>, host: Arc<dyn MediaHost>) -> Self {
        Self {
            blog: BlogService::new(db.clone()),
            articles: ArticleService::new(db.clone()),
            categories: CategoryService::new(db.clone()),
            media: MediaService::new(db.clone(), host),
            db,
            started_at: Instant::now(),
        }
    }
}
