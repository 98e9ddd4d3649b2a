//! Route table for the CMS API.
//!
//! ## Structure
//! - **Blog posts** under `/api/blog`
//! - **Articles** under `/api/posts` (slug, category and stats lookups)
//! - **Categories** under `/api/categories` (`?tree=true` for the nested view)
//! - **Media** under `/api/media`
//! - **Health checks** `/`, `/healthz`, `/readyz` at the root
//!
//! Unknown paths fall through to a JSON 404.

use crate::{
    handlers::{
        article_handlers::{
            count_by_category, create_article, delete_article, get_article,
            get_article_by_slug, list_articles, list_articles_by_category, update_article,
        },
        blog_handlers::{create_post, delete_post, get_post, list_posts, update_post},
        category_handlers::{
            create_category, delete_category, get_category, get_category_by_slug,
            list_categories, list_children, update_category,
        },
        health_handlers::{healthz, not_found, readyz, root},
        media_handlers::{
            MAX_UPLOAD_BODY_BYTES, delete_upload, get_upload, upload_image, upload_multiple,
        },
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the full router. State is attached by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api", api_routes())
        .fallback(not_found)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_posts).post(create_post))
        .route(
            "/blog/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        // static segments take priority over `/posts/{id}`
        .route("/posts", get(list_articles).post(create_article))
        .route("/posts/stats/count-by-category", get(count_by_category))
        .route("/posts/slug/{slug}", get(get_article_by_slug))
        .route("/posts/category/{slug}", get(list_articles_by_category))
        .route(
            "/posts/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/slug/{slug}", get(get_category_by_slug))
        .route("/categories/parent/{parent_id}", get(list_children))
        .route(
            "/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .merge(media_routes())
}

fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/media/upload", post(upload_image))
        .route("/media/upload-multiple", post(upload_multiple))
        .route("/media/{id}", get(get_upload).delete(delete_upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}
