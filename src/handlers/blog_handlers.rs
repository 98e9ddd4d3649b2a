//! HTTP handlers for the flat blog posts under `/api/blog`.

use crate::{
    errors::{ApiJson, ApiQuery, AppError, parse_id},
    handlers::MessageResponse,
    models::blog_post::{BlogPost, BlogPostFilter, BlogPostInput},
    services::blog_service::BlogService,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET `/api/blog`: newest first, optional `?category=`.
pub async fn list_posts(
    State(service): State<BlogService>,
    ApiQuery(filter): ApiQuery<BlogPostFilter>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    Ok(Json(service.list(filter).await?))
}

/// GET `/api/blog/{id}`
pub async fn get_post(
    State(service): State<BlogService>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// POST `/api/blog`
pub async fn create_post(
    State(service): State<BlogService>,
    ApiJson(input): ApiJson<BlogPostInput>,
) -> Result<(StatusCode, Json<BlogPost>), AppError> {
    let post = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT `/api/blog/{id}`: applies only the fields present in the body.
pub async fn update_post(
    State(service): State<BlogService>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BlogPostInput>,
) -> Result<Json<BlogPost>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.update(id, patch).await?))
}

/// DELETE `/api/blog/{id}`
pub async fn delete_post(
    State(service): State<BlogService>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    service.delete(id).await?;
    Ok(Json(MessageResponse::new("Blog post deleted")))
}
