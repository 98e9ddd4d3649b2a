//! HTTP handlers for sectioned articles under `/api/posts`.

use crate::{
    errors::{ApiJson, ApiQuery, AppError, parse_id},
    handlers::MessageResponse,
    models::article::{Article, ArticleFilter, ArticleInput, CategoryCount},
    services::article_service::ArticleService,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET `/api/posts`: supports `?category=&status=&search=`.
pub async fn list_articles(
    State(service): State<ArticleService>,
    ApiQuery(filter): ApiQuery<ArticleFilter>,
) -> Result<Json<Vec<Article>>, AppError> {
    Ok(Json(service.list(filter).await?))
}

/// GET `/api/posts/{id}`
pub async fn get_article(
    State(service): State<ArticleService>,
    Path(id): Path<String>,
) -> Result<Json<Article>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// GET `/api/posts/slug/{slug}`
pub async fn get_article_by_slug(
    State(service): State<ArticleService>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, AppError> {
    Ok(Json(service.get_by_slug(&slug).await?))
}

/// GET `/api/posts/category/{slug}`
pub async fn list_articles_by_category(
    State(service): State<ArticleService>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Article>>, AppError> {
    Ok(Json(service.list_by_category_slug(&slug).await?))
}

/// GET `/api/posts/stats/count-by-category`
pub async fn count_by_category(
    State(service): State<ArticleService>,
) -> Result<Json<Vec<CategoryCount>>, AppError> {
    Ok(Json(service.count_by_category().await?))
}

/// POST `/api/posts`
pub async fn create_article(
    State(service): State<ArticleService>,
    ApiJson(input): ApiJson<ArticleInput>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    let article = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT `/api/posts/{id}`: whole-document replace.
pub async fn update_article(
    State(service): State<ArticleService>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ArticleInput>,
) -> Result<Json<Article>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.update(id, input).await?))
}

/// DELETE `/api/posts/{id}`
pub async fn delete_article(
    State(service): State<ArticleService>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    service.delete(id).await?;
    Ok(Json(MessageResponse::new("Article deleted")))
}
