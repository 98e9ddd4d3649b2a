//! HTTP handlers for the category taxonomy under `/api/categories`.

use crate::{
    errors::{ApiJson, ApiQuery, AppError, parse_id},
    models::category::{Category, CategoryInput, CategoryListQuery},
    services::category_service::CategoryService,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// GET `/api/categories`: flat list, or nested with `?tree=true`.
pub async fn list_categories(
    State(service): State<CategoryService>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> Result<Response, AppError> {
    if query.tree {
        Ok(Json(service.tree().await?).into_response())
    } else {
        Ok(Json(service.list().await?).into_response())
    }
}

/// GET `/api/categories/{id}`
pub async fn get_category(
    State(service): State<CategoryService>,
    Path(id): Path<String>,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// GET `/api/categories/slug/{slug}`
pub async fn get_category_by_slug(
    State(service): State<CategoryService>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(service.get_by_slug(&slug).await?))
}

/// GET `/api/categories/parent/{parent_id}`
pub async fn list_children(
    State(service): State<CategoryService>,
    Path(parent_id): Path<String>,
) -> Result<Json<Vec<Category>>, AppError> {
    let parent_id = parse_id(&parent_id)?;
    Ok(Json(service.children(parent_id).await?))
}

/// POST `/api/categories`
pub async fn create_category(
    State(service): State<CategoryService>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT `/api/categories/{id}`: whole-record replace.
pub async fn update_category(
    State(service): State<CategoryService>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.update(id, input).await?))
}

/// DELETE `/api/categories/{id}`: also removes direct children.
pub async fn delete_category(
    State(service): State<CategoryService>,
    Path(id): Path<String>,
) -> Result<Json<CascadeResponse>, AppError> {
    let id = parse_id(&id)?;
    let summary = service.delete(id).await?;
    Ok(Json(CascadeResponse {
        message: "Category deleted along with its direct children",
        removed_children: summary.removed_children,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeResponse {
    message: &'static str,
    removed_children: u64,
}
