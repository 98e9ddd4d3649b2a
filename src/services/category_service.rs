//! CategoryService: the category taxonomy.
//!
//! Parent references are soft: nothing stops a category from pointing at a
//! deleted parent, and deletion only cascades one level.

use crate::{
    models::{
        DEFAULT_IMAGE,
        category::{Category, CategoryInput, CategoryNode},
        required,
    },
    services::{category_tree::build_tree, is_unique_violation},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category `{0}` not found")]
    NotFound(Uuid),
    #[error("category with slug `{0}` not found")]
    SlugNotFound(String),
    #[error("slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

const COLUMNS: &str =
    "id, name, slug, parent_id, description, image, sort_order, created_at, updated_at";
const ORDERING: &str = "ORDER BY sort_order ASC, created_at ASC, rowid ASC";

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub removed_children: u64,
}

/// Validated column values for insert and update.
struct CategoryFields {
    name: String,
    slug: String,
    parent_id: Option<Uuid>,
    description: String,
    image: String,
    order: i64,
}

impl TryFrom<CategoryInput> for CategoryFields {
    type Error = CategoryError;

    fn try_from(input: CategoryInput) -> CategoryResult<Self> {
        Ok(Self {
            name: required(input.name).ok_or(CategoryError::MissingField("name"))?,
            slug: required(input.slug).ok_or(CategoryError::MissingField("slug"))?,
            parent_id: input.parent_id,
            description: input.description.unwrap_or_default(),
            image: required(input.image).unwrap_or_else(|| DEFAULT_IMAGE.into()),
            order: input.order.unwrap_or(0),
        })
    }
}

#[derive(Clone)]
pub struct CategoryService {
    pub db: Arc<SqlitePool>,
}

impl CategoryService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Every category, in display order.
    pub async fn list(&self) -> CategoryResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT {COLUMNS} FROM categories {ORDERING}"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Every category arranged as a forest. See [`build_tree`].
    pub async fn tree(&self) -> CategoryResult<Vec<CategoryNode>> {
        let flat = self.list().await?;
        debug!("building category tree from {} rows", flat.len());
        Ok(build_tree(flat))
    }

    pub async fn get(&self, id: Uuid) -> CategoryResult<Category> {
        sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM categories WHERE id = ?"))
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => CategoryError::NotFound(id),
                other => CategoryError::Sqlx(other),
            })
    }

    pub async fn get_by_slug(&self, slug: &str) -> CategoryResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| CategoryError::SlugNotFound(slug.to_string()))
    }

    /// Direct children of `parent_id`. An unknown parent yields an empty list.
    pub async fn children(&self, parent_id: Uuid) -> CategoryResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE parent_id = ? {ORDERING}"
        ))
        .bind(parent_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, input: CategoryInput) -> CategoryResult<Category> {
        let fields = CategoryFields::try_from(input)?;
        self.ensure_slug_free(&fields.slug, None).await?;
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories ({COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.parent_id)
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(fields.order)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(category) => {
                debug!("created category {} ({})", category.id, category.slug);
                Ok(category)
            }
            Err(err) if is_unique_violation(&err) => Err(CategoryError::DuplicateSlug(fields.slug)),
            Err(err) => Err(CategoryError::Sqlx(err)),
        }
    }

    /// Replace every editable field; absent optional fields take their defaults.
    pub async fn update(&self, id: Uuid, input: CategoryInput) -> CategoryResult<Category> {
        let fields = CategoryFields::try_from(input)?;
        self.get(id).await?;
        self.ensure_slug_free(&fields.slug, Some(id)).await?;

        let updated = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories
             SET name = ?, slug = ?, parent_id = ?, description = ?, image = ?,
                 sort_order = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.parent_id)
        .bind(&fields.description)
        .bind(&fields.image)
        .bind(fields.order)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await;

        match updated {
            Ok(Some(category)) => Ok(category),
            Ok(None) => Err(CategoryError::NotFound(id)),
            Err(err) if is_unique_violation(&err) => Err(CategoryError::DuplicateSlug(fields.slug)),
            Err(err) => Err(CategoryError::Sqlx(err)),
        }
    }

    /// Delete the direct children of `id`, then `id` itself.
    /// Grandchildren are left in place with a dangling parent.
    pub async fn delete(&self, id: Uuid) -> CategoryResult<CascadeSummary> {
        self.get(id).await?;

        let children = sqlx::query("DELETE FROM categories WHERE parent_id = ? AND id != ?")
            .bind(id)
            .bind(id)
            .execute(&*self.db)
            .await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CategoryError::NotFound(id));
        }

        let summary = CascadeSummary {
            removed_children: children.rows_affected(),
        };
        info!(
            "deleted category {} with {} direct children",
            id, summary.removed_children
        );
        Ok(summary)
    }

    /// Fail with `DuplicateSlug` if another category already uses `slug`.
    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> CategoryResult<()> {
        let taken: i64 = match except {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ? AND id != ?)",
                )
                .bind(slug)
                .bind(id)
                .fetch_one(&*self.db)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ?)")
                    .bind(slug)
                    .fetch_one(&*self.db)
                    .await?
            }
        };

        if taken != 0 {
            return Err(CategoryError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}
