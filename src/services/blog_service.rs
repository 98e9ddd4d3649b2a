//! BlogService: CRUD over the flat `blog_posts` collection.

use crate::models::{
    DEFAULT_IMAGE,
    blog_post::{BlogPost, BlogPostFilter, BlogPostInput},
    required,
};
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("blog post `{0}` not found")]
    NotFound(Uuid),
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type BlogResult<T> = Result<T, BlogError>;

const COLUMNS: &str = "id, date, title, excerpt, image, category, created_at, updated_at";

#[derive(Clone)]
pub struct BlogService {
    pub db: Arc<SqlitePool>,
}

impl BlogService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All posts, newest first, optionally restricted to one category.
    pub async fn list(&self, filter: BlogPostFilter) -> BlogResult<Vec<BlogPost>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM blog_posts"));
        if let Some(category) = filter.category {
            builder.push(" WHERE category = ");
            builder.push_bind(category);
        }
        builder.push(" ORDER BY created_at DESC, rowid DESC");

        let posts = builder.build_query_as::<BlogPost>().fetch_all(&*self.db).await?;
        Ok(posts)
    }

    pub async fn get(&self, id: Uuid) -> BlogResult<BlogPost> {
        sqlx::query_as::<_, BlogPost>(&format!("SELECT {COLUMNS} FROM blog_posts WHERE id = ?"))
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => BlogError::NotFound(id),
                other => BlogError::Sqlx(other),
            })
    }

    pub async fn create(&self, input: BlogPostInput) -> BlogResult<BlogPost> {
        let date = required(input.date).ok_or(BlogError::MissingField("date"))?;
        let title = required(input.title).ok_or(BlogError::MissingField("title"))?;
        let excerpt = required(input.excerpt).ok_or(BlogError::MissingField("excerpt"))?;
        let category = input.category.ok_or(BlogError::MissingField("category"))?;
        let image = required(input.image).unwrap_or_else(|| DEFAULT_IMAGE.into());
        let now = Utc::now();

        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "INSERT INTO blog_posts ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&date)
        .bind(&title)
        .bind(&excerpt)
        .bind(&image)
        .bind(category)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        debug!("created blog post {}", post.id);
        Ok(post)
    }

    /// Apply the fields present in `patch` on top of the stored post.
    /// A present but blank required field is rejected.
    pub async fn update(&self, id: Uuid, patch: BlogPostInput) -> BlogResult<BlogPost> {
        let current = self.get(id).await?;

        let date = merge_required(patch.date, current.date, "date")?;
        let title = merge_required(patch.title, current.title, "title")?;
        let excerpt = merge_required(patch.excerpt, current.excerpt, "excerpt")?;
        let image = match patch.image {
            Some(image) => required(Some(image)).unwrap_or_else(|| DEFAULT_IMAGE.into()),
            None => current.image,
        };
        let category = patch.category.unwrap_or(current.category);

        sqlx::query_as::<_, BlogPost>(&format!(
            "UPDATE blog_posts
             SET date = ?, title = ?, excerpt = ?, image = ?, category = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(&date)
        .bind(&title)
        .bind(&excerpt)
        .bind(&image)
        .bind(category)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(BlogError::NotFound(id))
    }

    pub async fn delete(&self, id: Uuid) -> BlogResult<()> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BlogError::NotFound(id));
        }
        Ok(())
    }
}

fn merge_required(
    patch: Option<String>,
    current: String,
    field: &'static str,
) -> BlogResult<String> {
    match patch {
        Some(value) => required(Some(value)).ok_or(BlogError::MissingField(field)),
        None => Ok(current),
    }
}
