//! ArticleService: sectioned articles with a populated category reference.

use crate::{
    models::{
        DEFAULT_IMAGE,
        article::{
            Article, ArticleFilter, ArticleInput, ArticleRow, ArticleStatus, CategoryCount,
            CategorySummary, Section, normalize_tags,
        },
        required,
    },
    services::{contains_pattern, is_unique_violation},
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("article `{0}` not found")]
    NotFound(Uuid),
    #[error("article with slug `{0}` not found")]
    SlugNotFound(String),
    #[error("category with slug `{0}` not found")]
    CategoryNotFound(String),
    #[error("category `{0}` does not exist")]
    UnknownCategory(Uuid),
    #[error("slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ArticleResult<T> = Result<T, ArticleError>;

const COLUMNS: &str = "id, title, slug, author, image, excerpt, category_id, tags, sections, \
                       status, published_at, created_at, updated_at";

const SELECT_POPULATED: &str = "SELECT a.id, a.title, a.slug, a.author, a.image, a.excerpt, \
     a.category_id, a.tags, a.sections, a.status, a.published_at, a.created_at, a.updated_at, \
     c.name AS category_name, c.slug AS category_slug \
     FROM articles a LEFT JOIN categories c ON c.id = a.category_id";

const NEWEST_FIRST: &str = " ORDER BY a.created_at DESC, a.rowid DESC";

/// Author recorded when none is given.
pub const DEFAULT_AUTHOR: &str = "Admin";

/// Validated column values for insert and replace.
struct ArticleFields {
    title: String,
    slug: String,
    author: String,
    image: String,
    excerpt: String,
    category_id: Option<Uuid>,
    tags: Vec<String>,
    sections: Vec<Section>,
    status: ArticleStatus,
    published_at: Option<DateTime<Utc>>,
}

impl ArticleFields {
    /// `previous_publish` is the stored timestamp on update, so republishing
    /// keeps the first publication time.
    fn from_input(
        input: ArticleInput,
        previous_publish: Option<DateTime<Utc>>,
    ) -> ArticleResult<Self> {
        let status = input.status.unwrap_or_default();
        let published_at = match (input.published_at, status) {
            (Some(at), _) => Some(at),
            (None, ArticleStatus::Published) => Some(previous_publish.unwrap_or_else(Utc::now)),
            (None, ArticleStatus::Draft) => None,
        };

        Ok(Self {
            title: required(input.title).ok_or(ArticleError::MissingField("title"))?,
            slug: required(input.slug).ok_or(ArticleError::MissingField("slug"))?,
            author: required(input.author).unwrap_or_else(|| DEFAULT_AUTHOR.into()),
            image: required(input.image).unwrap_or_else(|| DEFAULT_IMAGE.into()),
            excerpt: input
                .excerpt
                .map(|e| e.trim().to_string())
                .unwrap_or_default(),
            category_id: input.category_id,
            tags: normalize_tags(input.tags.unwrap_or_default()),
            sections: input.sections.unwrap_or_default(),
            status,
            published_at,
        })
    }
}

#[derive(Clone)]
pub struct ArticleService {
    pub db: Arc<SqlitePool>,
}

impl ArticleService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Articles newest first, narrowed by every filter that is set.
    pub async fn list(&self, filter: ArticleFilter) -> ArticleResult<Vec<Article>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_POPULATED);
        builder.push(" WHERE 1 = 1");

        if let Some(category) = filter.category {
            builder.push(" AND a.category_id = ");
            builder.push_bind(category);
        }
        if let Some(status) = filter.status {
            builder.push(" AND a.status = ");
            builder.push_bind(status);
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            builder.push(" AND (a.title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(a.tags) t");
            builder.push(" WHERE t.value LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\') OR EXISTS (SELECT 1 FROM json_each(a.sections) s");
            builder.push(" WHERE json_extract(s.value, '$.title') LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR json_extract(s.value, '$.content') LIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\'))");
        }
        builder.push(NEWEST_FIRST);

        debug!("listing articles with {:?}", filter);
        let rows = builder
            .build_query_as::<ArticleRow>()
            .fetch_all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(Article::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> ArticleResult<Article> {
        sqlx::query_as::<_, ArticleRow>(&format!("{SELECT_POPULATED} WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .map(Article::from)
            .ok_or(ArticleError::NotFound(id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ArticleResult<Article> {
        sqlx::query_as::<_, ArticleRow>(&format!("{SELECT_POPULATED} WHERE a.slug = ?"))
            .bind(slug)
            .fetch_optional(&*self.db)
            .await?
            .map(Article::from)
            .ok_or_else(|| ArticleError::SlugNotFound(slug.to_string()))
    }

    /// Articles of the category with slug `category_slug`, newest first.
    pub async fn list_by_category_slug(&self, category_slug: &str) -> ArticleResult<Vec<Article>> {
        let category: Option<Uuid> = sqlx::query_scalar("SELECT id FROM categories WHERE slug = ?")
            .bind(category_slug)
            .fetch_optional(&*self.db)
            .await?;
        let category =
            category.ok_or_else(|| ArticleError::CategoryNotFound(category_slug.to_string()))?;

        self.list(ArticleFilter {
            category: Some(category),
            ..ArticleFilter::default()
        })
        .await
    }

    /// Article counts grouped by category reference, largest group first.
    /// Uncategorised articles form one group with no id.
    pub async fn count_by_category(&self) -> ArticleResult<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            "SELECT a.category_id AS category_id, c.name AS name, c.slug AS slug,
                    COUNT(*) AS count
             FROM articles a LEFT JOIN categories c ON c.id = a.category_id
             GROUP BY a.category_id
             ORDER BY count DESC, c.name ASC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(counts)
    }

    pub async fn create(&self, input: ArticleInput) -> ArticleResult<Article> {
        let fields = ArticleFields::from_input(input, None)?;
        self.ensure_slug_free(&fields.slug, None).await?;
        let category = self.resolve_category(fields.category_id).await?;
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, ArticleRow>(&format!(
            "INSERT INTO articles ({COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.author)
        .bind(&fields.image)
        .bind(&fields.excerpt)
        .bind(fields.category_id)
        .bind(Json(&fields.tags))
        .bind(Json(&fields.sections))
        .bind(fields.status)
        .bind(fields.published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                return Err(ArticleError::DuplicateSlug(fields.slug));
            }
            Err(err) => return Err(ArticleError::Sqlx(err)),
        };

        debug!("created article {} ({})", row.id, row.slug);
        Ok(with_category(row, category))
    }

    /// Replace the whole article. Fields absent from `input` take their
    /// defaults rather than keeping stored values.
    pub async fn update(&self, id: Uuid, input: ArticleInput) -> ArticleResult<Article> {
        let current = self.get(id).await?;
        let fields = ArticleFields::from_input(input, current.published_at)?;
        self.ensure_slug_free(&fields.slug, Some(id)).await?;
        let category = self.resolve_category(fields.category_id).await?;

        let updated = sqlx::query_as::<_, ArticleRow>(&format!(
            "UPDATE articles
             SET title = ?, slug = ?, author = ?, image = ?, excerpt = ?, category_id = ?,
                 tags = ?, sections = ?, status = ?, published_at = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.author)
        .bind(&fields.image)
        .bind(&fields.excerpt)
        .bind(fields.category_id)
        .bind(Json(&fields.tags))
        .bind(Json(&fields.sections))
        .bind(fields.status)
        .bind(fields.published_at)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await;

        match updated {
            Ok(Some(row)) => Ok(with_category(row, category)),
            Ok(None) => Err(ArticleError::NotFound(id)),
            Err(err) if is_unique_violation(&err) => Err(ArticleError::DuplicateSlug(fields.slug)),
            Err(err) => Err(ArticleError::Sqlx(err)),
        }
    }

    pub async fn delete(&self, id: Uuid) -> ArticleResult<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ArticleError::NotFound(id));
        }
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> ArticleResult<()> {
        let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM articles WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&*self.db)
            .await?;

        match taken {
            Some(owner) if Some(owner) != except => {
                Err(ArticleError::DuplicateSlug(slug.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// The referenced category must exist at write time.
    async fn resolve_category(&self, id: Option<Uuid>) -> ArticleResult<Option<CategorySummary>> {
        let Some(id) = id else {
            return Ok(None);
        };
        sqlx::query_as::<_, CategorySummary>("SELECT id, name, slug FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .map(Some)
            .ok_or(ArticleError::UnknownCategory(id))
    }
}

fn with_category(row: ArticleRow, category: Option<CategorySummary>) -> Article {
    let mut article = Article::from(row);
    article.category = category;
    article
}
