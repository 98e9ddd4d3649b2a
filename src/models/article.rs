//! Represents a sectioned article that belongs to a category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use super::optional_id;

/// Publication state.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

/// One embedded, ordered section of an article body.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Section {
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            title: String::new(),
            slug: String::new(),
            kind: "text".into(),
            content: String::new(),
        }
    }
}

/// The populated form of an article's category reference.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// An article as returned by the API, with its category populated.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub image: String,
    pub excerpt: String,
    /// Raw reference, kept even when the category no longer exists.
    pub category_id: Option<Uuid>,
    /// `None` when there is no reference or it dangles.
    pub category: Option<CategorySummary>,
    pub tags: Vec<String>,
    pub sections: Vec<Section>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of `articles` LEFT JOIN `categories`.
///
/// The joined columns default to `None` so the same type also decodes
/// `RETURNING` clauses that only cover the article table.
#[derive(FromRow, Debug)]
pub(crate) struct ArticleRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub image: String,
    pub excerpt: String,
    pub category_id: Option<Uuid>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    #[sqlx(json)]
    pub sections: Vec<Section>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub category_name: Option<String>,
    #[sqlx(default)]
    pub category_slug: Option<String>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategorySummary { id, name, slug }),
            _ => None,
        };
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            author: row.author,
            image: row.image,
            excerpt: row.excerpt,
            category_id: row.category_id,
            category,
            tags: row.tags,
            sections: row.sections,
            status: row.status,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request body for create and (whole-document) update.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "optional_id::deserialize")]
    pub category_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub sections: Option<Vec<Section>>,
    pub status: Option<ArticleStatus>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /api/posts`. All filters combine with AND.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ArticleFilter {
    /// Category reference.
    pub category: Option<Uuid>,
    pub status: Option<ArticleStatus>,
    /// Case-insensitive substring over title, sections and tags.
    pub search: Option<String>,
}

/// One group of `GET /api/posts/stats/count-by-category`.
#[derive(Serialize, FromRow, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub count: i64,
}

/// Trim tags, drop blanks, and drop repeats keeping the first occurrence.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_behave_as_an_ordered_set() {
        let tags = vec![
            " rust ".to_string(),
            "web".to_string(),
            "".to_string(),
            "rust".to_string(),
            "  ".to_string(),
            "api".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["rust", "web", "api"]);
    }

    #[test]
    fn section_type_defaults_to_text() {
        let section: Section = serde_json::from_str(r#"{"title":"Intro"}"#).unwrap();
        assert_eq!(section.kind, "text");
        assert_eq!(section.title, "Intro");
        assert!(section.content.is_empty());
    }

    #[test]
    fn status_uses_lowercase_names() {
        let status: ArticleStatus = serde_json::from_str(r#""published""#).unwrap();
        assert_eq!(status, ArticleStatus::Published);
        assert!(serde_json::from_str::<ArticleStatus>(r#""archived""#).is_err());
    }

    #[test]
    fn dangling_reference_is_not_populated() {
        let now = Utc::now();
        let row = ArticleRow {
            id: Uuid::new_v4(),
            title: "t".into(),
            slug: "t".into(),
            author: "Admin".into(),
            image: "/i.jpg".into(),
            excerpt: String::new(),
            category_id: Some(Uuid::new_v4()),
            tags: vec![],
            sections: vec![],
            status: ArticleStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
            category_name: None,
            category_slug: None,
        };
        let article = Article::from(row);
        assert!(article.category_id.is_some());
        assert!(article.category.is_none());
    }
}
