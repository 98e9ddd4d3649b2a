//! Represents a simple, flat blog post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The closed set of blog post categories.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
pub enum BlogCategory {
    Events,
    Products,
    General,
}

/// A blog post as stored and returned by the API.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,

    /// Display date, kept verbatim as submitted.
    pub date: String,

    pub title: String,

    pub excerpt: String,

    /// Image path or URL.
    pub image: String,

    pub category: BlogCategory,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for create and update. On update only present fields are applied.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    pub date: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<BlogCategory>,
}

/// Query parameters for listing blog posts.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct BlogPostFilter {
    pub category: Option<BlogCategory>,
}
