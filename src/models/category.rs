//! Represents a node in the self-referential category taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{optional_id, query_flag};

/// A category. `parent_id == None` marks a root. The parent reference is
/// not checked: it may point at a deleted category, or form a cycle.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,

    pub name: String,

    /// Unique among categories.
    pub slug: String,

    pub parent_id: Option<Uuid>,

    pub description: String,

    pub image: String,

    /// Display order among siblings, ascending.
    #[sqlx(rename = "sort_order")]
    pub order: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for create and (whole-record) update.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "optional_id::deserialize")]
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order: Option<i64>,
}

/// A category with its nested children.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,

    pub children: Vec<CategoryNode>,
}

// Unlink descendants onto a heap stack so dropping a tall tree does not
// recurse once per level.
impl Drop for CategoryNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Query parameters for `GET /api/categories`.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct CategoryListQuery {
    /// Only the literal `true` selects the nested view.
    #[serde(default, deserialize_with = "query_flag::deserialize")]
    pub tree: bool,
}
