//! Core data models for the content backend.
//!
//! Rows map to SQLite tables via `sqlx::FromRow` and serialize as camelCase
//! JSON via `serde`. `*Input` types are the request bodies.

pub mod article;
pub mod blog_post;
pub mod category;
pub mod upload;

/// Image used when a record is created without one.
pub const DEFAULT_IMAGE: &str = "/default-image.jpg";

/// Trim a required text field, treating blank as absent.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserialize an optional id where `null`, `""` and a missing field all
/// mean "no reference".
pub(crate) mod optional_id {
    use serde::{Deserialize, Deserializer, de::Error};
    use uuid::Uuid;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => Uuid::parse_str(raw.trim())
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid id `{}`", raw))),
        }
    }
}

/// Deserialize a query-string switch: exactly `true` is on, any other
/// value (or none) is off.
pub(crate) mod query_flag {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.as_deref() == Some("true"))
    }
}
