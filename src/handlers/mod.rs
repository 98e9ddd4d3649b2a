pub mod article_handlers;
pub mod blog_handlers;
pub mod category_handlers;
pub mod health_handlers;
pub mod media_handlers;

use serde::Serialize;

/// `{"message": ...}` body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
