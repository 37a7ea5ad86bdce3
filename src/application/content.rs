//! Client-side view of the content service.

use async_trait::async_trait;
use inkpost_api_types::{Post, PostCreateRequest};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content service unreachable: {0}")]
    Transport(String),
    #[error("content service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response from content service: {0}")]
    Decode(String),
}

/// Operations the identity flow needs from the content service.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn create_post(&self, request: &PostCreateRequest) -> Result<Post, ContentError>;

    async fn list_posts(&self) -> Result<Vec<Post>, ContentError>;

    async fn get_post(&self, id: Uuid) -> Result<Post, ContentError>;

    /// Relabel every post authored exactly `old_author`; returns the number of posts changed.
    async fn rename_author(&self, old_author: &str, new_author: &str) -> Result<u64, ContentError>;
}
