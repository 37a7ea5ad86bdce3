//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::author::AuthorIdentity;
use crate::domain::posts::{PostDraft, PostRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RenameAuthorParams {
    pub old_author: String,
    pub new_author: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, draft: PostDraft) -> Result<PostRecord, RepoError>;

    /// Rewrite `author` on every post whose author equals `old_author` exactly.
    /// Implementations must apply the change atomically and return the number of rows touched.
    async fn rename_author(&self, params: RenameAuthorParams) -> Result<u64, RepoError>;

    async fn delete_all_posts(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("identity storage is unavailable: {0}")]
    Unavailable(String),
    #[error("identity record could not be encoded: {0}")]
    Encode(String),
}

/// Durable, device-local storage for the author identity.
#[async_trait]
pub trait IdentityStorage: Send + Sync {
    /// Load the record stored under `key`; `Ok(None)` means nothing was stored yet.
    async fn load(&self, key: &str) -> Result<Option<AuthorIdentity>, StorageError>;

    async fn save(&self, key: &str, identity: &AuthorIdentity) -> Result<(), StorageError>;
}
