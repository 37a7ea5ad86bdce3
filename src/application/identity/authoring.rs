use std::sync::Arc;
use std::time::Duration;

use inkpost_api_types::{Post, PostCreateRequest};
use thiserror::Error;
use tracing::info;

use crate::application::content::{ContentApi, ContentError};
use crate::domain::error::DomainError;
use crate::domain::posts::PostDraft;

use super::store::IdentityStore;

pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("identity has not been loaded from storage yet")]
    NotHydrated,
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("content service did not answer within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Publishes posts attributed to the current author.
///
/// Attribution uses the last committed name; a rename still in flight does not
/// hold a publish back.
pub struct PostAuthoring {
    store: Arc<IdentityStore>,
    content: Arc<dyn ContentApi>,
    timeout: Duration,
}

impl PostAuthoring {
    pub fn new(store: Arc<IdentityStore>, content: Arc<dyn ContentApi>) -> Self {
        Self {
            store,
            content,
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn publish(&self, title: &str, content: &str) -> Result<Post, PublishError> {
        let identity = self.store.identity().await.ok_or(PublishError::NotHydrated)?;
        let draft = PostDraft::new(title, content, Some(identity.display_name()))?;

        let request = PostCreateRequest {
            title: draft.title,
            content: draft.content,
            author: Some(draft.author),
        };
        let post = match tokio::time::timeout(self.timeout, self.content.create_post(&request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(PublishError::Timeout(self.timeout)),
        };

        info!(
            target = "inkpost::authoring",
            post_id = %post.id,
            author = %post.author,
            "post published"
        );
        Ok(post)
    }
}
