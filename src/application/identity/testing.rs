//! In-memory collaborators for identity tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use inkpost_api_types::{Post, PostCreateRequest};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::content::{ContentApi, ContentError};
use crate::application::repos::{IdentityStorage, StorageError};
use crate::domain::author::AuthorIdentity;
use crate::domain::posts::normalize_author;

#[derive(Default)]
pub(crate) struct MemoryStorage {
    records: Mutex<HashMap<String, AuthorIdentity>>,
    fail_loads: bool,
    fail_saves: bool,
    save_delay: Duration,
    saves: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStorage {
    pub(crate) fn failing_loads() -> Self {
        Self {
            fail_loads: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_save_delay(delay: Duration) -> Self {
        Self {
            save_delay: delay,
            ..Self::default()
        }
    }

    pub(crate) fn stored(&self, key: &str) -> Option<AuthorIdentity> {
        self.records.lock().expect("records lock").get(key).cloned()
    }

    pub(crate) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn max_concurrent_saves(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<AuthorIdentity>, StorageError> {
        if self.fail_loads {
            return Err(StorageError::Unavailable("storage disabled".into()));
        }
        Ok(self.stored(key))
    }

    async fn save(&self, key: &str, identity: &AuthorIdentity) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Unavailable("disk full".into()));
        }

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if !self.save_delay.is_zero() {
            tokio::time::sleep(self.save_delay).await;
        }
        self.records
            .lock()
            .expect("records lock")
            .insert(key.to_string(), identity.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Content service holding posts in memory.
#[derive(Default)]
pub(crate) struct MemoryContent {
    posts: Mutex<Vec<Post>>,
    fail_renames: bool,
    rename_delay: Option<Duration>,
    rename_calls: AtomicUsize,
}

impl MemoryContent {
    pub(crate) fn failing_renames() -> Self {
        Self {
            fail_renames: true,
            ..Self::default()
        }
    }

    pub(crate) fn hanging_renames(delay: Duration) -> Self {
        Self {
            rename_delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn seed(&self, author: &str, count: usize) {
        let mut posts = self.posts.lock().expect("posts lock");
        for index in 0..count {
            posts.push(Post {
                id: Uuid::new_v4(),
                title: format!("post {index}"),
                content: "body".into(),
                author: author.to_string(),
                created_at: OffsetDateTime::now_utc(),
            });
        }
    }

    pub(crate) fn authors(&self) -> Vec<String> {
        self.posts
            .lock()
            .expect("posts lock")
            .iter()
            .map(|post| post.author.clone())
            .collect()
    }

    pub(crate) fn rename_calls(&self) -> usize {
        self.rename_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentApi for MemoryContent {
    async fn create_post(&self, request: &PostCreateRequest) -> Result<Post, ContentError> {
        let post = Post {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            content: request.content.clone(),
            author: normalize_author(request.author.as_deref()),
            created_at: OffsetDateTime::now_utc(),
        };
        self.posts.lock().expect("posts lock").push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ContentError> {
        Ok(self.posts.lock().expect("posts lock").clone())
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, ContentError> {
        self.posts
            .lock()
            .expect("posts lock")
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or(ContentError::Rejected {
                status: 404,
                message: "post not found".into(),
            })
    }

    async fn rename_author(&self, old_author: &str, new_author: &str) -> Result<u64, ContentError> {
        self.rename_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.rename_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_renames {
            return Err(ContentError::Rejected {
                status: 500,
                message: "internal server error".into(),
            });
        }

        let mut posts = self.posts.lock().expect("posts lock");
        let mut updated = 0;
        for post in posts.iter_mut().filter(|post| post.author == old_author) {
            post.author = new_author.to_string();
            updated += 1;
        }
        Ok(updated)
    }
}
