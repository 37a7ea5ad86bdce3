//! Content service backing the post API.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{PostsRepo, PostsWriteRepo, RenameAuthorParams, RepoError};
use crate::domain::author::ANONYMOUS_AUTHOR;
use crate::domain::error::DomainError;
use crate::domain::posts::{PostDraft, PostRecord, normalize_author};

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenameAuthorCommand {
    pub old_author: Option<String>,
    pub new_author: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSummary {
    pub old_author: String,
    pub new_author: String,
    pub updated_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        let draft = PostDraft::new(&command.title, &command.content, command.author.as_deref())?;
        let post = self.writer.create_post(draft).await?;

        metrics::counter!("inkpost_posts_created_total").increment(1);
        info!(
            target = "inkpost::posts",
            post_id = %post.id,
            author = %post.author,
            "post created"
        );
        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<PostRecord>, PostServiceError> {
        Ok(self.reader.list_posts().await?)
    }

    pub async fn find_post(&self, id: Uuid) -> Result<PostRecord, PostServiceError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post").into())
    }

    /// Relabel every post written under `old_author` (or "Anonymous" when absent).
    pub async fn rename_author(
        &self,
        command: RenameAuthorCommand,
    ) -> Result<RenameSummary, PostServiceError> {
        let new_author = command.new_author.trim();
        if new_author.is_empty() {
            return Err(DomainError::missing("newAuthor").into());
        }
        let old_author = normalize_author(command.old_author.as_deref());

        let updated_count = self
            .writer
            .rename_author(RenameAuthorParams {
                old_author: old_author.clone(),
                new_author: new_author.to_string(),
            })
            .await?;

        metrics::counter!("inkpost_posts_relabelled_total").increment(updated_count);
        info!(
            target = "inkpost::posts",
            old_author = %old_author,
            new_author = %new_author,
            updated_count,
            "author relabelled"
        );

        Ok(RenameSummary {
            old_author,
            new_author: new_author.to_string(),
            updated_count,
        })
    }

    /// Replace all content with the demo posts shipped for fresh installs.
    pub async fn seed_demo_posts(&self) -> Result<Vec<PostRecord>, PostServiceError> {
        let removed = self.writer.delete_all_posts().await?;
        let mut created = Vec::with_capacity(DEMO_POSTS.len());
        for (title, content) in DEMO_POSTS {
            let draft = PostDraft::new(title, content, Some(ANONYMOUS_AUTHOR))?;
            created.push(self.writer.create_post(draft).await?);
        }

        info!(
            target = "inkpost::seed",
            removed,
            created = created.len(),
            "demo posts seeded"
        );
        Ok(created)
    }
}

const DEMO_POSTS: [(&str, &str); 2] = [
    (
        "Welcome to My Blog!",
        "# Welcome to My Blog!

This is the first post on a freshly installed blog. Pick a name when you write
your first post, or stay anonymous; you can change it later and every post you
wrote under the old name follows along.

## What to Expect

- Notes on building small, dependable software
- Write-ups of tools worth keeping
- The occasional detour

Thanks for stopping by.",
    ),
    (
        "Building Small Web Services",
        "# Building Small Web Services

A personal blog needs very little: a table of posts, an endpoint to add one, and
an endpoint to relabel the author when a writer changes their name.

## The Stack

- **Postgres** keeps the posts
- **An HTTP API** creates, lists and relabels them
- **A local identity** remembers who is writing

## Why Keep It Small

Fewer moving parts means fewer ways for the author name on a post and the name
on the writer's device to disagree.",
    ),
];
