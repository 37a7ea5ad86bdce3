//! Posts as stored by the content service.

use time::OffsetDateTime;
use uuid::Uuid;

use super::author::ANONYMOUS_AUTHOR;
use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Author label copied when the post was written; not a reference to any identity.
    pub author: String,
    pub created_at: OffsetDateTime,
}

/// A validated, normalised post ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl PostDraft {
    pub fn new(title: &str, content: &str, author: Option<&str>) -> Result<Self, DomainError> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() {
            return Err(DomainError::missing("title"));
        }
        if content.is_empty() {
            return Err(DomainError::missing("content"));
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            author: normalize_author(author),
        })
    }
}

/// Trim an optional author label, substituting "Anonymous" when nothing usable remains.
pub fn normalize_author(author: Option<&str>) -> String {
    author
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_AUTHOR)
        .to_string()
}
