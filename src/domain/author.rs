//! Author identity held on the writer's device.
//!
//! The name is a free-text label: posts copy it at creation time and never refer
//! back to the identity, so the two can drift apart until a rename relabels them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use inkpost_api_types::ANONYMOUS_AUTHOR;

/// Upper bound on the trimmed name, counted in Unicode scalar values.
pub const MAX_AUTHOR_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("please enter your name")]
    Empty,
    #[error("name must be {max} characters or less (got {len})")]
    TooLong { len: usize, max: usize },
}

/// A trimmed, non-empty author name of at most [`MAX_AUTHOR_NAME_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorName(String);

impl AuthorName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }

        let len = trimmed.chars().count();
        if len > MAX_AUTHOR_NAME_CHARS {
            return Err(NameError::TooLong {
                len,
                max: MAX_AUTHOR_NAME_CHARS,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_AUTHOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AuthorName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AuthorName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AuthorName> for String {
    fn from(value: AuthorName) -> Self {
        value.0
    }
}

/// Locally owned author identity plus the onboarding flags that travel with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: Option<AuthorName>,
    pub initialized: bool,
    pub welcome_suppressed: bool,
    pub welcome_completed: bool,
}

impl AuthorIdentity {
    /// Label stamped on new posts: the chosen name, or "Anonymous" while unset.
    pub fn display_name(&self) -> &str {
        self.name
            .as_ref()
            .map(AuthorName::as_str)
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }
}
