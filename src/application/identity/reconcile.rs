use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::content::{ContentApi, ContentError};
use crate::domain::author::{AuthorName, NameError};

use super::store::{IdentityError, IdentityStore};

pub const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// No name had been committed before; nothing on the server to relabel.
    FirstName { name: AuthorName },
    /// The requested name is already the current one.
    Unchanged { name: AuthorName },
    /// Posts were relabelled on the server and the new name committed locally.
    Relabelled {
        from: String,
        to: AuthorName,
        updated_count: u64,
    },
}

impl RenameOutcome {
    pub fn name(&self) -> &AuthorName {
        match self {
            Self::FirstName { name } | Self::Unchanged { name } => name,
            Self::Relabelled { to, .. } => to,
        }
    }

    pub fn updated_count(&self) -> u64 {
        match self {
            Self::Relabelled { updated_count, .. } => *updated_count,
            Self::FirstName { .. } | Self::Unchanged { .. } => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileFailure {
    #[error("content service did not answer within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Debug, Error)]
pub enum RenameError {
    #[error(transparent)]
    Validation(#[from] NameError),
    #[error("identity has not been loaded from storage yet")]
    NotHydrated,
    #[error("no content service configured; cannot relabel posts written as `{from}`")]
    Offline { from: String },
    #[error("failed to update author name from `{from}` to `{to}`; please try again: {reason}")]
    Reconciliation {
        from: String,
        to: String,
        #[source]
        reason: ReconcileFailure,
    },
}

impl RenameError {
    /// Re-issuing the same rename is safe after a reconciliation failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Reconciliation { .. })
    }
}

impl From<IdentityError> for RenameError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Validation(err) => Self::Validation(err),
            IdentityError::NotHydrated => Self::NotHydrated,
        }
    }
}

/// Changes the author name and relabels the posts written under the old one.
///
/// The server relabel runs first; the local name is committed only once it succeeds.
/// The identity writer lock is held for the whole operation, so no other identity
/// write can interleave with a rename in flight. Reads keep returning the old name
/// until the commit.
pub struct RenameReconciler {
    store: Arc<IdentityStore>,
    content: Option<Arc<dyn ContentApi>>,
    timeout: Duration,
}

impl RenameReconciler {
    pub fn new(store: Arc<IdentityStore>, content: Arc<dyn ContentApi>) -> Self {
        Self {
            store,
            content: Some(content),
            timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    /// A reconciler with no content service: first names and unchanged names still
    /// commit, a real rename fails with [`RenameError::Offline`].
    pub fn offline(store: Arc<IdentityStore>) -> Self {
        Self {
            store,
            content: None,
            timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn rename_author(&self, raw: &str) -> Result<RenameOutcome, RenameError> {
        let new_name = AuthorName::parse(raw)?;
        let update = self.store.begin_update().await?;
        let current = update.current().clone();

        if current.name.is_none() {
            let mut next = current;
            next.name = Some(new_name.clone());
            next.initialized = true;
            update.commit(next).await;
            info!(
                target = "inkpost::identity::rename",
                name = %new_name,
                "first author name committed locally"
            );
            return Ok(RenameOutcome::FirstName { name: new_name });
        }

        if current.name.as_ref() == Some(&new_name) {
            return Ok(RenameOutcome::Unchanged { name: new_name });
        }

        let from = current.display_name().to_string();
        let Some(content) = self.content.as_ref() else {
            return Err(RenameError::Offline { from });
        };
        let relabel = content.rename_author(&from, new_name.as_str());
        let result = match tokio::time::timeout(self.timeout, relabel).await {
            Ok(result) => result.map_err(ReconcileFailure::from),
            Err(_) => Err(ReconcileFailure::Timeout(self.timeout)),
        };

        let updated_count = match result {
            Ok(count) => count,
            Err(reason) => {
                metrics::counter!("inkpost_author_rename_failures_total").increment(1);
                warn!(
                    target = "inkpost::identity::rename",
                    from = %from,
                    to = %new_name,
                    error = %reason,
                    "author relabel failed; local name left unchanged"
                );
                return Err(RenameError::Reconciliation {
                    from,
                    to: new_name.into_inner(),
                    reason,
                });
            }
        };

        let mut next = current;
        next.name = Some(new_name.clone());
        next.initialized = true;
        update.commit(next).await;

        metrics::counter!("inkpost_author_renames_total").increment(1);
        info!(
            target = "inkpost::identity::rename",
            from = %from,
            to = %new_name,
            updated_count,
            "author renamed"
        );

        Ok(RenameOutcome::Relabelled {
            from,
            to: new_name,
            updated_count,
        })
    }
}
