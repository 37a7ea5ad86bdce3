use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, warn};

use crate::application::repos::IdentityStorage;
use crate::domain::author::{AuthorIdentity, AuthorName, NameError};

/// Fixed key the identity record is stored under.
pub const IDENTITY_STORAGE_KEY: &str = "author-storage";

/// Whether the persisted identity has been loaded into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Hydration has not finished; the in-memory value means nothing yet.
    Pending,
    /// The persisted record (or a fresh one) is loaded and writes are persisted.
    Ready,
    /// Storage could not be read; the identity lives in memory for this session only.
    Unavailable,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] NameError),
    #[error("identity has not been loaded from storage yet")]
    NotHydrated,
}

/// Device-local author identity.
///
/// Writes are serialized on a writer lock that a multi-step change (a rename) may
/// hold across await points. Reads never take that lock: they see the last
/// committed identity, published through a `watch` channel.
pub struct IdentityStore {
    storage: Arc<dyn IdentityStorage>,
    key: String,
    writer: Mutex<()>,
    committed: watch::Sender<AuthorIdentity>,
    persistent: AtomicBool,
    readiness: watch::Sender<Readiness>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn IdentityStorage>) -> Self {
        Self::with_key(storage, IDENTITY_STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn IdentityStorage>, key: impl Into<String>) -> Self {
        let (readiness, _) = watch::channel(Readiness::Pending);
        let (committed, _) = watch::channel(AuthorIdentity::default());
        Self {
            storage,
            key: key.into(),
            writer: Mutex::new(()),
            committed,
            persistent: AtomicBool::new(false),
            readiness,
        }
    }

    pub fn readiness(&self) -> Readiness {
        *self.readiness.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    /// Load the persisted record. Calling it again after it has settled is a no-op.
    pub async fn hydrate(&self) -> Readiness {
        let _writer = self.writer.lock().await;
        let current = self.readiness();
        if current != Readiness::Pending {
            return current;
        }

        let next = match self.storage.load(&self.key).await {
            Ok(stored) => {
                let identity = stored.unwrap_or_default();
                debug!(
                    target = "inkpost::identity",
                    key = %self.key,
                    has_name = identity.has_name(),
                    "identity hydrated"
                );
                self.committed.send_replace(identity);
                self.persistent.store(true, Ordering::SeqCst);
                Readiness::Ready
            }
            Err(err) => {
                metrics::counter!("inkpost_identity_storage_failures_total").increment(1);
                warn!(
                    target = "inkpost::identity",
                    key = %self.key,
                    error = %err,
                    "identity storage unavailable; keeping identity in memory for this session"
                );
                Readiness::Unavailable
            }
        };

        self.readiness.send_replace(next);
        next
    }

    /// Resolve once hydration has settled, either way.
    pub async fn wait_hydrated(&self) -> Readiness {
        let mut receiver = self.readiness.subscribe();
        match receiver
            .wait_for(|readiness| *readiness != Readiness::Pending)
            .await
        {
            Ok(readiness) => *readiness,
            Err(_) => self.readiness(),
        }
    }

    /// Last committed identity, or `None` while it is still indeterminate.
    ///
    /// Never waits on a write in flight; during a rename this is the old name.
    pub async fn identity(&self) -> Option<AuthorIdentity> {
        match self.readiness() {
            Readiness::Pending => None,
            Readiness::Ready | Readiness::Unavailable => Some(self.committed.borrow().clone()),
        }
    }

    /// Whether writes currently reach durable storage.
    pub async fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::SeqCst)
    }

    pub async fn set_name(&self, raw: &str) -> Result<AuthorIdentity, IdentityError> {
        let name = AuthorName::parse(raw)?;
        self.update(|identity| {
            identity.name = Some(name);
            identity.initialized = true;
        })
        .await
    }

    pub async fn set_welcome_suppressed(
        &self,
        suppressed: bool,
    ) -> Result<AuthorIdentity, IdentityError> {
        self.update(|identity| identity.welcome_suppressed = suppressed)
            .await
    }

    pub async fn reset_welcome(&self) -> Result<AuthorIdentity, IdentityError> {
        self.set_welcome_suppressed(false).await
    }

    pub async fn mark_welcome_completed(&self) -> Result<AuthorIdentity, IdentityError> {
        self.update(|identity| identity.welcome_completed = true)
            .await
    }

    /// Record a visit by an author who has not picked a name yet.
    pub async fn initialize(&self) -> Result<AuthorIdentity, IdentityError> {
        self.update(|identity| {
            if !identity.initialized && identity.name.is_none() {
                identity.initialized = true;
            }
        })
        .await
    }

    async fn update(
        &self,
        mutate: impl FnOnce(&mut AuthorIdentity),
    ) -> Result<AuthorIdentity, IdentityError> {
        let update = self.begin_update().await?;
        let mut next = update.current().clone();
        mutate(&mut next);
        Ok(update.commit(next).await)
    }

    /// Take the writer lock for a multi-step change. Other writes wait until the
    /// returned guard is committed or dropped; reads keep seeing the last commit.
    pub(crate) async fn begin_update(&self) -> Result<IdentityUpdate<'_>, IdentityError> {
        let writer = self.writer.lock().await;
        if self.readiness() == Readiness::Pending {
            return Err(IdentityError::NotHydrated);
        }
        let current = self.committed.borrow().clone();
        Ok(IdentityUpdate {
            store: self,
            current,
            _writer: writer,
        })
    }
}

pub(crate) struct IdentityUpdate<'a> {
    store: &'a IdentityStore,
    current: AuthorIdentity,
    _writer: MutexGuard<'a, ()>,
}

impl IdentityUpdate<'_> {
    pub(crate) fn current(&self) -> &AuthorIdentity {
        &self.current
    }

    /// Publish the identity and persist it. A failed write never fails the caller: the
    /// store falls back to keeping the identity in memory for the rest of the session.
    pub(crate) async fn commit(self, next: AuthorIdentity) -> AuthorIdentity {
        if next == self.current {
            return next;
        }
        let store = self.store;
        store.committed.send_replace(next.clone());

        if store.persistent.load(Ordering::SeqCst) {
            if let Err(err) = store.storage.save(&store.key, &next).await {
                metrics::counter!("inkpost_identity_storage_failures_total").increment(1);
                warn!(
                    target = "inkpost::identity",
                    key = %store.key,
                    error = %err,
                    "failed to persist identity; further changes stay in memory"
                );
                store.persistent.store(false, Ordering::SeqCst);
            }
        }

        next
    }
}
