//! File-backed identity storage: one JSON document per key inside a data directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::repos::{IdentityStorage, StorageError};
use crate::domain::author::{AuthorIdentity, AuthorName};

const ENVELOPE_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: PersistedIdentity,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedIdentity {
    author_name: Option<String>,
    is_initialized: bool,
    hide_welcome_dialog: bool,
    welcome_completed: bool,
}

impl From<&AuthorIdentity> for PersistedIdentity {
    fn from(identity: &AuthorIdentity) -> Self {
        Self {
            author_name: identity.name.as_ref().map(|name| name.as_str().to_string()),
            is_initialized: identity.initialized,
            hide_welcome_dialog: identity.welcome_suppressed,
            welcome_completed: identity.welcome_completed,
        }
    }
}

impl PersistedIdentity {
    fn into_identity(self, path: &Path) -> AuthorIdentity {
        let name = match self.author_name.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match AuthorName::parse(raw) {
                Ok(name) => Some(name),
                Err(err) => {
                    warn!(
                        target = "inkpost::identity::storage",
                        path = %path.display(),
                        error = %err,
                        "stored author name is invalid; ignoring it"
                    );
                    None
                }
            },
        };

        AuthorIdentity {
            name,
            initialized: self.is_initialized,
            welcome_suppressed: self.hide_welcome_dialog,
            welcome_completed: self.welcome_completed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileIdentityStorage {
    root: PathBuf,
}

impl FileIdentityStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Unavailable(format!(
                "invalid storage key `{key}`"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl IdentityStorage for FileIdentityStorage {
    async fn load(&self, key: &str) -> Result<Option<AuthorIdentity>, StorageError> {
        let path = self.record_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    target = "inkpost::identity::storage",
                    path = %path.display(),
                    "no identity record yet"
                );
                return Ok(None);
            }
            Err(err) => {
                return Err(StorageError::Unavailable(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) => {
                if envelope.version != ENVELOPE_VERSION {
                    warn!(
                        target = "inkpost::identity::storage",
                        path = %path.display(),
                        version = envelope.version,
                        "unexpected identity record version; reading it anyway"
                    );
                }
                Ok(Some(envelope.state.into_identity(&path)))
            }
            Err(err) => {
                warn!(
                    target = "inkpost::identity::storage",
                    path = %path.display(),
                    error = %err,
                    "identity record is unreadable; starting from an empty identity"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, key: &str, identity: &AuthorIdentity) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        let envelope = Envelope {
            state: PersistedIdentity::from(identity),
            version: ENVELOPE_VERSION,
        };
        let bytes = serde_json::to_vec_pretty(&envelope)
            .map_err(|err| StorageError::Encode(err.to_string()))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| unavailable("create", &self.root, err))?;

        // Write then rename, so a crash never leaves a half-written record behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|err| unavailable("write", &tmp, err))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| unavailable("replace", &path, err))?;

        Ok(())
    }
}

fn unavailable(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Unavailable(format!("failed to {action} {}: {err}", path.display()))
}
