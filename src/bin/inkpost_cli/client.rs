use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use inkpost::application::content::{ContentApi, ContentError};
use inkpost::application::identity::{
    IdentityError, IdentityStore, OnboardingError, PublishError, RenameError,
};
use inkpost::infra::content_client::HttpContentClient;
use inkpost::infra::storage::FileIdentityStorage;
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("site URL is required (use --site or INKPOST_SITE_URL)")]
    MissingSite,
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Rename(#[from] RenameError),
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("{0}")]
    Output(String),
    #[error("failed to initialise logging: {0}")]
    Telemetry(String),
}

pub struct Ctx {
    pub store: Arc<IdentityStore>,
    content: Option<Arc<dyn ContentApi>>,
    pub timeout: Duration,
    pub welcome_delay: Duration,
}

impl Ctx {
    /// Open the identity stored under `data_dir` and wait for it to load.
    pub async fn open(
        site: Option<&str>,
        data_dir: &Path,
        timeout: Duration,
        welcome_delay: Duration,
    ) -> Result<Self, CliError> {
        let content = match site {
            Some(site) => {
                let client: Arc<dyn ContentApi> = Arc::new(HttpContentClient::new(site, timeout)?);
                Some(client)
            }
            None => None,
        };

        let storage = Arc::new(FileIdentityStorage::new(data_dir));
        let store = Arc::new(IdentityStore::new(storage));
        store.hydrate().await;

        Ok(Self {
            store,
            content,
            timeout,
            welcome_delay,
        })
    }

    pub fn content(&self) -> Result<Arc<dyn ContentApi>, CliError> {
        self.content_client().ok_or(CliError::MissingSite)
    }

    pub fn content_client(&self) -> Option<Arc<dyn ContentApi>> {
        self.content.clone()
    }
}

pub async fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    Ctx::open(
        cli.site.as_deref(),
        &cli.data_dir,
        Duration::from_secs(cli.timeout_seconds),
        Duration::from_millis(cli.welcome_delay_ms),
    )
    .await
}

pub fn read_content(inline: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        return fs::read_to_string(&path).map_err(|source| CliError::InputFile {
            path: path.display().to_string(),
            source,
        });
    }
    inline.ok_or_else(|| CliError::InvalidInput("--content or --content-file is required".into()))
}
