//! Command-line surface for `inkpost-cli`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "inkpost-cli",
    version,
    about = "inkpost client: local author identity and posts",
    long_about = None
)]
pub struct Cli {
    /// Content API base URL, e.g. <http://127.0.0.1:3000>
    #[arg(long, env = "INKPOST_SITE_URL")]
    pub site: Option<String>,

    /// Directory holding the device-local author identity
    #[arg(long, env = "INKPOST_DATA_DIR", default_value = ".inkpost")]
    pub data_dir: PathBuf,

    /// Upper bound for each call to the content API
    #[arg(long, env = "INKPOST_TIMEOUT_SECONDS", default_value_t = 10)]
    pub timeout_seconds: u64,

    /// Pause before the welcome prompt opens
    #[arg(long, env = "INKPOST_WELCOME_DELAY_MS", default_value_t = 400)]
    pub welcome_delay_ms: u64,

    /// Log level for diagnostics on stderr (trace|debug|info|warn|error|off)
    #[arg(long, env = "INKPOST_LOG_LEVEL", default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the local author identity
    Whoami,
    /// Run first-visit onboarding
    Welcome(WelcomeArgs),
    /// Change the author name or welcome preferences
    Name(NameArgs),
    /// Read and write posts
    Posts(PostsArgs),
}

#[derive(Parser, Debug, Default)]
pub struct WelcomeArgs {
    /// Answer the welcome prompt with this name
    #[arg(long, conflicts_with = "anonymous")]
    pub name: Option<String>,
    /// Answer the welcome prompt by staying anonymous
    #[arg(long)]
    pub anonymous: bool,
    /// Never show the welcome prompt again on this device
    #[arg(long)]
    pub dont_show_again: bool,
}

#[derive(Parser, Debug)]
pub struct NameArgs {
    #[command(subcommand)]
    pub action: NameCmd,
}

#[derive(Subcommand, Debug)]
pub enum NameCmd {
    /// Set the author name, relabelling posts written under the previous one
    Set { name: String },
    /// Allow the welcome prompt to show again
    ResetWelcome,
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts, newest first
    List,
    /// Show one post
    Get { id: Uuid },
    /// Publish a post under the current author name
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, required_unless_present = "content_file", conflicts_with = "content_file")]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
}
