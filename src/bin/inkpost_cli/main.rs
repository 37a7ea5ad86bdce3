//! inkpost-cli: keeps the device-local author identity and talks to the content API.

mod args;
mod client;
mod handlers;
mod print;


use clap::Parser;
use inkpost::infra::telemetry;
use tokio::io::BufReader;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{identity, posts};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    telemetry::init_client(cli.log_level).map_err(|err| CliError::Telemetry(err.to_string()))?;
    let ctx = build_ctx_from_cli(&cli).await?;

    match cli.command {
        Commands::Whoami => {
            identity::whoami(&ctx).await?;
        }
        Commands::Welcome(args) => {
            let mut stdin = BufReader::new(tokio::io::stdin());
            identity::welcome(&ctx, args, &mut stdin).await?;
        }
        Commands::Name(cmd) => identity::handle_name(&ctx, cmd.action).await?,
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
    }

    Ok(())
}
