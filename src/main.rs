mod app;
mod catalog;
mod config;
mod domain;
mod error;
mod guard;
mod lifecycle;
mod logging;
mod paths;
mod resolver;
mod restore;
mod store;

use anyhow::Result;
use app::{AppContext, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::load()?;

    if !logging::init(&ctx.home, &ctx.config.logging) && ctx.config.logging.file_log {
        eprintln!("[paneweave] Warning: file logging could not be initialized");
    }
    tracing::debug!(
        version = env!("PANEWEAVE_VERSION"),
        home = %ctx.home.display(),
        "paneweave starting"
    );

    match cli.command {
        Command::Browse(args) => app::browse::run(ctx, args).await,
        Command::Sessions(command) => app::sessions_cmd::run(&ctx, command),
    }
}
