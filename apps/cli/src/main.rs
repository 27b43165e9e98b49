//! tutpage CLI: renders the Svelte tutorial as a single HTML page.
//!
//! Rebuilds only when the upstream tutorial content has changed since the
//! last successful build.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
