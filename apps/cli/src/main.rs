//! Postnote CLI — add endnote blocks to posts over the Admin API.
//!
//! One-shot, idempotent migration: fetches the targeted posts, upserts the
//! endnote block into each post's content, and writes the result back.

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
