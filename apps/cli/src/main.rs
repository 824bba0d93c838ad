//! arxiv-daily CLI: keeps a repository's paper list up to date.
//!
//! Queries arxiv for configured topics, appends new papers to JSON indexes,
//! and renders them as markdown for the README and GitHub Pages.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
