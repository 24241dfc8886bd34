//! autocat CLI — a programmable `cat` for text sources and generator scripts.
//!
//! Concatenates files, URLs, inline text, and the stdout of discovered
//! executable generators into one deterministic stream.

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
