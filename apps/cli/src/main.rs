//! docmodernizer CLI: rewrite outdated technical documentation with LLMs.
//!
//! Fetches a documentation page, analyzes it for outdated content, researches
//! current practices, generates a modernized version and scores the result.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = docmodernizer_shared::load_config()?.with_env_overrides()?;
    commands::init_tracing(&cli, &config);
    commands::run(cli, config).await
}
