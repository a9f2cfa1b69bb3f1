mod api;
mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cli::commands::run_cli;
use cli::opts::Cli;
use config::{FileConfig, Settings};

fn main() -> Result<()> {
    // RUST_LOG overrides; default is info, on stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let file = FileConfig::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file);

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args, settings))
}
