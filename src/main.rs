mod auth;
mod cli;
mod credentials;
mod error;
mod gateway;
mod models;
mod session;
mod stats;
mod view;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting piqdash - PipelineIQ dashboard client");
    cli.execute().await?;

    Ok(())
}
