pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Server,
    Client,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("quoting starting...");

    let config = crate::core::config::AppConfig::load(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Server => cli::server::serve(&config).await,
        AppCommand::Client => cli::client::fetch_and_persist(&config.client)
            .await
            .map(|_| ()),
    }
}
