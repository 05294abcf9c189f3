pub mod aggregator;
pub mod ble;
pub mod classifier;
pub mod cli;
pub mod device;
pub mod models;
pub mod monitor;
pub mod presentation;
pub mod relay;
pub mod server;
pub mod settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use settings::Settings;

pub fn run() -> Result<()> {
    utils::logging::init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.command.apply(&mut settings);

    log::info!("PostureWatch starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        match cli.command {
            Command::Serve { .. } => server::serve(&settings.server).await,
            Command::Monitor { ble, .. } => monitor::run(&settings, ble).await,
            Command::Config { output } => {
                match output {
                    Some(path) => {
                        settings.save(&path)?;
                        log::info!("settings written to {}", path.display());
                    }
                    None => println!("{}", settings.to_json()?),
                }
                Ok(())
            }
            Command::SetThreshold { value, .. } => {
                let reply = monitor::set_threshold(&settings, value).await?;
                println!("{reply}");
                Ok(())
            }
        }
    })
}
