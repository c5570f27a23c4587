//! Validate configuration command.

use anyhow::Result;
use backtest_config::load_config;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!(
                "Replay pair: {}/{}",
                config.replay.quote_name, config.replay.base_name
            );
            println!("Replay steps: {}", config.replay.steps);
            println!("Fee rate: {}", config.replay.fee_rate);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
