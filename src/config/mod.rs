pub mod settings;

use crate::utils::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;

pub use settings::AppConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "restaurant-bot")]
#[command(about = "Telegram bot that recommends a restaurant from a Google Sheet catalog")]
pub struct CliArgs {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long, env = "BOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Health endpoint port (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

impl CliArgs {
    pub fn load_config(&self) -> crate::Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.server.port = port;
        }
        Ok(config)
    }
}
