pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "glow-atelier")]
#[command(about = "Booking site backend: catalog, deposits, availability and confirmation email")]
pub struct CliConfig {
    /// Path to the site's TOML configuration
    #[arg(short, long, default_value = "glow-atelier.toml")]
    pub config: String,

    /// Override the port from the config file
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs")]
    pub json_logs: bool,
}
