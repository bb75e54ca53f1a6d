pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::AppConfig};
pub use crate::core::{booking::BookingEngine, catalog::Catalog, slots::SlotPlan};
pub use crate::server::state::AppState;
pub use crate::utils::error::{BookingError, Result};
