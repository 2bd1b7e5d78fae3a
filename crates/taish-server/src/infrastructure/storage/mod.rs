//! File-system storage: the TOML configuration file.

pub mod config;

pub use config::{load_config, AppConfig, ConfigError, ServerConfig, ShellConfig, SimulatorConfig};
