//! TOML configuration for the shell server.
//!
//! Read from `--config <path>` when given, otherwise from the
//! platform-appropriate file:
//! - Linux:    `~/.config/taish/config.toml` (or `$XDG_CONFIG_HOME/taish/`)
//! - macOS:    `~/Library/Application Support/taish/config.toml`
//! - Windows:  `%APPDATA%\taish\config.toml`
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 4501
//!
//! [shell]
//! log_level = "info"
//! autoload = "simulator"
//! autoinit = true
//!
//! [simulator]
//! locations = ["1-1", "1-2"]
//! host_interfaces = 2
//! network_interfaces = 1
//! presence_delay_ms = 100
//! ```
//!
//! Every section and every field is optional; `#[serde(default = "...")]`
//! fills in what the file leaves out.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Listening socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Startup behaviour of the shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend to load before accepting connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<String>,
    /// Run `init` right after `autoload`.
    #[serde(default)]
    pub autoinit: bool,
}

/// Hardware reported by the built-in simulator backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    /// Slots that report a module, in reporting order.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "default_host_interfaces")]
    pub host_interfaces: u32,
    #[serde(default = "default_network_interfaces")]
    pub network_interfaces: u32,
    /// Delay before each presence report, in milliseconds.
    #[serde(default = "default_presence_delay_ms")]
    pub presence_delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4501
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_locations() -> Vec<String> {
    vec!["1-1".to_string(), "1-2".to_string()]
}
fn default_host_interfaces() -> u32 {
    2
}
fn default_network_interfaces() -> u32 {
    1
}
fn default_presence_delay_ms() -> u64 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            autoload: None,
            autoinit: false,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            host_interfaces: default_host_interfaces(),
            network_interfaces: default_network_interfaces(),
            presence_delay_ms: default_presence_delay_ms(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// With an explicit `path` the file must exist.  Without one, the platform
/// file is read if present and defaults are used otherwise.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => {
            let Ok(path) = config_file_path() else {
                return Ok(AppConfig::default());
            };
            match read_config(&path) {
                Err(ConfigError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    Ok(AppConfig::default())
                }
                other => other,
            }
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Resolves the platform config directory including the `taish` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("taish"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("taish"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("taish"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_config_listens_on_4501_all_interfaces() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.port, 4501);
    }

    #[test]
    fn test_default_shell_does_not_autoload() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.autoload, None);
        assert!(!cfg.autoinit);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_default_simulator_reports_two_modules() {
        let cfg = SimulatorConfig::default();
        assert_eq!(cfg.locations, vec!["1-1", "1-2"]);
        assert_eq!(cfg.host_interfaces, 2);
        assert_eq!(cfg.network_interfaces, 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
[server]
port = 9000

[simulator]
locations = ["3-1"]
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.simulator.locations, vec!["3-1"]);
        assert_eq!(cfg.simulator.presence_delay_ms, 100);
    }

    #[test]
    fn test_autoload_is_read_from_shell_section() {
        let cfg: AppConfig =
            toml::from_str("[shell]\nautoload = \"simulator\"\nautoinit = true\n").unwrap();
        assert_eq!(cfg.shell.autoload.as_deref(), Some("simulator"));
        assert!(cfg.shell.autoinit);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_io_error() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/taish.toml");

        let result = load_config(Some(&path));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_config_reads_explicit_file() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("taish_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.server.port = 12345;
        cfg.shell.autoload = Some("simulator".to_string());
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        // Act
        let loaded = load_config(Some(&path)).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("taish/config.toml"), "got {path:?}");
        }
    }
}
