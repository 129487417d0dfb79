//! Application configuration for vulnfeed.
//!
//! User config lives at `~/.vulnfeed/vulnfeed.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VulnfeedError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vulnfeed.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vulnfeed";

// ---------------------------------------------------------------------------
// Config structs (matching vulnfeed.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Feed provider identity used for provenance stamping.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default database path for `vulnfeed ingest`.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Batch error policy: "skip" or "abort".
    #[serde(default = "default_error_policy")]
    pub error_policy: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            error_policy: default_error_policy(),
        }
    }
}

fn default_db_path() -> String {
    "var/vulnfeed.db".into()
}
fn default_error_policy() -> String {
    "skip".into()
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Data source name recorded in provenance.
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Source version recorded in provenance.
    #[serde(default = "default_provider_version")]
    pub version: u32,

    /// Processing agent identifier recorded in provenance.
    #[serde(default = "default_processor")]
    pub processor: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            version: default_provider_version(),
            processor: default_processor(),
        }
    }
}

fn default_provider_name() -> String {
    "kev".into()
}
fn default_provider_version() -> u32 {
    1
}
fn default_processor() -> String {
    concat!("vulnfeed@", env!("CARGO_PKG_VERSION")).into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vulnfeed/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VulnfeedError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vulnfeed/vulnfeed.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VulnfeedError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        VulnfeedError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VulnfeedError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VulnfeedError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VulnfeedError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the configured provider identity is usable for provenance.
pub fn validate_provider(config: &AppConfig) -> Result<()> {
    if config.provider.name.trim().is_empty() {
        return Err(VulnfeedError::config("provider name must not be empty"));
    }
    if config.provider.processor.trim().is_empty() {
        return Err(VulnfeedError::config("provider processor must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("kev"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.error_policy, "skip");
        assert_eq!(parsed.provider.name, "kev");
        assert_eq!(parsed.provider.version, 1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[provider]
name = "kev"
version = 12
processor = "vunnel@1.2.3"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.provider.version, 12);
        assert_eq!(config.provider.processor, "vunnel@1.2.3");
        assert_eq!(config.defaults.db_path, "var/vulnfeed.db");
    }

    #[test]
    fn provider_validation() {
        let mut config = AppConfig::default();
        config.provider.name = "  ".into();
        let result = validate_provider(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("provider name"));
    }
}
