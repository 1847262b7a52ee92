//! Site configuration module.
//!
//! Handles loading, validating, and merging `menu-sync.toml`. The file lives
//! in the site root and is sparse: stock defaults are overridden key by key
//! by whatever the file specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! menu = "data/menu.json"            # Canonical menu file
//! # backup = "data/menu.json.bak"    # Defaults to <menu>.bak
//! mirror = "menu.html"               # HTML fragment; "" disables it
//! preference = ".menu-sync/language" # Stored UI language
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8787
//!
//! [languages]
//! default = "en"
//!
//! [harness]
//! required_dirs = ["data"]
//! required_files = ["data/menu.json", "index.html", "api/save-menu.php", "api/load-menu.php"]
//! ready_timeout_ms = 3000
//! ready_poll_ms = 100
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::i18n::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file looked up in the site root.
pub const CONFIG_FILENAME: &str = "menu-sync.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `menu-sync.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// File locations, relative to the site root.
    pub paths: PathsConfig,
    /// Publish endpoint bind address.
    pub server: ServerConfig,
    /// Language defaults.
    pub languages: LanguagesConfig,
    /// Environment checks run by `setup` / `teardown`.
    pub harness: HarnessConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.menu.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.menu must not be empty".into(),
            ));
        }
        if self.paths.backup.as_deref() == Some(self.paths.menu.as_str()) {
            return Err(ConfigError::Validation(
                "paths.backup must differ from paths.menu".into(),
            ));
        }
        if self.paths.mirror == self.paths.menu {
            return Err(ConfigError::Validation(
                "paths.mirror must differ from paths.menu".into(),
            ));
        }
        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            )));
        }
        if self.harness.ready_poll_ms == 0 {
            return Err(ConfigError::Validation(
                "harness.ready_poll_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Canonical menu JSON.
    pub menu: String,
    /// Backup of the previous generation. When absent, `<menu>.bak`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    /// HTML fragment mirror. Empty string disables mirroring.
    pub mirror: String,
    /// File holding the operator's UI language.
    pub preference: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            menu: "data/menu.json".to_string(),
            backup: None,
            mirror: "menu.html".to_string(),
            preference: ".menu-sync/language".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.host.parse::<std::net::IpAddr>().map_err(|_| {
            ConfigError::Validation(format!("server.host '{}' is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguagesConfig {
    /// Language used when no preference is stored and for string fallback.
    pub default: Language,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            default: Language::En,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directories `setup` creates when absent.
    pub required_dirs: Vec<String>,
    /// Files `setup` checks for (and reports, never creates).
    pub required_files: Vec<String>,
    /// How long `setup` waits for the server to accept connections.
    pub ready_timeout_ms: u64,
    /// Delay between readiness probes.
    pub ready_poll_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            required_dirs: vec!["data".to_string()],
            required_files: vec![
                "data/menu.json".to_string(),
                "index.html".to_string(),
                "api/save-menu.php".to_string(),
                "api/load-menu.php".to_string(),
            ],
            ready_timeout_ms: 3000,
            ready_poll_ms: 100,
        }
    }
}

impl HarnessConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load `menu-sync.toml` from `root`, or the explicit `path` when given.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing `menu-sync.toml` in `root` means
/// stock defaults; a missing explicit `path` is an error.
pub fn load_config(root: &Path, path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(toml::from_str(&fs::read_to_string(p)?)?),
        None => load_raw_config(&root.join(CONFIG_FILENAME))?,
    };
    let merged = match overlay {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `menu-sync.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# menu-sync configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the site root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[paths]
# Canonical menu file read by the public site on every page load.
menu = "data/menu.json"

# Previous generation, written just before every publish.
# Defaults to the menu path with ".bak" appended.
# backup = "data/menu.json.bak"

# Static HTML fragment rebuilt after every publish. Set to "" to disable.
mirror = "menu.html"

# Where the operator's UI language (en/he) is remembered.
preference = ".menu-sync/language"

# ---------------------------------------------------------------------------
# Publish endpoint
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 8787

# ---------------------------------------------------------------------------
# Languages
# ---------------------------------------------------------------------------
[languages]
# Used when no preference is stored, and as the fallback for UI strings.
default = "en"

# ---------------------------------------------------------------------------
# Test environment setup / teardown
# ---------------------------------------------------------------------------
[harness]
# Created by `setup` when missing.
required_dirs = ["data"]

# Checked by `setup`; missing files are reported, never created.
required_files = ["data/menu.json", "index.html", "api/save-menu.php", "api/load-menu.php"]

# How long `setup` waits for the endpoint to accept connections.
ready_timeout_ms = 3000
ready_poll_ms = 100
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILENAME), content).unwrap();
    }

    #[test]
    fn default_paths() {
        let config = SiteConfig::default();
        assert_eq!(config.paths.menu, "data/menu.json");
        assert_eq!(config.paths.backup, None);
        assert_eq!(config.paths.mirror, "menu.html");
    }

    #[test]
    fn default_required_files() {
        let config = SiteConfig::default();
        assert_eq!(config.harness.required_files.len(), 4);
        assert!(
            config
                .harness
                .required_files
                .contains(&"data/menu.json".to_string())
        );
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_merges_partial_file() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
[server]
port = 9000

[languages]
default = "he"
"#,
        );
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.languages.default, Language::He);
        assert_eq!(config.paths.menu, "data/menu.json");
    }

    #[test]
    fn load_config_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[paths]\nmirror = \"\"\n").unwrap();
        let config = load_config(tmp.path(), Some(&path)).unwrap();
        assert_eq!(config.paths.mirror, "");
    }

    #[test]
    fn load_config_missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.toml");
        assert!(matches!(
            load_config(tmp.path(), Some(&path)),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn load_config_sets_backup() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[paths]\nbackup = \"backups/menu.json\"\n");
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config.paths.backup.as_deref(), Some("backups/menu.json"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[server\nport = 1");
        assert!(matches!(
            load_config(tmp.path(), None),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[server]\nprot = 1\n");
        assert!(load_config(tmp.path(), None).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[theme]\ncolor = \"red\"\n");
        assert!(load_config(tmp.path(), None).is_err());
    }

    #[test]
    fn unsupported_default_language_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[languages]\ndefault = \"fr\"\n");
        assert!(load_config(tmp.path(), None).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_backup_equal_to_menu() {
        let mut config = SiteConfig::default();
        config.paths.backup = Some(config.paths.menu.clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_bad_host() {
        let mut config = SiteConfig::default();
        config.server.host = "localhost".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_poll() {
        let mut config = SiteConfig::default();
        config.harness.ready_poll_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn server_addr() {
        let addr = ServerConfig::default().addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8787");
    }

    // =========================================================================
    // Merge / stock config
    // =========================================================================

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_replaces_arrays() {
        let base: toml::Value = toml::from_str("list = [1, 2]\n").unwrap();
        let overlay: toml::Value = toml::from_str("list = [3]\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["list"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for section in ["paths", "server", "languages", "harness"] {
            assert!(value.get(section).is_some(), "missing section {section}");
        }
    }
}
