//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides for the listen address and data roots.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cache::CacheConfig;
use crate::indicators::IvpBands;
use crate::warning::WarningThresholds;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub warning: WarningThresholds,
    #[serde(default)]
    pub ivp: IvpBands,
    /// Products in tab order
    #[serde(default = "default_products")]
    pub products: Vec<Product>,
}

/// A product key as used in URLs and the product group it names in the SIV
/// frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: String,
    pub group: String,
}

impl Product {
    pub fn new(key: impl Into<String>, group: impl Into<String>) -> Self {
        Product {
            key: key.into(),
            group: group.into(),
        }
    }
}

fn default_products() -> Vec<Product> {
    [
        ("au", "AU"),
        ("cu", "CU"),
        ("io", "IO"),
        ("m", "M"),
        ("sr", "SR"),
    ]
    .into_iter()
    .map(|(key, group)| Product::new(key, group))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            cache: CacheConfig::default(),
            warning: WarningThresholds::default(),
            ivp: IvpBands::default(),
            products: default_products(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            Self::from_file(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            let mut config = Config::default();
            config.apply_env()?;
            Ok(config)
        }
    }

    /// Override listen address and data roots from the environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `DASHBOARD_HOST`, `DASHBOARD_PORT`, `OPTIONS_DATA_PATH` and
    /// `CBOE_DATA_PATH` as resolved by `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("DASHBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DASHBOARD_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("DASHBOARD_PORT must be a valid port, got '{}'", port))?;
        }
        if let Some(dir) = lookup("OPTIONS_DATA_PATH") {
            self.data.options_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CBOE_DATA_PATH") {
            self.data.cboe_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Product group name for a URL product key
    pub fn product_group(&self, product: &str) -> Option<&str> {
        self.products
            .iter()
            .find(|p| p.key == product)
            .map(|p| p.group.as_str())
    }

    /// Product keys in configured order
    pub fn product_keys(&self) -> Vec<String> {
        self.products.iter().map(|p| p.key.clone()).collect()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/templates`
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: PathBuf::from("templates"),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Data roots written by the analysis jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub options_dir: PathBuf,
    pub cboe_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            options_dir: PathBuf::from("data/options"),
            cboe_dir: PathBuf::from("data/cboe"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Held by every test that reads or writes the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 4] = [
        "DASHBOARD_HOST",
        "DASHBOARD_PORT",
        "OPTIONS_DATA_PATH",
        "CBOE_DATA_PATH",
    ];

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn write_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("dashboard.json");
        fs::write(
            &path,
            r#"{
                "server": { "host": "127.0.0.1", "port": 8000, "static_dir": "static" },
                "warning": { "enter_below": -0.01, "exit_at_or_above": 0.03 },
                "products": [
                    { "key": "sr", "group": "SR" },
                    { "key": "rb", "group": "RB" },
                    { "key": "au", "group": "AU" }
                ]
            }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_from_file_partial_config_uses_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config = Config::from_file(write_fixture(dir.path())).unwrap();

        assert_eq!(config.server.addr(), "127.0.0.1:8000");
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.warning.enter_below, -0.01);
        assert_eq!(config.ivp.high, 91.0);
        assert_eq!(config.cache.max_entries, 128);
        assert_eq!(config.data.cboe_dir, PathBuf::from("data/cboe"));
        assert_eq!(config.product_group("rb"), Some("RB"));
        assert_eq!(config.product_group("cu"), None);
    }

    #[test]
    fn test_product_keys_keep_configured_order() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config = Config::from_file(write_fixture(dir.path())).unwrap();

        assert_eq!(config.product_keys(), vec!["sr", "rb", "au"]);
    }

    #[test]
    fn test_missing_products_fall_back() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.product_group("cu"), Some("CU"));
        assert_eq!(config.product_keys(), vec!["au", "cu", "io", "m", "sr"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.json")).unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:5000");
        assert_eq!(config.data.options_dir, PathBuf::from("data/options"));
        assert_eq!(config.products, default_products());
    }

    #[test]
    fn test_load_existing_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config = Config::load(write_fixture(dir.path())).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_overrides_each_variable() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("DASHBOARD_HOST", "127.0.0.1"),
                ("DASHBOARD_PORT", "8080"),
                ("OPTIONS_DATA_PATH", "/srv/options"),
                ("CBOE_DATA_PATH", "/srv/cboe"),
            ]))
            .unwrap();

        assert_eq!(config.server.addr(), "127.0.0.1:8080");
        assert_eq!(config.data.options_dir, PathBuf::from("/srv/options"));
        assert_eq!(config.data.cboe_dir, PathBuf::from("/srv/cboe"));
    }

    #[test]
    fn test_unset_overrides_keep_values() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("CBOE_DATA_PATH", "/srv/cboe")]))
            .unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:5000");
        assert_eq!(config.data.options_dir, PathBuf::from("data/options"));
        assert_eq!(config.data.cboe_dir, PathBuf::from("/srv/cboe"));
    }

    #[test]
    fn test_invalid_port_override_is_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("DASHBOARD_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_PORT"));

        let mut config = Config::default();
        assert!(config
            .apply_overrides(lookup(&[("DASHBOARD_PORT", "70000")]))
            .is_err());
    }

    #[test]
    fn test_load_reads_process_environment() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();

        std::env::set_var("DASHBOARD_HOST", "10.0.0.2");
        std::env::set_var("DASHBOARD_PORT", "9000");
        std::env::set_var("OPTIONS_DATA_PATH", "/mnt/options");
        std::env::set_var("CBOE_DATA_PATH", "/mnt/cboe");
        let loaded = Config::load(write_fixture(dir.path()));
        let defaulted = Config::load(dir.path().join("missing.json"));

        std::env::set_var("DASHBOARD_PORT", "not-a-port");
        let bad_port = Config::load(dir.path().join("missing.json"));

        for name in ENV_VARS {
            std::env::remove_var(name);
        }

        let loaded = loaded.unwrap();
        assert_eq!(loaded.server.addr(), "10.0.0.2:9000");
        assert_eq!(loaded.data.options_dir, PathBuf::from("/mnt/options"));
        assert_eq!(loaded.data.cboe_dir, PathBuf::from("/mnt/cboe"));
        // untouched fields still come from the file
        assert_eq!(loaded.warning.enter_below, -0.01);

        assert_eq!(defaulted.unwrap().server.port, 9000);
        assert!(bad_port.is_err());
    }
}
