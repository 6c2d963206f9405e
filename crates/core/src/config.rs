//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ledger::DEFAULT_LEDGER_FILE, store::DEFAULT_STORE_FILE};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "fleet";
/// Prefix of environment overrides, e.g. `FLEET_DATA_DIR`.
pub const ENV_PREFIX: &str = "FLEET";

const DEFAULT_CONFIG: &str = r#"# Fleet rental configuration.

# Directory holding the roster and rental ledger files.
data_dir = "."
store_file = "cars.csv"
ledger_file = "rentals.csv"

# Where log files are written, relative to the working directory.
log_dir = "logs"

# Release vehicles marked rented that have no rental record on startup
# instead of refusing to start.
release_orphaned_rentals = false
"#;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the backing files.
    pub data_dir: PathBuf,
    /// Roster file name, relative to `data_dir`.
    pub store_file: String,
    /// Ledger file name, relative to `data_dir`.
    pub ledger_file: String,
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Repair roster/ledger disagreements at startup instead of failing.
    pub release_orphaned_rentals: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            store_file: DEFAULT_STORE_FILE.to_string(),
            ledger_file: DEFAULT_LEDGER_FILE.to_string(),
            log_dir: PathBuf::from("logs"),
            release_orphaned_rentals: false,
        }
    }
}

impl AppConfig {
    /// Load from the default config file (if present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load from `path` (if present) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn build(path: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Point the backing files at another directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Full path of the roster file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    /// Full path of the rental ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }
}

/// `<config dir>/fleet/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("config.toml")
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    ensure_config_at(&path)?;
    Ok(path)
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env() -> Environment {
        Environment::with_prefix("FLEET_TEST").source(Some(HashMap::new()))
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::build(&dir.path().join("config.toml"), no_env())?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store_path(), PathBuf::from("./cars.csv"));
        Ok(())
    }

    #[test]
    fn default_file_round_trips_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        ensure_config_at(&path)?;
        assert!(path.exists());
        assert_eq!(AppConfig::build(&path, no_env())?, AppConfig::default());
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "data_dir = \"/srv/fleet\"\nstore_file = \"roster.csv\"\n")?;

        let env = Environment::with_prefix("FLEET_TEST")
            .try_parsing(true)
            .source(Some(HashMap::from([
                ("FLEET_TEST_STORE_FILE".to_string(), "vehicles.csv".to_string()),
                (
                    "FLEET_TEST_RELEASE_ORPHANED_RENTALS".to_string(),
                    "true".to_string(),
                ),
            ])));
        let config = AppConfig::build(&path, env)?;
        assert_eq!(config.data_dir, PathBuf::from("/srv/fleet"));
        assert_eq!(config.store_file, "vehicles.csv");
        assert!(config.release_orphaned_rentals);
        assert_eq!(config.ledger_path(), PathBuf::from("/srv/fleet/rentals.csv"));
        Ok(())
    }
}
