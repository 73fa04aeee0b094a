//! Application configuration.
//!
//! Values are layered: built-in defaults, then `<config_dir>/rental/config.toml`,
//! then `RENTAL_*` environment variables (for example `RENTAL_DATA_DIR`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::store::{CUSTOMERS_FILE, KINDS_FILE, RECORDS_FILE, VEHICLES_FILE};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "rental";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "RENTAL";

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the three data files.
    pub data_dir: PathBuf,
    /// Directory receiving `rental.log`.
    pub log_dir: PathBuf,
    /// File name of the vehicle fleet inside `data_dir`.
    pub vehicles_file: String,
    /// File name of the customer roster inside `data_dir`.
    pub customers_file: String,
    /// File name of the transaction log inside `data_dir`.
    pub records_file: String,
    /// File name of the vehicle subtype attributes inside `data_dir`.
    pub kinds_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            vehicles_file: VEHICLES_FILE.to_string(),
            customers_file: CUSTOMERS_FILE.to_string(),
            records_file: RECORDS_FILE.to_string(),
            kinds_file: KINDS_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (which may be absent) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_sources(path.as_ref(), Some(Environment::with_prefix(ENV_PREFIX)))
    }

    fn from_sources(path: &Path, env: Option<Environment>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from(path).required(false));
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        let settings = builder
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))
    }

    /// Full path of the vehicles file.
    pub fn vehicles_path(&self) -> PathBuf {
        self.data_dir.join(&self.vehicles_file)
    }

    /// Full path of the customers file.
    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(&self.customers_file)
    }

    /// Full path of the rental records file.
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }

    /// Full path of the vehicle subtype file.
    pub fn kinds_path(&self) -> PathBuf {
        self.data_dir.join(&self.kinds_file)
    }

    /// Serialize to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }
        let body = toml::to_string(self).context("failed to serialize configuration")?;
        let contents = format!(
            "# Vehicle rental settings. Environment variables prefixed {ENV_PREFIX}_ override these.\n{body}"
        );
        fs::write(path, contents).with_context(|| format!("failed to write config {}", path.display()))
    }
}

/// Default location of the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write a default config file on first run. Returns its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_config_at(&path)?;
    Ok(path)
}

/// Write the default settings to `path` unless a file already exists there.
pub fn ensure_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    AppConfig::default().write_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_file(path: &Path) -> Result<AppConfig> {
        AppConfig::from_sources(path, None)
    }

    fn sample(root: &Path) -> AppConfig {
        AppConfig {
            data_dir: root.join("data"),
            log_dir: root.join("logs"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = load_file(&dir.path().join("absent.toml"))?;
        assert_eq!(config.vehicles_file, "vehicles.txt");
        assert_eq!(config.customers_file, "customers.txt");
        assert_eq!(config.records_file, "rental_records.txt");
        assert_eq!(config.kinds_file, "vehicle_kinds.txt");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = '/srv/fleet'\nvehicles_file = 'fleet.txt'\n",
        )?;

        let config = load_file(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("/srv/fleet"));
        assert_eq!(config.vehicles_path(), PathBuf::from("/srv/fleet/fleet.txt"));
        assert_eq!(config.records_file, "rental_records.txt");
        Ok(())
    }

    #[test]
    fn written_file_is_kept_and_reloads() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rental/config.toml");
        ensure_config_at(&path)?;
        assert!(path.exists());

        let written = fs::read_to_string(&path)?;
        ensure_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, written);

        let config = sample(dir.path());
        config.write_to(&path)?;
        assert_eq!(load_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn quotes_in_paths_survive_a_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        let config = sample(&dir.path().join("o'brien \"fleet\""));

        config.write_to(&path)?;
        let loaded = load_file(&path)?;
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded, config);
        Ok(())
    }
}
