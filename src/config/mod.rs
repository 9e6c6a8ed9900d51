//! Configuration module for goldcast.
//!
//! Settings are read from a TOML file organized by concern: project,
//! data source, storage, features, model and output. Every section has
//! defaults, so a partial file (or no file at all) is valid.

mod feature_config;
mod model_config;

pub use feature_config::{FeatureConfig, ROLLING_RETURN_WINDOW};
pub use model_config::{LogisticConfig, ModelConfig, RandomForestConfig, WalkForwardConfig};

use crate::domain::errors::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "GOLDCAST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Number of most recent daily bars to keep.
    pub data_days: usize,
    /// Forecast horizons, in trading days.
    pub horizons: Vec<usize>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            data_days: 730,
            horizons: vec![1, 5],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub stooq_url: String,
    /// Local CSV used instead of downloading when set.
    pub csv_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            stooq_url: "https://stooq.com/q/d/l/?s=xauusd&i=d".to_string(),
            csv_path: None,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub raw_csv: PathBuf,
    pub processed_csv: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_csv: PathBuf::from("data/raw/prices.csv"),
            processed_csv: PathBuf::from("data/processed/dataset.csv"),
            model_dir: PathBuf::from("models"),
        }
    }
}

impl StorageConfig {
    /// Artifact directory for one horizon.
    pub fn horizon_dir(&self, horizon: usize) -> PathBuf {
        self.model_dir.join(format!("horizon_{}", horizon))
    }

    /// Processed dataset path for one horizon: `dataset.csv` becomes
    /// `dataset_h5.csv`.
    pub fn processed_csv_for(&self, horizon: usize) -> PathBuf {
        let stem = self
            .processed_csv
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        let file_name = match self.processed_csv.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_h{}.{}", stem, horizon, ext),
            None => format!("{}_h{}", stem, horizon),
        };
        self.processed_csv.with_file_name(file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project: ProjectConfig,
    pub data_source: DataSourceConfig,
    pub storage: StorageConfig,
    pub features: FeatureConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
}

impl Settings {
    /// Loads settings from `GOLDCAST_CONFIG`, or `config/settings.toml`.
    /// Falls back to defaults when the file does not exist.
    pub fn from_env() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);

        if !path.exists() {
            warn!("Settings file {:?} not found, using defaults", path);
            let settings = Self::default();
            settings.validate()?;
            return Ok(settings);
        }

        Self::from_file(path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid settings file: {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).context("Failed to parse settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.horizons.is_empty() {
            return Err(ConfigError::invalid("project.horizons", "at least one horizon is required"));
        }
        if self.project.horizons.contains(&0) {
            return Err(ConfigError::invalid("project.horizons", "horizons must be >= 1"));
        }
        if self.project.data_days == 0 {
            return Err(ConfigError::invalid("project.data_days", "must be > 0"));
        }
        self.features.validate()?;
        self.model.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [project]
            horizons = [3]

            [model]
            train_window = 120
            test_window = 10

            [model.random_forest]
            n_trees = 25
            "#,
        )
        .unwrap();

        assert_eq!(settings.project.horizons, vec![3]);
        assert_eq!(settings.project.data_days, 730);
        assert_eq!(settings.model.train_window, 120);
        assert_eq!(settings.model.min_train_size, 200);
        assert_eq!(settings.model.random_forest.n_trees, 25);
        assert_eq!(settings.model.random_forest.min_samples_split, 2);
        assert_eq!(settings.features, FeatureConfig::default());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let result = Settings::from_toml_str(
            r#"
            [project]
            horizons = [1, 0]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_horizon_dir_layout() {
        let storage = StorageConfig::default();
        assert_eq!(storage.horizon_dir(5), PathBuf::from("models/horizon_5"));
        assert_eq!(
            storage.processed_csv_for(5),
            PathBuf::from("data/processed/dataset_h5.csv")
        );
    }
}
