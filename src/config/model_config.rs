//! Walk-forward windows and classifier hyperparameters.
//!
//! The two candidates' settings live here rather than as constructor
//! literals so tests and settings files can vary them.

use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Walk-forward window sizes, in dataset rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    pub train_window: usize,
    pub test_window: usize,
    pub min_train_size: usize,
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.train_window == 0 {
            return Err(ConfigError::invalid("train_window", "must be > 0"));
        }
        if self.test_window == 0 {
            return Err(ConfigError::invalid("test_window", "must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// L2 penalty strength.
    pub alpha: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per tree; `None` uses the square root of the feature count.
    pub max_features: Option<usize>,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Model training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub random_state: u64,
    pub train_window: usize,
    pub test_window: usize,
    pub min_train_size: usize,
    pub logistic: LogisticConfig,
    pub random_forest: RandomForestConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            random_state: 42,
            train_window: 250,
            test_window: 20,
            min_train_size: 200,
            logistic: LogisticConfig::default(),
            random_forest: RandomForestConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn walk_forward(&self) -> WalkForwardConfig {
        WalkForwardConfig {
            train_window: self.train_window,
            test_window: self.test_window,
            min_train_size: self.min_train_size,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.walk_forward().validate()?;
        if !self.logistic.alpha.is_finite() || self.logistic.alpha < 0.0 {
            return Err(ConfigError::invalid(
                "logistic.alpha",
                format!("{} must be a finite non-negative number", self.logistic.alpha),
            ));
        }
        if self.random_forest.n_trees == 0 {
            return Err(ConfigError::invalid("random_forest.n_trees", "must be > 0"));
        }
        if self.random_forest.max_features == Some(0) {
            return Err(ConfigError::invalid("random_forest.max_features", "must be > 0"));
        }
        Ok(())
    }
}
