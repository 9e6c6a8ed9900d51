//! Indicator and lag settings for the feature builder.

use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Window of the rolling mean and deviation of daily returns.
pub const ROLLING_RETURN_WINDOW: usize = 5;

/// Feature builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    // Moving averages
    pub ma_windows: Vec<usize>,
    pub ema_windows: Vec<usize>,

    // RSI
    pub rsi_period: usize,

    // MACD
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    // Bollinger
    pub bollinger_window: usize,
    pub bollinger_std: f64,

    // Lags of return and close
    pub lag_days: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20],
            ema_windows: vec![12, 26],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_std: 2.0,
            lag_days: 3,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(w) = self.ma_windows.iter().find(|&&w| w == 0) {
            return Err(ConfigError::invalid("ma_windows", format!("window {} must be > 0", w)));
        }
        if self.ema_windows.contains(&0) {
            return Err(ConfigError::invalid("ema_windows", "windows must be > 0"));
        }
        if self.rsi_period == 0 {
            return Err(ConfigError::invalid("rsi_period", "must be > 0"));
        }
        if self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0 {
            return Err(ConfigError::invalid("macd", "periods must be > 0"));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::invalid(
                "macd",
                format!(
                    "fast period {} must be below slow period {}",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }
        if self.bollinger_window < 2 {
            return Err(ConfigError::invalid(
                "bollinger_window",
                "must be >= 2 for a sample standard deviation",
            ));
        }
        if !self.bollinger_std.is_finite() || self.bollinger_std < 0.0 {
            return Err(ConfigError::invalid(
                "bollinger_std",
                format!("{} is not a valid band width", self.bollinger_std),
            ));
        }
        Ok(())
    }

    /// Longest look-back any configured column needs before it is defined.
    pub fn max_lookback(&self) -> usize {
        let ma = self.ma_windows.iter().copied().max().unwrap_or(0);
        ma.max(self.rsi_period)
            .max(self.bollinger_window)
            .max(self.lag_days + 1)
            .max(ROLLING_RETURN_WINDOW)
    }
}
