use crate::application::indicators::{
    bollinger_bands, exponential_moving_average, macd, pct_change, relative_strength_index,
    rolling_mean, rolling_std, shift, simple_moving_average,
};
use crate::config::{FeatureConfig, ROLLING_RETURN_WINDOW};
use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureTable;
use crate::domain::market::price_bar::{PriceBar, validate_bars};
use tracing::{debug, warn};

/// Composes indicators, same-day shapes and lag features into a feature table.
pub struct FeatureBuilder<'a> {
    config: &'a FeatureConfig,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(config: &'a FeatureConfig) -> Self {
        Self { config }
    }

    /// Builds the table for `bars`. The series is validated first; nothing is
    /// computed on a malformed series.
    pub fn build(&self, bars: &[PriceBar]) -> Result<FeatureTable, PipelineError> {
        validate_bars(bars)?;
        self.config.validate()?;
        if bars.len() <= self.config.max_lookback() {
            warn!(
                "{} bars do not cover the longest look-back of {}; some columns stay fully undefined",
                bars.len(),
                self.config.max_lookback()
            );
        }

        let dates = bars.iter().map(|b| b.date).collect();
        let mut table = FeatureTable::new(dates);

        let open: Vec<f64> = bars.iter().map(|b| b.open).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        table.push_column("open", defined(&open))?;
        table.push_column("high", defined(&high))?;
        table.push_column("low", defined(&low))?;
        table.push_column("close", defined(&close))?;
        if bars.iter().any(|b| b.volume.is_some()) {
            table.push_column("volume", bars.iter().map(|b| b.volume).collect())?;
        }

        let returns = pct_change(&close);
        table.push_column("return", returns.clone())?;
        table.push_column(
            "range",
            high.iter().zip(&low).map(|(h, l)| Some(h - l)).collect(),
        )?;
        table.push_column(
            "body",
            close.iter().zip(&open).map(|(c, o)| Some(c - o)).collect(),
        )?;

        for window in unique(&self.config.ma_windows) {
            table.push_column(format!("ma_{}", window), simple_moving_average(&close, window)?)?;
        }
        for window in unique(&self.config.ema_windows) {
            table.push_column(
                format!("ema_{}", window),
                exponential_moving_average(&close, window)?,
            )?;
        }

        table.push_column("rsi", relative_strength_index(&close, self.config.rsi_period)?)?;

        let macd_series = macd(
            &close,
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        )?;
        table.push_column("macd", macd_series.macd)?;
        table.push_column("macd_signal", macd_series.signal)?;
        table.push_column("macd_hist", macd_series.histogram)?;

        let bands = bollinger_bands(
            &close,
            self.config.bollinger_window,
            self.config.bollinger_std,
        )?;
        table.push_column("bollinger_upper", bands.upper)?;
        table.push_column("bollinger_lower", bands.lower)?;

        let close_defined = defined(&close);
        for lag in 1..=self.config.lag_days {
            table.push_column(format!("return_lag_{}", lag), shift(&returns, lag))?;
            table.push_column(format!("close_lag_{}", lag), shift(&close_defined, lag))?;
        }

        table.push_column(
            format!("rolling_mean_{}", ROLLING_RETURN_WINDOW),
            rolling_mean(&returns, ROLLING_RETURN_WINDOW),
        )?;
        table.push_column(
            format!("rolling_vol_{}", ROLLING_RETURN_WINDOW),
            rolling_std(&returns, ROLLING_RETURN_WINDOW),
        )?;

        debug!(
            "Built {} feature columns over {} bars",
            table.columns().len(),
            table.len()
        );
        Ok(table)
    }
}

/// Builds the feature table for `bars` with `config`.
pub fn build_features(
    bars: &[PriceBar],
    config: &FeatureConfig,
) -> Result<FeatureTable, PipelineError> {
    FeatureBuilder::new(config).build(bars)
}

fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Windows in first-occurrence order with repeats removed.
fn unique(windows: &[usize]) -> Vec<usize> {
    let mut seen = Vec::with_capacity(windows.len());
    for &w in windows {
        if !seen.contains(&w) {
            seen.push(w);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DataShapeError;
    use chrono::{Duration, NaiveDate};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceBar::new(start + Duration::days(i as i64), c - 0.5, c + 1.0, c - 1.0, c)
            })
            .collect()
    }

    fn small_config() -> FeatureConfig {
        FeatureConfig {
            ma_windows: vec![3, 5, 3],
            ema_windows: vec![4],
            rsi_period: 3,
            macd_fast: 3,
            macd_slow: 6,
            macd_signal: 2,
            bollinger_window: 4,
            bollinger_std: 2.0,
            lag_days: 2,
        }
    }

    fn closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 3.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_column_layout() {
        let table = build_features(&bars(&closes(30)), &small_config()).unwrap();
        assert_eq!(
            table.column_names(),
            vec![
                "open",
                "high",
                "low",
                "close",
                "return",
                "range",
                "body",
                "ma_3",
                "ma_5",
                "ema_4",
                "rsi",
                "macd",
                "macd_signal",
                "macd_hist",
                "bollinger_upper",
                "bollinger_lower",
                "return_lag_1",
                "close_lag_1",
                "return_lag_2",
                "close_lag_2",
                "rolling_mean_5",
                "rolling_vol_5",
            ]
        );
    }

    #[test]
    fn test_volume_column_only_when_present() {
        let mut series = bars(&closes(10));
        series[3].volume = Some(1200.0);
        let table = build_features(&series, &small_config()).unwrap();
        let volume = table.column("volume").unwrap();
        assert_eq!(volume[3], Some(1200.0));
        assert_eq!(volume[2], None);
    }

    #[test]
    fn test_same_day_and_lag_columns() {
        let series = bars(&[10.0, 11.0, 12.1]);
        let table = build_features(&series, &small_config()).unwrap();

        assert_eq!(table.column("range").unwrap()[0], Some(2.0));
        assert_eq!(table.column("body").unwrap()[1], Some(0.5));
        assert_eq!(table.column("close_lag_2").unwrap()[2], Some(10.0));
        assert_eq!(table.column("return_lag_1").unwrap()[1], None);
        let lagged = table.column("return_lag_1").unwrap()[2].unwrap();
        assert!((lagged - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_return_features_start_after_window() {
        let table = build_features(&bars(&closes(12)), &small_config()).unwrap();
        let mean = table.column("rolling_mean_5").unwrap();
        let vol = table.column("rolling_vol_5").unwrap();
        assert!(mean[4].is_none());
        assert!(mean[5].is_some());
        assert!(vol[4].is_none());
        assert!(vol[5].is_some());
    }

    #[test]
    fn test_no_future_leakage() {
        let original = closes(40);
        let mut altered = original.clone();
        for value in altered.iter_mut().skip(25) {
            *value *= 1.5;
        }

        let config = small_config();
        let base = build_features(&bars(&original), &config).unwrap();
        let changed = build_features(&bars(&altered), &config).unwrap();

        for column in base.columns() {
            let other = changed.column(&column.name).unwrap();
            assert_eq!(
                &column.values[..25],
                &other[..25],
                "column {} leaked future rows",
                column.name
            );
        }
    }

    #[test]
    fn test_rejects_unsorted_series_before_computing() {
        let mut series = bars(&closes(5));
        series.swap(1, 2);
        let err = build_features(&series, &small_config()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DataShape(DataShapeError::NonMonotonicDates { .. })
        ));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let series = bars(&closes(15));
        let snapshot = series.clone();
        build_features(&series, &small_config()).unwrap();
        assert_eq!(series, snapshot);
    }
}
