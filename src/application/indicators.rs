//! Technical indicators over a daily close series.
//!
//! Every function is pure and returns one slot per input row, with `None`
//! wherever the indicator's trailing window is not yet complete. Values at
//! row `i` only ever read rows `..=i`.
//!
//! Rolling deviations (Bollinger bands, return volatility) use the sample
//! convention (n - 1 denominator) everywhere.

use crate::domain::errors::ConfigError;
use statrs::statistics::Statistics;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};

/// Applies `f` to each complete trailing window of `window` defined values.
///
/// A row is `None` while the window is incomplete, when any value inside it
/// is undefined, or when `f` yields a non-finite result.
fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut buffer = Vec::with_capacity(window);

    for i in (window - 1)..values.len() {
        buffer.clear();
        buffer.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));
        if buffer.len() < window {
            continue;
        }
        let value = f(&buffer);
        if value.is_finite() {
            out[i] = Some(value);
        }
    }
    out
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().mean())
}

/// Rolling sample standard deviation.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().std_dev())
}

/// Simple moving average of the trailing `window` values, current row included.
///
/// # Returns
/// `None` for the first `window - 1` rows, the arithmetic mean afterwards.
pub fn simple_moving_average(
    values: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>, ConfigError> {
    if window == 0 {
        return Err(ConfigError::invalid("sma window", "must be > 0"));
    }
    let defined: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    Ok(rolling_mean(&defined, window))
}

/// Exponential moving average with alpha = 2 / (window + 1), seeded with
/// the first value. Defined from row 0.
pub fn exponential_moving_average(
    values: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>, ConfigError> {
    let mut ema = ExponentialMovingAverage::new(window)
        .map_err(|e| ConfigError::invalid("ema window", format!("{:?}", e)))?;
    Ok(values.iter().map(|&v| Some(ema.next(v))).collect())
}

/// Relative Strength Index with simple-mean averaging of gains and losses.
///
/// Deltas start at row 1, so the first `period` rows are undefined. A
/// window whose average loss is exactly zero has no relative strength and
/// stays undefined rather than saturating at 100.
pub fn relative_strength_index(
    closes: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>, ConfigError> {
    if period == 0 {
        return Err(ConfigError::invalid("rsi_period", "must be > 0"));
    }

    let mut out = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(out);
    }

    // deltas[d] is the change into row d + 1
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let n = period as f64;

    for (row, slot) in out.iter_mut().enumerate().skip(period) {
        let window = &deltas[row - period..row];
        let avg_gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / n;
        let avg_loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;
        if avg_loss == 0.0 {
            continue;
        }
        let rs = avg_gain / avg_loss;
        *slot = Some(100.0 - 100.0 / (1.0 + rs));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD line (EMA fast - EMA slow), its signal EMA and the histogram.
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdSeries, ConfigError> {
    let mut indicator = MovingAverageConvergenceDivergence::new(fast, slow, signal)
        .map_err(|e| ConfigError::invalid("macd", format!("{:?}", e)))?;

    let mut series = MacdSeries {
        macd: Vec::with_capacity(closes.len()),
        signal: Vec::with_capacity(closes.len()),
        histogram: Vec::with_capacity(closes.len()),
    };
    for &close in closes {
        let out = indicator.next(close);
        series.macd.push(Some(out.macd));
        series.signal.push(Some(out.signal));
        series.histogram.push(Some(out.histogram));
    }
    Ok(series)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Rolling mean plus/minus `k` rolling sample deviations over `window` closes.
///
/// # Arguments
/// * `closes` - Close series
/// * `window` - Trailing window, at least 2
/// * `k` - Band width in standard deviations
pub fn bollinger_bands(
    closes: &[f64],
    window: usize,
    k: f64,
) -> Result<BollingerSeries, ConfigError> {
    if window < 2 {
        return Err(ConfigError::invalid("bollinger_window", "must be >= 2"));
    }
    let defined: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    let middle = rolling_mean(&defined, window);
    let deviation = rolling_std(&defined, window);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&deviation)
            .map(|(m, sd)| Some(m.as_ref()? + sign * k * sd.as_ref()?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    Ok(BollingerSeries {
        middle,
        upper,
        lower,
    })
}

/// Simple percentage change against the previous row. Row 0, and rows whose
/// previous value is zero, are undefined.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        let previous = values[i - 1];
        if previous != 0.0 {
            out[i] = Some((values[i] - previous) / previous);
        }
    }
    out
}

/// Value from `lag` rows earlier.
pub fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(lag).and_then(|j| values[j]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let value = actual.expect("value should be defined");
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            value
        );
    }

    #[test]
    fn test_sma_warmup_and_exact_mean() {
        let closes: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        for window in [1usize, 3, 5] {
            let sma = simple_moving_average(&closes, window).unwrap();
            for (i, value) in sma.iter().enumerate() {
                if i + 1 < window {
                    assert!(value.is_none(), "row {} should be undefined", i);
                } else {
                    let expected =
                        closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                    assert_close(*value, expected);
                }
            }
        }
    }

    #[test]
    fn test_sma_zero_window_is_config_error() {
        assert!(simple_moving_average(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn test_ema_seeded_with_first_close() {
        let closes = vec![10.0, 11.0, 12.5, 11.0, 13.0];
        let window = 3;
        let alpha = 2.0 / (window as f64 + 1.0);
        let ema = exponential_moving_average(&closes, window).unwrap();

        assert_close(ema[0], 10.0);
        for i in 1..closes.len() {
            let expected = alpha * closes[i] + (1.0 - alpha) * ema[i - 1].unwrap();
            assert_close(ema[i], expected);
        }
    }

    #[test]
    fn test_rsi_hand_computed() {
        // deltas: [0, 1, -1]
        let closes = vec![44.0, 44.0, 45.0, 44.0];
        let rsi = relative_strength_index(&closes, 2).unwrap();

        assert!(rsi[0].is_none());
        assert!(rsi[1].is_none());
        // gains [0, 1], losses [0, 0]: zero average loss
        assert!(rsi[2].is_none());
        // gains [1, 0] -> 0.5, losses [0, 1] -> 0.5, RS = 1
        assert_close(rsi[3], 50.0);
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let closes = vec![10.0, 9.0, 8.0, 7.0];
        let rsi = relative_strength_index(&closes, 2).unwrap();
        assert_close(rsi[2], 0.0);
        assert_close(rsi[3], 0.0);
    }

    #[test]
    fn test_macd_matches_ema_difference() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = macd(&closes, 3, 6, 4).unwrap();
        let fast = exponential_moving_average(&closes, 3).unwrap();
        let slow = exponential_moving_average(&closes, 6).unwrap();
        let macd_line: Vec<f64> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| f.unwrap() - s.unwrap())
            .collect();
        let signal = exponential_moving_average(&macd_line, 4).unwrap();

        for i in 0..closes.len() {
            assert_close(series.macd[i], macd_line[i]);
            assert_close(series.signal[i], signal[i].unwrap());
            assert_close(
                series.histogram[i],
                macd_line[i] - signal[i].unwrap(),
            );
        }
    }

    #[test]
    fn test_bollinger_uses_sample_deviation() {
        let closes = vec![1.0, 2.0, 3.0, 4.0];
        let bands = bollinger_bands(&closes, 3, 2.0).unwrap();

        assert!(bands.upper[1].is_none());
        // window [1, 2, 3]: mean 2, sample sd 1
        assert_close(bands.middle[2], 2.0);
        assert_close(bands.upper[2], 4.0);
        assert_close(bands.lower[2], 0.0);
        assert_close(bands.upper[3], 5.0);
    }

    #[test]
    fn test_rolling_propagates_undefined() {
        let values = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let mean = rolling_mean(&values, 2);
        assert_eq!(mean[1], None);
        assert_close(mean[2], 1.5);
        assert_close(mean[3], 2.5);

        let std = rolling_std(&values, 3);
        assert_eq!(std[2], None);
        assert_close(std[3], 1.0);
    }

    #[test]
    fn test_pct_change_and_shift() {
        let values = vec![100.0, 110.0, 99.0];
        let returns = pct_change(&values);
        assert_eq!(returns[0], None);
        assert_close(returns[1], 0.1);
        assert_close(returns[2], -0.1);

        let lagged = shift(&returns, 1);
        assert_eq!(lagged[0], None);
        assert_eq!(lagged[1], None);
        assert_close(lagged[2], 0.1);
    }
}
