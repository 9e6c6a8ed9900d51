use crate::domain::errors::DataShapeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Checks the invariants every downstream column relies on: non-empty,
/// strictly increasing dates, finite OHLC.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), DataShapeError> {
    if bars.is_empty() {
        return Err(DataShapeError::EmptySeries);
    }

    for (row, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() {
                return Err(DataShapeError::NonFiniteValue {
                    field,
                    date: bar.date,
                });
            }
        }

        if row == 0 {
            continue;
        }
        let previous = bars[row - 1].date;
        if bar.date == previous {
            return Err(DataShapeError::DuplicateDate {
                row,
                date: bar.date,
            });
        }
        if bar.date < previous {
            return Err(DataShapeError::NonMonotonicDates {
                row,
                previous,
                current: bar.date,
            });
        }
    }

    Ok(())
}
