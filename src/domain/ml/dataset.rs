use crate::domain::errors::DataShapeError;
use chrono::NaiveDate;
use std::ops::Range;

pub const FUTURE_CLOSE_COLUMN: &str = "future_close";
pub const TARGET_COLUMN: &str = "target";

/// Fully defined, time-ordered labeled rows.
///
/// Produced by finalization; the walk-forward evaluator and trainer only ever
/// see this type, so every value is a plain `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl Dataset {
    /// Builds a dataset from dense columns. Both label columns are required
    /// and every column must have one value per date.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, DataShapeError> {
        for required in [FUTURE_CLOSE_COLUMN, TARGET_COLUMN] {
            if !columns.iter().any(|(name, _)| name == required) {
                return Err(DataShapeError::MissingColumn {
                    column: required.to_string(),
                });
            }
        }
        if let Some((name, _)) = columns.iter().find(|(_, v)| v.len() != dates.len()) {
            return Err(DataShapeError::MissingColumn {
                column: format!("{} (expected {} values)", name, dates.len()),
            });
        }
        Ok(Self { dates, columns })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Every column except the two label columns, in table order.
    pub fn feature_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(name, _)| name)
            .filter(|name| name.as_str() != FUTURE_CLOSE_COLUMN && name.as_str() != TARGET_COLUMN)
            .cloned()
            .collect()
    }

    /// Row-major feature matrix for `rows`, columns in the requested order.
    pub fn feature_matrix(
        &self,
        feature_columns: &[String],
        rows: Range<usize>,
    ) -> Result<Vec<Vec<f64>>, DataShapeError> {
        let selected = feature_columns
            .iter()
            .map(|name| {
                self.column(name)
                    .ok_or_else(|| DataShapeError::MissingColumn {
                        column: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .map(|row| selected.iter().map(|column| column[row]).collect())
            .collect())
    }

    /// Binary labels for `rows`.
    pub fn targets(&self, rows: Range<usize>) -> Vec<i32> {
        self.column(TARGET_COLUMN)
            .map(|values| values[rows].iter().map(|&v| i32::from(v > 0.5)).collect())
            .unwrap_or_default()
    }
}
