//! Column-oriented per-day feature table.
//!
//! Every column has exactly one slot per date. `None` marks a value that is
//! undefined at that row (incomplete window, missing lag, unknown future),
//! never a silent zero.

use crate::domain::errors::ConfigError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
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

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Appends a column. Names are unique and lengths must match the dates.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(ConfigError::DuplicateColumn { column: name });
        }
        if values.len() != self.dates.len() {
            return Err(ConfigError::LengthMismatch {
                column: name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        self.columns.push(FeatureColumn { name, values });
        Ok(())
    }

    /// True when no column is undefined at `index`.
    pub fn is_row_defined(&self, index: usize) -> bool {
        self.columns
            .iter()
            .all(|c| matches!(c.values.get(index), Some(Some(_))))
    }

    pub fn row(&self, index: usize) -> Option<FeatureRow> {
        let date = *self.dates.get(index)?;
        let values = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.values[index]))
            .collect();
        Some(FeatureRow { date, values })
    }

    /// Most recent row; the one scored at prediction time.
    pub fn last_row(&self) -> Option<FeatureRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }
}

/// A single day's named values, in table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    values: Vec<(String, Option<f64>)>,
}

impl FeatureRow {
    pub fn new(date: NaiveDate, values: Vec<(String, Option<f64>)>) -> Self {
        Self { date, values }
    }

    /// `None` when the column is absent, `Some(None)` when it is undefined.
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}
