use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when the price series itself is malformed.
///
/// These are checked before any indicator runs; a bad series would corrupt
/// every derived column.
#[derive(Debug, Error, PartialEq)]
pub enum DataShapeError {
    #[error("Price series is empty")]
    EmptySeries,

    #[error("Required column missing: {column}")]
    MissingColumn { column: String },

    #[error("Dates are not increasing at row {row}: {previous} followed by {current}")]
    NonMonotonicDates {
        row: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Duplicate date {date} at row {row}")]
    DuplicateDate { row: usize, date: NaiveDate },

    #[error("Non-finite {field} on {date}")]
    NonFiniteValue { field: &'static str, date: NaiveDate },
}

/// Not enough usable rows for the requested windows.
///
/// Kept apart from an empty result so callers can widen the data range or
/// shrink the windows instead of reading it as "no signal".
#[derive(Debug, Error, PartialEq)]
pub enum InsufficientDataError {
    #[error("All {rows} rows were dropped by finalization; reduce windows, lags or horizon")]
    AllRowsDropped { rows: usize },

    #[error(
        "No valid walk-forward fold: {rows} rows, need {required} (train {train_window} + test {test_window}, min train {min_train_size})"
    )]
    NoValidFolds {
        rows: usize,
        required: usize,
        train_window: usize,
        test_window: usize,
        min_train_size: usize,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Column {column} already exists")]
    DuplicateColumn { column: String },

    #[error("Column {column} has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to fit {model}: {reason}")]
    FitFailed { model: String, reason: String },

    #[error("Prediction failed for {model}: {reason}")]
    PredictFailed { model: String, reason: String },

    #[error("Feature matrix has {actual} columns, model expects {expected}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Cannot fit on an empty training slice")]
    EmptyTrainingSet,
}

/// Errors while persisting or loading a trained artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Feature {column} missing from the scored row")]
    MissingFeature { column: String },

    #[error("Feature {column} is undefined in the scored row (dated {date})")]
    UndefinedFeature { column: String, date: NaiveDate },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Top level error of the feature, label and training pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Data shape error: {0}")]
    DataShape(#[from] DataShapeError),

    #[error("Insufficient data: {0}")]
    InsufficientData(#[from] InsufficientDataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Prediction error: {0}")]
    Predict(#[from] PredictError),
}
