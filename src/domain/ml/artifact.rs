use crate::domain::ml::metrics::CandidateMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Persisted description of a training run.
///
/// This is the record reporting code reads back: the selected model, where
/// its weights live, and the walk-forward metrics of every candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub best_model: String,
    pub model_path: PathBuf,
    pub metrics: BTreeMap<String, CandidateMetrics>,
    pub feature_columns: Vec<String>,
    pub horizon: usize,
    pub rows: usize,
    pub folds_evaluated: usize,
    pub trained_at: DateTime<Utc>,
}

/// Directional probabilities for the latest row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub horizon: usize,
    pub probability_up: f64,
    pub probability_down: f64,
}

pub fn format_prediction(horizon: usize, probability_up: f64) -> Prediction {
    Prediction {
        horizon,
        probability_up,
        probability_down: 1.0 - probability_up,
    }
}
