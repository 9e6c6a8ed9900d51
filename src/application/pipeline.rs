//! Per-horizon orchestration: label, finalize, train, then score the latest row.

use crate::application::features::{add_targets, finalize};
use crate::application::ml::predictor::Predictor;
use crate::application::ml::trainer::{ArtifactStore, TrainConfig, train};
use crate::config::ModelConfig;
use crate::domain::errors::{DataShapeError, PipelineError};
use crate::domain::features::FeatureTable;
use crate::domain::ml::{ArtifactMetadata, Dataset, Prediction};
use tracing::info;

/// Everything produced for one forecast horizon.
#[derive(Debug)]
pub struct HorizonRun {
    pub horizon: usize,
    pub dataset: Dataset,
    pub metadata: ArtifactMetadata,
    pub prediction: Prediction,
}

/// Labels `table` for `horizon`, trains into `store` and predicts the most
/// recent feature row with the stored artifact.
pub fn run_horizon(
    table: &FeatureTable,
    horizon: usize,
    model: &ModelConfig,
    store: &dyn ArtifactStore,
) -> Result<HorizonRun, PipelineError> {
    let labeled = add_targets(table, horizon)?;
    let dataset = finalize(&labeled)?;
    let feature_columns = dataset.feature_columns();
    info!(
        "Horizon {}: {} rows, {} features",
        horizon,
        dataset.len(),
        feature_columns.len()
    );

    let config = TrainConfig {
        horizon,
        model: model.clone(),
    };
    let metadata = train(&dataset, &feature_columns, &config, store)?;
    let prediction = predict_latest(table, store)?;

    Ok(HorizonRun {
        horizon,
        dataset,
        metadata,
        prediction,
    })
}

/// Scores the last row of `table` with the artifact held by `store`.
pub fn predict_latest(
    table: &FeatureTable,
    store: &dyn ArtifactStore,
) -> Result<Prediction, PipelineError> {
    let predictor = Predictor::load(store)?;
    let row = table.last_row().ok_or(DataShapeError::EmptySeries)?;
    let prediction = predictor.predict(&row)?;
    info!(
        "Horizon {} prediction for {}: up {:.3}, down {:.3}",
        prediction.horizon, row.date, prediction.probability_up, prediction.probability_down
    );
    Ok(prediction)
}
