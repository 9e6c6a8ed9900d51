use crate::application::ml::models::{FittedModel, ModelCandidate};
use crate::application::ml::walk_forward::evaluate;
use crate::config::ModelConfig;
use crate::domain::errors::{ArtifactError, ConfigError, PipelineError};
use crate::domain::ml::{ArtifactMetadata, Dataset, EvaluationSummary};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

/// A selected, fully refitted model with the record describing it.
#[derive(Debug)]
pub struct TrainedArtifact {
    pub metadata: ArtifactMetadata,
    pub model: FittedModel,
}

/// Storage for the single artifact of one horizon.
pub trait ArtifactStore: Send + Sync {
    /// Where the weights of model `name` are written.
    fn model_path(&self, name: &str) -> PathBuf;

    fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError>;

    fn load(&self) -> Result<TrainedArtifact, ArtifactError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub horizon: usize,
    pub model: ModelConfig,
}

/// Name of the candidate with the highest mean accuracy.
///
/// Ties keep the earlier candidate. Candidates without any evaluated fold
/// are never selected.
pub fn select_best(summary: &EvaluationSummary) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in summary.candidates() {
        let Some(score) = candidate.mean_accuracy() else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate.name.as_str(), score));
        }
    }
    best.map(|(name, _)| name)
}

/// Evaluates the configured candidates walk-forward, refits the winner on
/// the whole dataset and persists it through `store`.
///
/// The final refit is not scored; the stored metrics are the out-of-sample
/// walk-forward ones.
pub fn train(
    dataset: &Dataset,
    feature_columns: &[String],
    config: &TrainConfig,
    store: &dyn ArtifactStore,
) -> Result<ArtifactMetadata, PipelineError> {
    config.model.validate()?;
    if config.horizon == 0 {
        return Err(ConfigError::invalid("horizon", "must be >= 1").into());
    }

    let candidates = ModelCandidate::from_config(&config.model);
    let summary = evaluate(dataset, feature_columns, &config.model.walk_forward(), &candidates)?;

    let best = select_best(&summary)
        .ok_or_else(|| ConfigError::invalid("candidates", "no candidate produced metrics"))?;
    let candidate = candidates
        .iter()
        .find(|c| c.name == best)
        .ok_or_else(|| ConfigError::invalid("best_model", format!("unknown candidate {}", best)))?;

    for evaluation in summary.candidates() {
        info!(
            "Horizon {} {}: mean accuracy {:?}, mean auc {:?}",
            config.horizon,
            evaluation.name,
            evaluation.mean_accuracy(),
            evaluation.mean_auc()
        );
    }
    info!("Horizon {}: selected {}", config.horizon, best);

    let all_rows = 0..dataset.len();
    let x = dataset.feature_matrix(feature_columns, all_rows.clone())?;
    let y = dataset.targets(all_rows);
    let model = candidate.fit(&x, &y)?;

    let metadata = ArtifactMetadata {
        best_model: candidate.name.clone(),
        model_path: store.model_path(&candidate.name),
        metrics: summary.to_metrics_map(),
        feature_columns: feature_columns.to_vec(),
        horizon: config.horizon,
        rows: dataset.len(),
        folds_evaluated: summary.folds_evaluated(),
        trained_at: Utc::now(),
    };

    let artifact = TrainedArtifact { metadata, model };
    store.save(&artifact)?;
    info!(
        "Saved {} artifact to {:?}",
        artifact.metadata.best_model, artifact.metadata.model_path
    );

    Ok(artifact.metadata)
}
