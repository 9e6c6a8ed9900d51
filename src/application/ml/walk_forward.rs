use crate::application::ml::models::ModelCandidate;
use crate::config::WalkForwardConfig;
use crate::domain::errors::{ConfigError, InsufficientDataError, ModelError, PipelineError};
use crate::domain::ml::metrics::{accuracy, roc_auc};
use crate::domain::ml::{Dataset, EvaluationSummary, Fold, FoldMetrics};
use rayon::prelude::*;
use tracing::{debug, info};

/// Forward-rolling (train, test) windows over `len` rows.
///
/// Windows advance by `test_window`, so test slices never overlap and every
/// train index precedes every test index of its fold.
pub fn walk_forward_folds(len: usize, train_window: usize, test_window: usize) -> Vec<Fold> {
    let mut folds = Vec::new();
    if train_window == 0 || test_window == 0 {
        return folds;
    }

    let mut start = 0;
    while start + train_window + test_window <= len {
        let split = start + train_window;
        folds.push(Fold {
            index: folds.len(),
            train: start..split,
            test: split..split + test_window,
        });
        start += test_window;
    }
    folds
}

/// Fits every candidate on each fold's train slice and scores it on the
/// following test slice.
///
/// Folds run in time order. Candidates of one fold are fitted in parallel
/// and collected back in candidate order, so the summary is the same as a
/// sequential run.
pub fn evaluate(
    dataset: &Dataset,
    feature_columns: &[String],
    config: &WalkForwardConfig,
    candidates: &[ModelCandidate],
) -> Result<EvaluationSummary, PipelineError> {
    config.validate()?;
    if candidates.is_empty() {
        return Err(ConfigError::invalid("candidates", "at least one candidate is required").into());
    }
    if feature_columns.is_empty() {
        return Err(ConfigError::invalid("feature_columns", "at least one feature is required").into());
    }

    let no_valid_folds = || InsufficientDataError::NoValidFolds {
        rows: dataset.len(),
        required: config.train_window + config.test_window,
        train_window: config.train_window,
        test_window: config.test_window,
        min_train_size: config.min_train_size,
    };

    let folds: Vec<Fold> =
        walk_forward_folds(dataset.len(), config.train_window, config.test_window)
            .into_iter()
            .filter(|fold| fold.train_len() >= config.min_train_size)
            .collect();
    if folds.is_empty() {
        return Err(no_valid_folds().into());
    }

    info!(
        "Walk-forward over {} rows: {} folds, {} candidates",
        dataset.len(),
        folds.len(),
        candidates.len()
    );

    let mut summary = EvaluationSummary::new(candidates.iter().map(|c| c.name.clone()));
    for fold in &folds {
        let x_train = dataset.feature_matrix(feature_columns, fold.train.clone())?;
        let y_train = dataset.targets(fold.train.clone());
        let x_test = dataset.feature_matrix(feature_columns, fold.test.clone())?;
        let y_test = dataset.targets(fold.test.clone());

        let results = candidates
            .par_iter()
            .map(|candidate| {
                let model = candidate.fit(&x_train, &y_train)?;
                let probabilities = model.predict_probability(&x_test)?;
                Ok(FoldMetrics {
                    fold: fold.index,
                    accuracy: accuracy(&y_test, &probabilities),
                    auc: roc_auc(&y_test, &probabilities),
                })
            })
            .collect::<Result<Vec<FoldMetrics>, ModelError>>()?;

        for (position, metrics) in results.into_iter().enumerate() {
            debug!(
                "Fold {} {}: accuracy {:.4}, auc {:?}",
                fold.index, candidates[position].name, metrics.accuracy, metrics.auc
            );
            summary.record(position, metrics);
        }
    }

    Ok(summary)
}
