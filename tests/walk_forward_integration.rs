use chrono::{Duration, NaiveDate};
use goldcast::application::ml::{ModelCandidate, evaluate, select_best};
use goldcast::config::{ModelConfig, RandomForestConfig, WalkForwardConfig};
use goldcast::domain::errors::{InsufficientDataError, PipelineError};
use goldcast::domain::ml::{Dataset, FUTURE_CLOSE_COLUMN, TARGET_COLUMN};

/// Two informative features and one noise feature over `rows` days.
fn dataset(rows: usize) -> Dataset {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let dates = (0..rows).map(|i| start + Duration::days(i as i64)).collect();

    let signal: Vec<f64> = (0..rows).map(|i| (i as f64 * 0.37).sin()).collect();
    let momentum: Vec<f64> = (0..rows).map(|i| (i as f64 * 0.11).cos()).collect();
    let noise: Vec<f64> = (0..rows).map(|i| ((i * 7919) % 13) as f64 / 13.0).collect();
    let target: Vec<f64> = signal
        .iter()
        .zip(&noise)
        .map(|(s, n)| if s + 0.3 * (n - 0.5) > 0.0 { 1.0 } else { 0.0 })
        .collect();
    let future: Vec<f64> = target.iter().map(|t| 100.0 + t).collect();

    Dataset::new(
        dates,
        vec![
            ("signal".to_string(), signal),
            ("momentum".to_string(), momentum),
            ("noise".to_string(), noise),
            (FUTURE_CLOSE_COLUMN.to_string(), future),
            (TARGET_COLUMN.to_string(), target),
        ],
    )
    .unwrap()
}

fn candidates() -> Vec<ModelCandidate> {
    ModelCandidate::from_config(&ModelConfig {
        random_forest: RandomForestConfig {
            n_trees: 12,
            max_depth: Some(4),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn window(train_window: usize, test_window: usize, min_train_size: usize) -> WalkForwardConfig {
    WalkForwardConfig {
        train_window,
        test_window,
        min_train_size,
    }
}

#[test]
fn test_aggregate_accuracy_is_mean_of_folds() {
    let data = dataset(160);
    let columns = data.feature_columns();
    let summary = evaluate(&data, &columns, &window(60, 20, 40), &candidates()).unwrap();

    // (160 - 80) / 20 + 1 folds
    assert_eq!(summary.folds_evaluated(), 5);
    for candidate in summary.candidates() {
        assert_eq!(candidate.folds.len(), 5);
        let folds: Vec<usize> = candidate.folds.iter().map(|f| f.fold).collect();
        assert_eq!(folds, vec![0, 1, 2, 3, 4]);

        let mean = candidate.folds.iter().map(|f| f.accuracy).sum::<f64>() / 5.0;
        assert!((candidate.mean_accuracy().unwrap() - mean).abs() < 1e-12);
        for fold in &candidate.folds {
            assert!((0.0..=1.0).contains(&fold.accuracy));
        }
    }
}

#[test]
fn test_candidates_reported_in_listed_order() {
    let data = dataset(120);
    let columns = data.feature_columns();
    let summary = evaluate(&data, &columns, &window(60, 20, 40), &candidates()).unwrap();
    let names: Vec<&str> = summary.candidates().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["logistic", "random_forest"]);
    assert!(select_best(&summary).is_some());
}

#[test]
fn test_evaluation_is_deterministic() {
    let data = dataset(140);
    let columns = data.feature_columns();
    let config = window(60, 20, 40);
    let first = evaluate(&data, &columns, &config, &candidates()).unwrap();
    let second = evaluate(&data, &columns, &config, &candidates()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_informative_features_beat_chance() {
    let data = dataset(200);
    let columns = vec!["signal".to_string()];
    let summary = evaluate(&data, &columns, &window(80, 20, 60), &candidates()).unwrap();
    let logistic = summary.get("logistic").unwrap();
    assert!(logistic.mean_accuracy().unwrap() > 0.7);
}

#[test]
fn test_series_shorter_than_one_fold() {
    let data = dataset(70);
    let columns = data.feature_columns();
    let err = evaluate(&data, &columns, &window(60, 20, 40), &candidates()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientData(InsufficientDataError::NoValidFolds { rows: 70, .. })
    ));
}

#[test]
fn test_every_fold_below_min_train_size() {
    let data = dataset(120);
    let columns = data.feature_columns();
    let err = evaluate(&data, &columns, &window(60, 20, 61), &candidates()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InsufficientData(InsufficientDataError::NoValidFolds { .. })
    ));
}

#[test]
fn test_zero_test_window_is_config_error() {
    let data = dataset(120);
    let columns = data.feature_columns();
    let err = evaluate(&data, &columns, &window(60, 0, 0), &candidates()).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

/// Twelve days of one feature that tracks the target, mostly up days.
fn mostly_up(targets: [f64; 12]) -> Dataset {
    let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
    let dates = (0..12).map(|i| start + Duration::days(i)).collect();
    let x: Vec<f64> = targets.iter().map(|t| 2.0 * t - 1.0).collect();
    let future: Vec<f64> = targets.iter().map(|t| 100.0 + t).collect();

    Dataset::new(
        dates,
        vec![
            ("x".to_string(), x),
            (FUTURE_CLOSE_COLUMN.to_string(), future),
            (TARGET_COLUMN.to_string(), targets.to_vec()),
        ],
    )
    .unwrap()
}

#[test]
fn test_single_class_slices_are_scored() {
    // Folds: [0,4)/[4,6), [2,6)/[6,8), [4,8)/[8,10), [6,10)/[10,12)
    let data = mostly_up([1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    let columns = vec!["x".to_string()];
    let summary = evaluate(&data, &columns, &window(4, 2, 0), &candidates()).unwrap();
    assert_eq!(summary.folds_evaluated(), 4);

    let logistic = summary.get("logistic").unwrap();
    let scores: Vec<(f64, Option<f64>)> = logistic.folds.iter().map(|f| (f.accuracy, f.auc)).collect();
    assert_eq!(
        scores,
        vec![(1.0, None), (0.5, Some(0.5)), (1.0, None), (1.0, None)]
    );
    // Only the fold with both classes under test counts toward the AUC.
    assert_eq!(logistic.mean_auc(), Some(0.5));
    assert!((logistic.mean_accuracy().unwrap() - 0.875).abs() < 1e-12);

    // Single-class training slices give the same constant model to every candidate.
    let forest = summary.get("random_forest").unwrap();
    assert_eq!(forest.folds[..2], logistic.folds[..2]);
}
