use crate::application::ml::models::FittedModel;
use crate::application::ml::trainer::ArtifactStore;
use crate::domain::errors::{ArtifactError, PredictError};
use crate::domain::features::FeatureRow;
use crate::domain::ml::{ArtifactMetadata, Prediction, format_prediction};
use tracing::debug;

/// Scores feature rows with a persisted artifact.
#[derive(Debug)]
pub struct Predictor {
    metadata: ArtifactMetadata,
    model: FittedModel,
}

impl Predictor {
    pub fn load(store: &dyn ArtifactStore) -> Result<Self, ArtifactError> {
        let artifact = store.load()?;
        debug!(
            "Loaded {} for horizon {} ({} features)",
            artifact.metadata.best_model,
            artifact.metadata.horizon,
            artifact.metadata.feature_columns.len()
        );
        Ok(Self {
            metadata: artifact.metadata,
            model: artifact.model,
        })
    }

    /// Directional probabilities for one feature row.
    ///
    /// Every training feature must be present and defined in `row`; label
    /// columns are not needed.
    pub fn predict(&self, row: &FeatureRow) -> Result<Prediction, PredictError> {
        let features = self
            .metadata
            .feature_columns
            .iter()
            .map(|column| match row.get(column) {
                None => Err(PredictError::MissingFeature {
                    column: column.clone(),
                }),
                Some(None) => Err(PredictError::UndefinedFeature {
                    column: column.clone(),
                    date: row.date,
                }),
                Some(Some(value)) => Ok(value),
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let probability_up = self
            .model
            .predict_probability(&[features])?
            .first()
            .copied()
            .unwrap_or(0.5);

        Ok(format_prediction(self.metadata.horizon, probability_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::trainer::TrainedArtifact;
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct InMemoryStore {
        probability: f64,
    }

    impl ArtifactStore for InMemoryStore {
        fn model_path(&self, name: &str) -> PathBuf {
            PathBuf::from(format!("{}.json", name))
        }

        fn save(&self, _artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
            Ok(())
        }

        fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
            Ok(TrainedArtifact {
                metadata: ArtifactMetadata {
                    best_model: "logistic".to_string(),
                    model_path: self.model_path("logistic"),
                    metrics: BTreeMap::new(),
                    feature_columns: vec!["rsi".to_string(), "macd".to_string()],
                    horizon: 5,
                    rows: 100,
                    folds_evaluated: 3,
                    trained_at: Utc::now(),
                },
                model: FittedModel::Constant {
                    probability: self.probability,
                    n_features: 2,
                },
            })
        }
    }

    fn row(values: &[(&str, Option<f64>)]) -> FeatureRow {
        FeatureRow::new(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            values
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        )
    }

    #[test]
    fn test_predict_complements_probability() {
        let predictor = Predictor::load(&InMemoryStore { probability: 0.7 }).unwrap();
        let prediction = predictor
            .predict(&row(&[("macd", Some(0.1)), ("close", Some(1.0)), ("rsi", Some(55.0))]))
            .unwrap();
        assert_eq!(prediction.horizon, 5);
        assert!((prediction.probability_up - 0.7).abs() < 1e-12);
        assert!((prediction.probability_down - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_missing_feature_is_error() {
        let predictor = Predictor::load(&InMemoryStore { probability: 0.7 }).unwrap();
        let err = predictor.predict(&row(&[("rsi", Some(55.0))])).unwrap_err();
        assert!(matches!(err, PredictError::MissingFeature { column } if column == "macd"));
    }

    #[test]
    fn test_undefined_feature_is_error() {
        let predictor = Predictor::load(&InMemoryStore { probability: 0.7 }).unwrap();
        let err = predictor
            .predict(&row(&[("rsi", None), ("macd", Some(0.1))]))
            .unwrap_err();
        assert!(matches!(err, PredictError::UndefinedFeature { column, .. } if column == "rsi"));
    }
}
