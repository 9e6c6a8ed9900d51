//! The two directional classifiers compared by the walk-forward evaluator.
//!
//! Both fit on a row-major `f64` matrix with 0/1 labels and report the
//! probability of class 1. Fitted models are plain serde types so the
//! selected one can be written to disk as JSON.

use crate::config::{LogisticConfig, ModelConfig, RandomForestConfig};
use crate::domain::errors::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};
use statrs::statistics::Statistics;
use std::fmt;

pub const LOGISTIC: &str = "logistic";
pub const RANDOM_FOREST: &str = "random_forest";

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
    Logistic(LogisticConfig),
    RandomForest(RandomForestConfig),
}

/// A named, parameterized classifier that has not been fitted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCandidate {
    pub name: String,
    pub kind: CandidateKind,
    pub seed: u64,
}

impl ModelCandidate {
    pub fn logistic(config: &LogisticConfig, seed: u64) -> Self {
        Self {
            name: LOGISTIC.to_string(),
            kind: CandidateKind::Logistic(config.clone()),
            seed,
        }
    }

    pub fn random_forest(config: &RandomForestConfig, seed: u64) -> Self {
        Self {
            name: RANDOM_FOREST.to_string(),
            kind: CandidateKind::RandomForest(config.clone()),
            seed,
        }
    }

    /// The compared candidates, in tie-break order.
    pub fn from_config(config: &ModelConfig) -> Vec<ModelCandidate> {
        vec![
            Self::logistic(&config.logistic, config.random_state),
            Self::random_forest(&config.random_forest, config.random_state),
        ]
    }

    pub fn fit(&self, features: &[Vec<f64>], labels: &[i32]) -> Result<FittedModel, ModelError> {
        let n_features = check_training_shape(features, labels)?;

        // A single-class slice has nothing to separate.
        if let Some(class) = single_class(labels) {
            return Ok(FittedModel::Constant {
                probability: f64::from(class),
                n_features,
            });
        }

        match &self.kind {
            CandidateKind::Logistic(config) => {
                LogisticModel::fit(features, labels, config).map(FittedModel::Logistic)
            }
            CandidateKind::RandomForest(config) => {
                ForestModel::fit(features, labels, config, self.seed).map(FittedModel::RandomForest)
            }
        }
    }
}

/// A fitted classifier able to score feature rows.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FittedModel {
    Constant { probability: f64, n_features: usize },
    Logistic(LogisticModel),
    RandomForest(ForestModel),
}

impl FittedModel {
    pub fn n_features(&self) -> usize {
        match self {
            FittedModel::Constant { n_features, .. } => *n_features,
            FittedModel::Logistic(model) => model.weights.len(),
            FittedModel::RandomForest(model) => model.n_features,
        }
    }

    /// Probability of class 1 for every row.
    pub fn predict_probability(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let expected = self.n_features();
        if let Some(row) = features.iter().find(|row| row.len() != expected) {
            return Err(ModelError::FeatureCountMismatch {
                expected,
                actual: row.len(),
            });
        }

        match self {
            FittedModel::Constant { probability, .. } => Ok(vec![*probability; features.len()]),
            FittedModel::Logistic(model) => Ok(model.predict_probability(features)),
            FittedModel::RandomForest(model) => model.predict_probability(features),
        }
    }
}

fn check_training_shape(features: &[Vec<f64>], labels: &[i32]) -> Result<usize, ModelError> {
    let first = features.first().ok_or(ModelError::EmptyTrainingSet)?;
    if first.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.len() != labels.len() {
        return Err(ModelError::FitFailed {
            model: "classifier".to_string(),
            reason: format!("{} rows but {} labels", features.len(), labels.len()),
        });
    }
    if let Some(row) = features.iter().find(|row| row.len() != first.len()) {
        return Err(ModelError::FeatureCountMismatch {
            expected: first.len(),
            actual: row.len(),
        });
    }
    Ok(first.len())
}

fn single_class(labels: &[i32]) -> Option<i32> {
    let first = *labels.first()?;
    labels.iter().all(|&l| l == first).then_some(first)
}

fn to_matrix(rows: &[Vec<f64>], model: &str) -> Result<DenseMatrix<f64>, ModelError> {
    DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(|e| ModelError::FitFailed {
        model: model.to_string(),
        reason: format!("Matrix error: {}", e),
    })
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// L2 logistic regression on standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn fit(
        features: &[Vec<f64>],
        labels: &[i32],
        config: &LogisticConfig,
    ) -> Result<Self, ModelError> {
        let n_features = features[0].len();
        let mut means = Vec::with_capacity(n_features);
        let mut scales = Vec::with_capacity(n_features);
        for j in 0..n_features {
            let column: Vec<f64> = features.iter().map(|row| row[j]).collect();
            let mean = column.iter().mean();
            let sd = column.iter().population_std_dev();
            means.push(mean);
            scales.push(if sd.is_finite() && sd > 1e-12 { sd } else { 1.0 });
        }

        let scaled: Vec<Vec<f64>> = features
            .iter()
            .map(|row| standardize(row, &means, &scales))
            .collect();
        let x = to_matrix(&scaled, LOGISTIC)?;
        let y = labels.to_vec();

        let params = LogisticRegressionParameters::default().with_alpha(config.alpha);
        let model: LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>> =
            LogisticRegression::fit(&x, &y, params).map_err(|e| ModelError::FitFailed {
                model: LOGISTIC.to_string(),
                reason: e.to_string(),
            })?;

        let coefficients = model.coefficients();
        let (rows, cols) = coefficients.shape();
        let weights: Vec<f64> = if rows == 1 {
            (0..cols).map(|j| *coefficients.get((0, j))).collect()
        } else {
            (0..rows).map(|i| *coefficients.get((i, 0))).collect()
        };
        if weights.len() != n_features {
            return Err(ModelError::FitFailed {
                model: LOGISTIC.to_string(),
                reason: format!(
                    "expected {} coefficients, got {}",
                    n_features,
                    weights.len()
                ),
            });
        }
        let intercept = *model.intercept().get((0, 0));

        Ok(Self {
            means,
            scales,
            weights,
            intercept,
        })
    }

    fn predict_probability(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features
            .iter()
            .map(|row| {
                let z = standardize(row, &self.means, &self.scales)
                    .iter()
                    .zip(&self.weights)
                    .map(|(x, w)| x * w)
                    .sum::<f64>()
                    + self.intercept;
                sigmoid(z)
            })
            .collect()
    }
}

fn standardize(row: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter()
        .zip(means.iter().zip(scales))
        .map(|(x, (m, s))| (x - m) / s)
        .collect()
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ForestTree {
    /// Bootstrap sample held a single class.
    Leaf { class: i32 },
    Split { columns: Vec<usize>, tree: Tree },
}

/// Bagged decision trees: each tree sees a bootstrap sample of rows and a
/// random subset of feature columns. P(1) is the share of trees voting 1.
#[derive(Serialize, Deserialize)]
pub struct ForestModel {
    n_features: usize,
    trees: Vec<ForestTree>,
}

impl fmt::Debug for ForestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForestModel")
            .field("n_features", &self.n_features)
            .field("trees", &self.trees.len())
            .finish()
    }
}

impl ForestModel {
    fn fit(
        features: &[Vec<f64>],
        labels: &[i32],
        config: &RandomForestConfig,
        seed: u64,
    ) -> Result<Self, ModelError> {
        let n_rows = features.len();
        let n_features = features[0].len();
        let per_tree = config
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt().round() as usize).max(1))
            .clamp(1, n_features);

        // Draw every sample up front so parallel fitting stays reproducible.
        let mut rng = StdRng::seed_from_u64(seed);
        let draws: Vec<(Vec<usize>, Vec<usize>)> = (0..config.n_trees)
            .map(|_| {
                let rows = (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect();
                let mut columns =
                    rand::seq::index::sample(&mut rng, n_features, per_tree).into_vec();
                columns.sort_unstable();
                (rows, columns)
            })
            .collect();

        let trees = draws
            .into_par_iter()
            .map(|(rows, columns)| fit_tree(features, labels, &rows, columns, config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { n_features, trees })
    }

    fn predict_probability(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let votes = self
            .trees
            .par_iter()
            .map(|tree| predict_tree(tree, features))
            .collect::<Result<Vec<_>, _>>()?;

        // smartcore tree probabilities are one-hot at the leaf, so the vote
        // share is the mean of the per-tree probabilities.
        let n_trees = self.trees.len().max(1) as f64;
        Ok((0..features.len())
            .map(|row| {
                let up = votes.iter().filter(|tree_votes| tree_votes[row] == 1).count();
                up as f64 / n_trees
            })
            .collect())
    }
}

fn select(features: &[Vec<f64>], rows: impl Iterator<Item = usize>, columns: &[usize]) -> Vec<Vec<f64>> {
    rows.map(|r| columns.iter().map(|&c| features[r][c]).collect())
        .collect()
}

fn fit_tree(
    features: &[Vec<f64>],
    labels: &[i32],
    rows: &[usize],
    columns: Vec<usize>,
    config: &RandomForestConfig,
) -> Result<ForestTree, ModelError> {
    let y: Vec<i32> = rows.iter().map(|&r| labels[r]).collect();
    if let Some(class) = single_class(&y) {
        return Ok(ForestTree::Leaf { class });
    }

    let x = to_matrix(&select(features, rows.iter().copied(), &columns), RANDOM_FOREST)?;
    let mut params = DecisionTreeClassifierParameters::default()
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf);
    if let Some(depth) = config.max_depth {
        params = params.with_max_depth(depth);
    }

    let tree: Tree = DecisionTreeClassifier::fit(&x, &y, params).map_err(|e| {
        ModelError::FitFailed {
            model: RANDOM_FOREST.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(ForestTree::Split { columns, tree })
}

fn predict_tree(tree: &ForestTree, features: &[Vec<f64>]) -> Result<Vec<i32>, ModelError> {
    match tree {
        ForestTree::Leaf { class } => Ok(vec![*class; features.len()]),
        ForestTree::Split { columns, tree } => {
            let x = DenseMatrix::from_2d_vec(&select(features, 0..features.len(), columns))
                .map_err(|e| ModelError::PredictFailed {
                    model: RANDOM_FOREST.to_string(),
                    reason: format!("Matrix error: {}", e),
                })?;
            tree.predict(&x).map_err(|e| ModelError::PredictFailed {
                model: RANDOM_FOREST.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
