//! Out-of-sample classification metrics and their per-candidate aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probability at or above which a row is predicted as class 1.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Fraction of rows whose thresholded prediction matches the label.
pub fn accuracy(labels: &[i32], probabilities: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels
        .iter()
        .zip(probabilities)
        .filter(|&(&label, &p)| i32::from(p >= DECISION_THRESHOLD) == label)
        .count();
    correct as f64 / labels.len() as f64
}

/// Area under the ROC curve via the rank-sum statistic, ties sharing the
/// average rank.
///
/// Returns `None` when the labels hold a single class, where AUC is not
/// defined.
pub fn roc_auc(labels: &[i32], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let n_pos = labels[..n].iter().filter(|&&l| l == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = (0..n).filter(|&k| labels[k] == 1).map(|k| ranks[k]).sum();
    let pos = n_pos as f64;
    let neg = n_neg as f64;
    Some((positive_rank_sum - pos * (pos + 1.0) / 2.0) / (pos * neg))
}

/// Metrics of one candidate on one fold's test slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub accuracy: f64,
    pub auc: Option<f64>,
}

/// Aggregated metrics as persisted in the artifact metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    pub accuracy: f64,
    pub auc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub name: String,
    pub folds: Vec<FoldMetrics>,
}

impl CandidateEvaluation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folds: Vec::new(),
        }
    }

    /// Mean accuracy across evaluated folds, summed in fold order.
    pub fn mean_accuracy(&self) -> Option<f64> {
        if self.folds.is_empty() {
            return None;
        }
        let sum: f64 = self.folds.iter().map(|f| f.accuracy).sum();
        Some(sum / self.folds.len() as f64)
    }

    /// Mean AUC over the folds where it was defined.
    pub fn mean_auc(&self) -> Option<f64> {
        let defined: Vec<f64> = self.folds.iter().filter_map(|f| f.auc).collect();
        if defined.is_empty() {
            return None;
        }
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }

    pub fn metrics(&self) -> Option<CandidateMetrics> {
        Some(CandidateMetrics {
            accuracy: self.mean_accuracy()?,
            auc: self.mean_auc(),
        })
    }
}

/// Walk-forward results for every candidate, in candidate order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    candidates: Vec<CandidateEvaluation>,
}

impl EvaluationSummary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: names.into_iter().map(CandidateEvaluation::new).collect(),
        }
    }

    pub fn candidates(&self) -> &[CandidateEvaluation] {
        &self.candidates
    }

    pub fn get(&self, name: &str) -> Option<&CandidateEvaluation> {
        self.candidates.iter().find(|c| c.name == name)
    }

    pub fn record(&mut self, candidate: usize, metrics: FoldMetrics) {
        if let Some(entry) = self.candidates.get_mut(candidate) {
            entry.folds.push(metrics);
        }
    }

    /// Number of folds that contributed to the summary.
    pub fn folds_evaluated(&self) -> usize {
        self.candidates
            .iter()
            .map(|c| c.folds.len())
            .max()
            .unwrap_or(0)
    }

    /// Candidates with at least one evaluated fold, keyed by name.
    pub fn to_metrics_map(&self) -> BTreeMap<String, CandidateMetrics> {
        self.candidates
            .iter()
            .filter_map(|c| c.metrics().map(|m| (c.name.clone(), m)))
            .collect()
    }
}
