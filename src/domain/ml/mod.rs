pub mod artifact;
pub mod dataset;
pub mod fold;
pub mod metrics;

pub use artifact::{ArtifactMetadata, Prediction, format_prediction};
pub use dataset::{Dataset, FUTURE_CLOSE_COLUMN, TARGET_COLUMN};
pub use fold::Fold;
pub use metrics::{CandidateEvaluation, CandidateMetrics, EvaluationSummary, FoldMetrics};
