// Candidate classifiers and their fitted forms
pub mod models;

// Forward-rolling out-of-sample evaluation
pub mod walk_forward;

// Selection, final refit and persistence
pub mod trainer;

pub mod predictor;

pub use models::{FittedModel, ModelCandidate};
pub use predictor::Predictor;
pub use trainer::{ArtifactStore, TrainConfig, TrainedArtifact, select_best, train};
pub use walk_forward::{evaluate, walk_forward_folds};
