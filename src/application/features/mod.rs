// Feature table construction
pub mod feature_builder;

// Forward-looking labels and dataset finalization
pub mod labels;

pub use feature_builder::{FeatureBuilder, build_features};
pub use labels::{add_targets, finalize};
