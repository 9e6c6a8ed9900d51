// Per-day feature table
pub mod table;

pub use table::{FeatureColumn, FeatureRow, FeatureTable};
