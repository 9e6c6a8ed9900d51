// CSV export of raw bars and finalized datasets
pub mod csv_export;

// JSON model and metadata store
pub mod json_artifact_store;

pub use csv_export::{write_dataset, write_price_bars};
pub use json_artifact_store::JsonArtifactStore;
