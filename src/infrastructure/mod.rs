pub mod core;
pub mod market_data;
pub mod persistence;
pub mod visualization;

pub use market_data::{CsvPriceSource, StooqClient};
pub use persistence::JsonArtifactStore;
