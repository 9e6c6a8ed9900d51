// Daily price data
pub mod market;

// Feature table
pub mod features;

// Datasets, folds, metrics and artifacts
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
