// Technical indicators over the close series
pub mod indicators;

// Feature table and label construction
pub mod features;

// Walk-forward evaluation, training and prediction
pub mod ml;

// Per-horizon orchestration
pub mod pipeline;
