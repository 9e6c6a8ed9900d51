// Close trend and return histogram PNGs
pub mod charts;

pub use charts::{plot_close_trend, plot_return_distribution};
