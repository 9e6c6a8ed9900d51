// Daily price data
pub mod price_bar;
