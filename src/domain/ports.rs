use crate::domain::market::price_bar::PriceBar;
use anyhow::Result;
use async_trait::async_trait;

/// Supplier of the daily bar series the pipeline runs on.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Bars sorted ascending by date.
    async fn fetch_bars(&self) -> Result<Vec<PriceBar>>;

    fn name(&self) -> &str;
}
