use crate::config::DataSourceConfig;
use crate::domain::market::price_bar::PriceBar;
use crate::domain::ports::PriceSource;
use crate::infrastructure::core::HttpClientFactory;
use crate::infrastructure::market_data::csv_price_source::parse_price_csv;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{info, warn};

/// Downloads the daily XAU/USD series as CSV from Stooq.
pub struct StooqClient {
    client: ClientWithMiddleware,
    url: String,
    days: usize,
}

impl StooqClient {
    pub fn new(config: &DataSourceConfig, days: usize) -> Self {
        Self {
            client: HttpClientFactory::create_client(std::time::Duration::from_secs(
                config.timeout_secs,
            )),
            url: config.stooq_url.clone(),
            days,
        }
    }

    async fn download(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        if !response.status().is_success() {
            bail!("Stooq returned {} for {}", response.status(), self.url);
        }
        response
            .text()
            .await
            .context("Failed to read Stooq response body")
    }
}

/// Keeps bars dated within `[today - 2 * days, today]`, sorted ascending,
/// and returns the last `days` of them.
pub fn recent_window(mut bars: Vec<PriceBar>, days: usize, today: NaiveDate) -> Vec<PriceBar> {
    let start = today - Duration::days(2 * days as i64);
    bars.retain(|bar| bar.date >= start && bar.date <= today);
    bars.sort_by_key(|bar| bar.date);
    let excess = bars.len().saturating_sub(days);
    bars.drain(..excess);
    bars
}

#[async_trait]
impl PriceSource for StooqClient {
    async fn fetch_bars(&self) -> Result<Vec<PriceBar>> {
        info!("Downloading daily bars from {}", self.url);
        let body = self.download().await?;
        let bars = parse_price_csv(body.as_bytes()).context("Failed to parse Stooq CSV")?;

        let today = Utc::now().date_naive();
        let bars = recent_window(bars, self.days, today);
        if bars.is_empty() {
            warn!("Stooq returned no bars within the last {} days", 2 * self.days);
        } else {
            info!(
                "Fetched {} bars ({} to {})",
                bars.len(),
                bars[0].date,
                bars[bars.len() - 1].date
            );
        }
        Ok(bars)
    }

    fn name(&self) -> &str {
        "stooq"
    }
}
