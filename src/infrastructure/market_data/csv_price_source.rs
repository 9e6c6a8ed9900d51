use crate::domain::errors::DataShapeError;
use crate::domain::market::price_bar::PriceBar;
use crate::domain::ports::PriceSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["date", "open", "high", "low", "close"];

/// Parses daily bars from CSV with `Date,Open,High,Low,Close[,Volume]`
/// headers, matched case-insensitively.
///
/// Rows whose date or prices cannot be parsed are skipped. An empty or
/// unparsable volume is kept as absent. The result is sorted by date.
pub fn parse_price_csv<R: Read>(reader: R) -> Result<Vec<PriceBar>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let mut indices = [0usize; 5];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = position(name).ok_or_else(|| DataShapeError::MissingColumn {
            column: name.to_string(),
        })?;
    }
    let [date_idx, open_idx, high_idx, low_idx, close_idx] = indices;
    let volume_idx = position("volume");

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize| field(idx).parse::<f64>().ok().filter(|v| v.is_finite());

        let parsed = NaiveDate::parse_from_str(field(date_idx), "%Y-%m-%d")
            .ok()
            .zip(number(open_idx))
            .zip(number(high_idx))
            .zip(number(low_idx))
            .zip(number(close_idx));
        let Some(((((date, open), high), low), close)) = parsed else {
            skipped += 1;
            continue;
        };

        let mut bar = PriceBar::new(date, open, high, low, close);
        bar.volume = volume_idx.and_then(number);
        bars.push(bar);
    }

    if skipped > 0 {
        warn!("Skipped {} CSV rows with unparsable date or prices", skipped);
    }
    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

/// Bars read from a local CSV file.
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<PriceBar>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open price CSV {:?}", self.path))?;
        let bars = parse_price_csv(BufReader::new(file))
            .with_context(|| format!("Failed to parse price CSV {:?}", self.path))?;
        info!("Loaded {} bars from {:?}", bars.len(), self.path);
        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch_bars(&self) -> Result<Vec<PriceBar>> {
        self.load()
    }

    fn name(&self) -> &str {
        "csv"
    }
}
