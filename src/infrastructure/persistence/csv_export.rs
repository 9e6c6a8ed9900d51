use crate::domain::market::price_bar::PriceBar;
use crate::domain::ml::Dataset;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

fn create_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("Failed to create CSV {:?}", path))
}

/// Writes bars with a `Date,Open,High,Low,Close,Volume` header. Absent
/// volume is an empty field.
pub fn write_price_bars(path: &Path, bars: &[PriceBar]) -> Result<()> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    info!("Wrote {} bars to {:?}", bars.len(), path);
    Ok(())
}

/// Writes the finalized dataset, dates first, then every column in order.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let names = dataset.column_names();
    let columns: Vec<&[f64]> = names
        .iter()
        .filter_map(|name| dataset.column(name))
        .collect();

    let mut wtr = create_writer(path)?;
    let mut header = vec!["date"];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    for (row, date) in dataset.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(date.to_string());
        record.extend(columns.iter().map(|column| column[row].to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!("Wrote {} dataset rows to {:?}", dataset.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{FUTURE_CLOSE_COLUMN, TARGET_COLUMN};
    use crate::infrastructure::market_data::parse_price_csv;
    use chrono::NaiveDate;

    fn temp_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("goldcast_test_{}_export", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_price_bars_read_back() {
        let path = temp_file("prices.csv");
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let bars = vec![
            PriceBar::new(date, 1.0, 2.0, 0.5, 1.5).with_volume(10.0),
            PriceBar::new(date.succ_opt().unwrap(), 1.5, 2.5, 1.0, 2.0),
        ];
        write_price_bars(&path, &bars).unwrap();

        let loaded = parse_price_csv(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(loaded, bars);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_dataset_header_and_rows() {
        let path = temp_file("dataset.csv");
        let dataset = Dataset::new(
            vec![NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()],
            vec![
                ("close".to_string(), vec![2.5]),
                (FUTURE_CLOSE_COLUMN.to_string(), vec![3.0]),
                (TARGET_COLUMN.to_string(), vec![1.0]),
            ],
        )
        .unwrap();
        write_dataset(&path, &dataset).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,close,future_close,target");
        assert_eq!(lines[1], "2024-04-01,2.5,3,1");
        fs::remove_file(path).ok();
    }
}
