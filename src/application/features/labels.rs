use crate::domain::errors::{ConfigError, DataShapeError, InsufficientDataError, PipelineError};
use crate::domain::features::FeatureTable;
use crate::domain::ml::{Dataset, FUTURE_CLOSE_COLUMN, TARGET_COLUMN};
use tracing::{info, warn};

/// Appends `future_close` (close `horizon` rows ahead) and the binary
/// `target` (1 when the future close is strictly higher). The last
/// `horizon` rows have no future and stay undefined.
pub fn add_targets(table: &FeatureTable, horizon: usize) -> Result<FeatureTable, PipelineError> {
    if horizon == 0 {
        return Err(ConfigError::invalid("horizon", "must be >= 1").into());
    }
    let close = table
        .column("close")
        .ok_or_else(|| DataShapeError::MissingColumn {
            column: "close".to_string(),
        })?;

    let future_close: Vec<Option<f64>> = (0..close.len())
        .map(|i| close.get(i + horizon).copied().flatten())
        .collect();
    let target: Vec<Option<f64>> = close
        .iter()
        .zip(&future_close)
        .map(|(now, future)| match (now, future) {
            (Some(now), Some(future)) => Some(if future > now { 1.0 } else { 0.0 }),
            _ => None,
        })
        .collect();

    let mut labeled = table.clone();
    labeled.push_column(FUTURE_CLOSE_COLUMN, future_close)?;
    labeled.push_column(TARGET_COLUMN, target)?;
    Ok(labeled)
}

/// Drops every row with an undefined value in any column.
///
/// The surviving row count shrinks with the longest window, lag and
/// horizon configured. Losing every row is reported as insufficient data.
pub fn finalize(table: &FeatureTable) -> Result<Dataset, PipelineError> {
    let keep: Vec<usize> = (0..table.len())
        .filter(|&i| table.is_row_defined(i))
        .collect();

    if keep.is_empty() {
        warn!(
            "Finalization dropped all {} rows; windows or horizon exceed the series",
            table.len()
        );
        return Err(InsufficientDataError::AllRowsDropped { rows: table.len() }.into());
    }

    let dates = keep.iter().map(|&i| table.dates()[i]).collect();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let values = keep
                .iter()
                .filter_map(|&i| column.values[i])
                .collect::<Vec<f64>>();
            (column.name.clone(), values)
        })
        .collect();

    info!(
        "Finalized dataset: kept {} of {} rows",
        keep.len(),
        table.len()
    );
    Ok(Dataset::new(dates, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn table(closes: &[f64], feature: &[Option<f64>]) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let dates = (0..closes.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        let mut table = FeatureTable::new(dates);
        table
            .push_column("close", closes.iter().copied().map(Some).collect())
            .unwrap();
        table.push_column("feature", feature.to_vec()).unwrap();
        table
    }

    #[test]
    fn test_add_targets_tail_is_undefined() {
        let base = table(&[1.0, 3.0, 2.0, 2.0], &[Some(0.0); 4]);
        let labeled = add_targets(&base, 2).unwrap();

        assert_eq!(
            labeled.column(FUTURE_CLOSE_COLUMN).unwrap(),
            &[Some(2.0), Some(2.0), None, None]
        );
        assert_eq!(
            labeled.column(TARGET_COLUMN).unwrap(),
            &[Some(1.0), Some(0.0), None, None]
        );
        // input untouched
        assert!(!base.has_column(TARGET_COLUMN));
    }

    #[test]
    fn test_equal_future_close_is_not_up() {
        let labeled = add_targets(&table(&[5.0, 5.0], &[Some(1.0); 2]), 1).unwrap();
        assert_eq!(labeled.column(TARGET_COLUMN).unwrap()[0], Some(0.0));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let base = table(&[1.0, 2.0], &[Some(1.0); 2]);
        assert!(matches!(
            add_targets(&base, 0),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_finalize_round_trip_future_close() {
        let closes: Vec<f64> = (0..12).map(|i| 10.0 + ((i * 7) % 5) as f64).collect();
        let mut feature = vec![Some(1.0); 12];
        feature[0] = None;
        feature[1] = None;
        let horizon = 3;

        let dataset = finalize(&add_targets(&table(&closes, &feature), horizon).unwrap()).unwrap();
        assert_eq!(dataset.len(), 12 - 2 - horizon);

        let close = dataset.column("close").unwrap();
        let future = dataset.column(FUTURE_CLOSE_COLUMN).unwrap();
        for (row, date) in dataset.dates().iter().enumerate() {
            let original = (*date - NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).num_days() as usize;
            assert_eq!(close[row], closes[original]);
            assert_eq!(future[row], closes[original + horizon]);
        }
    }

    #[test]
    fn test_finalize_all_rows_dropped() {
        let labeled = add_targets(&table(&[1.0, 2.0], &[None, Some(1.0)]), 1).unwrap();
        let err = finalize(&labeled).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData(InsufficientDataError::AllRowsDropped { rows: 2 })
        ));
    }

    #[test]
    fn test_finalize_requires_labels() {
        let err = finalize(&table(&[1.0], &[Some(1.0)])).unwrap_err();
        assert!(matches!(err, PipelineError::DataShape(_)));
    }
}
