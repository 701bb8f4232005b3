//! Cross-crop shock correlation

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::error::DataError;
use crate::metrics::SeriesTable;
use crate::model::CropHistory;

/// Climate and price correlation matrices, rows and columns in crop order
#[derive(Debug, Clone, PartialEq)]
pub struct ShockCorrelation {
    pub climate: DMatrix<f64>,
    pub price: DMatrix<f64>,
}

impl ShockCorrelation {
    /// Uncorrelated crops
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            climate: DMatrix::identity(n, n),
            price: DMatrix::identity(n, n),
        }
    }

    /// Estimate correlations from yearly rainfall and price series.
    ///
    /// Series are turned into year-over-year relative changes before the
    /// Pearson correlation is taken. A family with no series at all stays
    /// uncorrelated; a family that covers some crops but not all is an error.
    pub fn estimate(history: Option<&CropHistory>, crops: &[String]) -> Result<Self, DataError> {
        let n = crops.len();
        let Some(history) = history else {
            return Ok(Self::identity(n));
        };
        Ok(Self {
            climate: family_correlation(&history.rainfall, crops)?,
            price: family_correlation(&history.prices, crops)?,
        })
    }
}

fn family_correlation(
    series: &BTreeMap<String, Vec<f64>>,
    crops: &[String],
) -> Result<DMatrix<f64>, DataError> {
    let n = crops.len();
    if series.is_empty() {
        return Ok(DMatrix::identity(n, n));
    }
    let columns = crops
        .iter()
        .map(|crop| {
            series
                .get(crop)
                .map(|values| (crop.clone(), values.clone()))
                .ok_or_else(|| DataError::MissingSeries(crop.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let changes = SeriesTable::from_columns(columns).pct_change();
    Ok(changes.select(crops)?.correlation())
}
