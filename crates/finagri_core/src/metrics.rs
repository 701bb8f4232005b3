//! Historical return statistics
//!
//! Pivots the per-(security, year) records into year x security tables and
//! derives means and covariances from them. Missing observations stay
//! missing: means skip them and covariances use pairwise-complete years.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::DMatrix;

use crate::error::DataError;
use crate::model::{SecurityDataset, SecurityRecord};

/// Year x column table of optional observations.
///
/// Columns are kept in sorted order; `values[c][y]` is the observation of
/// column `c` in `years[y]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesTable {
    years: Vec<i32>,
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl SeriesTable {
    /// Pivot `(column, year, value)` observations into a table.
    /// A later observation for the same cell overwrites an earlier one.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (String, i32, Option<f64>)>,
    {
        let mut cells: BTreeMap<(String, i32), Option<f64>> = BTreeMap::new();
        let mut years = BTreeSet::new();
        let mut columns = BTreeSet::new();
        for (column, year, value) in observations {
            years.insert(year);
            columns.insert(column.clone());
            cells.insert((column, year), value);
        }

        let years: Vec<i32> = years.into_iter().collect();
        let columns: Vec<String> = columns.into_iter().collect();
        let values = columns
            .iter()
            .map(|c| {
                years
                    .iter()
                    .map(|y| cells.get(&(c.clone(), *y)).copied().flatten())
                    .collect()
            })
            .collect();

        Self {
            years,
            columns,
            values,
        }
    }

    /// Build a table from dense, equally long columns indexed 0..len.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Self {
        let observations = columns.into_iter().flat_map(|(name, series)| {
            series
                .into_iter()
                .enumerate()
                .map(move |(i, v)| (name.clone(), i as i32, Some(v)))
        });
        Self::from_observations(observations)
    }

    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    /// Sub-table with the given columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<SeriesTable, DataError> {
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            let column = self
                .column(name)
                .ok_or_else(|| DataError::MissingSeries(name.clone()))?;
            values.push(column.to_vec());
        }
        Ok(Self {
            years: self.years.clone(),
            columns: names.to_vec(),
            values,
        })
    }

    /// Column means over present observations; `None` for an empty column.
    #[must_use]
    pub fn means(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|column| {
                let present: Vec<f64> = column.iter().flatten().copied().collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            })
            .collect()
    }

    /// Sample covariance (ddof = 1) over pairwise-complete years.
    /// Pairs with fewer than two common observations get 0.
    #[must_use]
    pub fn covariance(&self) -> DMatrix<f64> {
        let n = self.columns.len();
        DMatrix::from_fn(n, n, |i, j| {
            pairwise(&self.values[i], &self.values[j], |a, b| {
                covariance(a, b).unwrap_or(0.0)
            })
        })
    }

    /// Pearson correlation over pairwise-complete years.
    /// Undefined entries (constant or too short series) fall back to identity.
    #[must_use]
    pub fn correlation(&self) -> DMatrix<f64> {
        let n = self.columns.len();
        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                return 1.0;
            }
            pairwise(&self.values[i], &self.values[j], |a, b| {
                let cov = covariance(a, b)?;
                let sa = covariance(a, a)?.sqrt();
                let sb = covariance(b, b)?.sqrt();
                let r = cov / (sa * sb);
                r.is_finite().then_some(r)
            })
            .unwrap_or(0.0)
        })
    }

    /// Year-over-year relative change of every column.
    /// The first year and any change from a missing or zero base are dropped.
    #[must_use]
    pub fn pct_change(&self) -> SeriesTable {
        if self.years.len() < 2 {
            return Self {
                years: Vec::new(),
                columns: self.columns.clone(),
                values: vec![Vec::new(); self.columns.len()],
            };
        }
        let values = self
            .values
            .iter()
            .map(|column| {
                column
                    .windows(2)
                    .map(|w| match (w[0], w[1]) {
                        (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev),
                        _ => None,
                    })
                    .collect()
            })
            .collect();
        Self {
            years: self.years[1..].to_vec(),
            columns: self.columns.clone(),
            values,
        }
    }
}

fn pairwise<T>(
    a: &[Option<f64>],
    b: &[Option<f64>],
    f: impl Fn(&[f64], &[f64]) -> T,
) -> T {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    f(&xs, &ys)
}

fn covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len();
    if n < 2 {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / (n - 1) as f64)
}

// ============================================================================
// Security tables
// ============================================================================

/// Yearly total return `(price - previous price + dividend) / previous price`.
///
/// The previous price is the security's preceding record; years whose
/// previous price is missing or zero have no total return.
#[must_use]
pub fn total_returns(dataset: &SecurityDataset) -> SeriesTable {
    let mut observations = Vec::new();
    for (name, history) in dataset.by_security() {
        for pair in history.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let Some(base) = prev.closing_price.filter(|p| *p != 0.0) else {
                continue;
            };
            let value = match (cur.closing_price, cur.dividend_paid) {
                (Some(price), Some(dividend)) => Some((price - base + dividend) / base),
                _ => None,
            };
            observations.push((name.to_string(), cur.year, value));
        }
    }
    SeriesTable::from_observations(observations)
}

#[must_use]
pub fn dividend_yields(dataset: &SecurityDataset) -> SeriesTable {
    pivot(dataset, |r| r.dividend_yield)
}

#[must_use]
pub fn price_variations(dataset: &SecurityDataset) -> SeriesTable {
    pivot(dataset, |r| r.price_variation)
}

fn pivot(dataset: &SecurityDataset, field: impl Fn(&SecurityRecord) -> Option<f64>) -> SeriesTable {
    SeriesTable::from_observations(
        dataset
            .records()
            .iter()
            .map(|r| (r.name.clone(), r.year, field(r))),
    )
}

/// Mean dividend yield per security. Securities without any yield are absent.
#[must_use]
pub fn mean_dividend_yields(dataset: &SecurityDataset) -> BTreeMap<String, f64> {
    named_means(&dividend_yields(dataset))
}

/// Mean price variation per security. Securities without any variation are absent.
#[must_use]
pub fn mean_price_variations(dataset: &SecurityDataset) -> BTreeMap<String, f64> {
    named_means(&price_variations(dataset))
}

fn named_means(table: &SeriesTable) -> BTreeMap<String, f64> {
    table
        .columns()
        .iter()
        .zip(table.means())
        .filter_map(|(name, mean)| Some((name.clone(), mean?)))
        .collect()
}

#[must_use]
pub fn total_return_covariance(dataset: &SecurityDataset) -> DMatrix<f64> {
    total_returns(dataset).covariance()
}

#[must_use]
pub fn dividend_covariance(dataset: &SecurityDataset) -> DMatrix<f64> {
    dividend_yields(dataset).covariance()
}

/// Rows flagged as stable dividend payers
#[must_use]
pub fn stable_payers(dataset: &SecurityDataset) -> SecurityDataset {
    dataset.filtered(|r| r.stable_payer)
}

/// Securities with a record for every year present in the dataset
#[must_use]
pub fn complete_history(dataset: &SecurityDataset) -> Vec<String> {
    let year_count = dataset.years().len();
    dataset
        .by_security()
        .into_iter()
        .filter(|(_, history)| history.len() == year_count)
        .map(|(name, _)| name.to_string())
        .collect()
}

// ============================================================================
// Order statistics
// ============================================================================

/// Median; the mean of the two middle values for even lengths.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile with linear interpolation between closest ranks, `p` in [0, 1].
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, year: i32, price: f64, dividend: f64, yield_: f64) -> SecurityRecord {
        SecurityRecord {
            name: name.to_string(),
            sector: "AGRO".to_string(),
            year,
            closing_price: Some(price),
            price_variation: Some(0.01 * f64::from(year - 2018)),
            dividend_paid: Some(dividend),
            outstanding_shares: None,
            remaining_capital: None,
            dividend_yield: Some(yield_),
            stable_payer: name != "C",
        }
    }

    fn dataset() -> SecurityDataset {
        SecurityDataset::new(vec![
            record("A", 2019, 100.0, 5.0, 0.05),
            record("A", 2020, 110.0, 5.0, 0.06),
            record("A", 2021, 99.0, 4.0, 0.07),
            record("B", 2019, 50.0, 2.0, 0.04),
            record("B", 2020, 0.0, 2.0, 0.04),
            record("B", 2021, 60.0, 3.0, 0.05),
            record("C", 2020, 20.0, 1.0, 0.03),
        ])
        .unwrap()
    }

    #[test]
    fn test_total_return_formula() {
        let table = total_returns(&dataset());
        let a = table.column("A").unwrap();
        // 2019 has no predecessor, so the table starts in 2020
        assert_eq!(table.years(), &[2020, 2021]);
        assert!((a[0].unwrap() - 0.15).abs() < 1e-12);
        assert!((a[1].unwrap() - (99.0 - 110.0 + 4.0) / 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_previous_price_is_skipped() {
        let table = total_returns(&dataset());
        let b = table.column("B").unwrap();
        assert!((b[0].unwrap() - (0.0 - 50.0 + 2.0) / 50.0).abs() < 1e-12);
        assert_eq!(b[1], None);
    }

    #[test]
    fn test_means_skip_missing() {
        let means = mean_dividend_yields(&dataset());
        assert!((means["A"] - 0.06).abs() < 1e-12);
        assert!((means["C"] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_covariance_pairwise() {
        let table = SeriesTable::from_observations(vec![
            ("X".to_string(), 1, Some(1.0)),
            ("X".to_string(), 2, Some(2.0)),
            ("X".to_string(), 3, Some(3.0)),
            ("Y".to_string(), 1, Some(2.0)),
            ("Y".to_string(), 2, Some(4.0)),
            ("Y".to_string(), 3, None),
        ]);
        let cov = table.covariance();
        assert!((cov[(0, 0)] - 1.0).abs() < 1e-12);
        // X and Y overlap on years 1 and 2 only
        assert!((cov[(0, 1)] - 1.0).abs() < 1e-12);
        assert!((cov[(1, 1)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_covariance_is_zero() {
        let table = SeriesTable::from_observations(vec![("X".to_string(), 1, Some(1.0))]);
        assert_eq!(table.covariance()[(0, 0)], 0.0);
    }

    #[test]
    fn test_correlation_falls_back_to_identity() {
        let table = SeriesTable::from_columns(vec![
            ("flat".to_string(), vec![1.0, 1.0, 1.0]),
            ("up".to_string(), vec![1.0, 2.0, 3.0]),
            ("down".to_string(), vec![3.0, 2.0, 1.0]),
        ]);
        let corr = table.correlation();
        // columns are sorted: down, flat, up
        assert!((corr[(0, 2)] + 1.0).abs() < 1e-12);
        assert_eq!(corr[(0, 1)], 0.0);
        assert_eq!(corr[(1, 1)], 1.0);
    }

    #[test]
    fn test_pct_change() {
        let table = SeriesTable::from_columns(vec![("x".to_string(), vec![100.0, 110.0, 99.0])]);
        let changes = table.pct_change();
        let col = changes.column("x").unwrap();
        assert_eq!(col.len(), 2);
        assert!((col[0].unwrap() - 0.1).abs() < 1e-12);
        assert!((col[1].unwrap() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_dataset_covariances() {
        let ds = dataset();
        let div = dividend_covariance(&ds);
        assert_eq!(div.shape(), (3, 3));
        assert!((div[(0, 0)] - 1e-4).abs() < 1e-12);
        assert!((div[(0, 1)] - 5e-5).abs() < 1e-12);
        // C has a single observation
        assert_eq!(div[(2, 2)], 0.0);

        // C has no year-over-year return at all
        let ret = total_return_covariance(&ds);
        assert_eq!(ret.shape(), (2, 2));
        assert!(ret[(0, 0)] > 0.0);
    }

    #[test]
    fn test_stable_and_complete_filters() {
        let ds = dataset();
        assert_eq!(stable_payers(&ds).names(), vec!["A", "B"]);
        assert_eq!(complete_history(&ds), vec!["A", "B"]);
    }

    #[test]
    fn test_median_and_percentile() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(percentile(&[0.0, 10.0], 0.5), 5.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 1.0), 3.0);
    }
}
