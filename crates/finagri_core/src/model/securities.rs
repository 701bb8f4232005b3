//! Historical securities dataset
//!
//! One record per (security, year). Dividend yields are stored as fractions;
//! readers are responsible for converting the percentage points found in
//! source files.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A single yearly observation for one listed security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub name: String,
    pub sector: String,
    pub year: i32,
    pub closing_price: Option<f64>,
    /// Price variation against the prior year, as a fraction
    pub price_variation: Option<f64>,
    pub dividend_paid: Option<f64>,
    pub outstanding_shares: Option<f64>,
    pub remaining_capital: Option<f64>,
    /// Dividend yield as a fraction (0.05 = 5%)
    pub dividend_yield: Option<f64>,
    pub stable_payer: bool,
}

/// Validated collection of security records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityDataset {
    records: Vec<SecurityRecord>,
}

impl SecurityDataset {
    /// Build a dataset, rejecting empty input and duplicate (security, year) rows.
    pub fn new(records: Vec<SecurityRecord>) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::Empty);
        }

        let mut seen = FxHashSet::default();
        for record in &records {
            if !seen.insert((record.name.as_str(), record.year)) {
                return Err(DataError::DuplicateRecord {
                    name: record.name.clone(),
                    year: record.year,
                });
            }
        }

        let mut records = records;
        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.year.cmp(&b.year)));
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[SecurityRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct security names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.records.iter().map(|r| r.name.as_str()).collect();
        names.into_iter().map(str::to_owned).collect()
    }

    /// Distinct years in ascending order
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        years.into_iter().collect()
    }

    #[must_use]
    pub fn last_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Sector of a security, taken from its earliest record
    #[must_use]
    pub fn sector_of(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.sector.as_str())
    }

    /// Records of one security ordered by year
    pub fn history<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SecurityRecord> {
        self.records.iter().filter(move |r| r.name == name)
    }

    /// Records grouped per security, each group ordered by year
    #[must_use]
    pub fn by_security(&self) -> BTreeMap<&str, Vec<&SecurityRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&SecurityRecord>> = BTreeMap::new();
        for record in &self.records {
            grouped.entry(record.name.as_str()).or_default().push(record);
        }
        grouped
    }

    /// Keep only records matching `keep`. The result may be empty.
    #[must_use]
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&SecurityRecord) -> bool,
    {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Keep only the listed securities
    #[must_use]
    pub fn restricted_to(&self, names: &[String]) -> Self {
        let wanted: FxHashSet<&str> = names.iter().map(String::as_str).collect();
        self.filtered(|r| wanted.contains(r.name.as_str()))
    }
}

/// Interpret the string-valued stable-payer flag. Only "true" and "oui" count.
#[must_use]
pub fn parse_stable_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "oui")
}
