//! Securities dataset reader
//!
//! Reads the yearly securities table from CSV. Headers follow the exchange
//! export format; dividend yields arrive in percentage points and are
//! converted to fractions here.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::error::DataError;
use crate::model::{SecurityDataset, SecurityRecord, parse_stable_flag};

/// Column headers that must be present in the dataset
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Nom_Entreprise",
    "Secteur",
    "Annee",
    "Prix_Cloture_Annuel",
    "Variation(annee_precedente)",
    "Dividende_Verse",
    "Nombre_Actions_restant",
    "Capital_restant",
    "Rendement_Dividende",
    "Payeur_Stable",
];

/// Raw CSV row matching the export columns
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Nom_Entreprise")]
    name: String,
    #[serde(rename = "Secteur")]
    sector: String,
    #[serde(rename = "Annee")]
    year: i32,
    #[serde(rename = "Prix_Cloture_Annuel")]
    closing_price: Option<f64>,
    #[serde(rename = "Variation(annee_precedente)")]
    price_variation: Option<f64>,
    #[serde(rename = "Dividende_Verse")]
    dividend_paid: Option<f64>,
    #[serde(rename = "Nombre_Actions_restant")]
    outstanding_shares: Option<f64>,
    #[serde(rename = "Capital_restant")]
    remaining_capital: Option<f64>,
    #[serde(rename = "Rendement_Dividende")]
    dividend_yield_pct: Option<f64>,
    #[serde(rename = "Payeur_Stable", default)]
    stable_payer: String,
}

impl CsvRow {
    fn into_record(self) -> SecurityRecord {
        SecurityRecord {
            name: self.name.trim().to_uppercase(),
            sector: self.sector.trim().to_string(),
            year: self.year,
            closing_price: self.closing_price,
            price_variation: self.price_variation,
            dividend_paid: self.dividend_paid,
            outstanding_shares: self.outstanding_shares,
            remaining_capital: self.remaining_capital,
            dividend_yield: self.dividend_yield_pct.map(|pct| pct / 100.0),
            stable_payer: parse_stable_flag(&self.stable_payer),
        }
    }
}

/// Read a securities dataset from any CSV source.
pub fn read_securities<R: Read>(source: R) -> Result<SecurityDataset, DataError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        records.push(row.into_record());
    }
    tracing::debug!(rows = records.len(), "securities dataset read");

    SecurityDataset::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Nom_Entreprise,Secteur,Annee,Prix_Cloture_Annuel,Variation(annee_precedente),Dividende_Verse,Nombre_Actions_restant,Capital_restant,Rendement_Dividende,Payeur_Stable";

    #[test]
    fn test_reads_and_converts() {
        let csv = format!(
            "{HEADER}\nsonatel,Telecom,2021,15000,0.05,1200,100000,1e9,8.0,Oui\nsonatel,Telecom,2022,16000,,1300,100000,1e9,8.125,non\n"
        );
        let ds = read_securities(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.name, "SONATEL");
        assert!((first.dividend_yield.unwrap() - 0.08).abs() < 1e-12);
        assert!(first.stable_payer);
        assert_eq!(ds.records()[1].price_variation, None);
        assert!(!ds.records()[1].stable_payer);
    }

    #[test]
    fn test_missing_columns_reported() {
        let csv = "Nom_Entreprise,Secteur,Annee\nA,B,2020\n";
        match read_securities(csv.as_bytes()).unwrap_err() {
            DataError::MissingColumns(cols) => {
                assert!(cols.contains(&"Payeur_Stable".to_string()));
                assert!(cols.contains(&"Rendement_Dividende".to_string()));
                assert_eq!(cols.len(), 7);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_year() {
        let csv = format!("{HEADER}\nA,B,twenty,1,0,1,1,1,1,oui\n");
        assert!(matches!(
            read_securities(csv.as_bytes()).unwrap_err(),
            DataError::Malformed { .. }
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = format!("{HEADER}\n");
        assert_eq!(read_securities(csv.as_bytes()).unwrap_err(), DataError::Empty);
    }
}
