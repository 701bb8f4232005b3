//! Scenario tests for the finagri simulation core
//!
//! Tests are organized by topic:
//! - `optimizer` - Basket construction and the fallback chain
//! - `financing` - Capital plans and amortization tables
//! - `equity` - Wealth projection of an optimized basket
//! - `agriculture` - Farm project scenarios
//!
//! Shared fixtures live in this module.

mod agriculture;

use crate::model::{
    CropCatalog, CropEntry, MethodParameters, RiskEvent, SecurityDataset, SecurityRecord,
};

pub(crate) fn record(
    name: &str,
    sector: &str,
    year: i32,
    price: f64,
    variation: f64,
    dividend_yield: f64,
) -> SecurityRecord {
    SecurityRecord {
        name: name.to_string(),
        sector: sector.to_string(),
        year,
        closing_price: Some(price),
        price_variation: Some(variation),
        dividend_paid: Some(price * dividend_yield),
        outstanding_shares: Some(1_000_000.0),
        remaining_capital: Some(0.5),
        dividend_yield: Some(dividend_yield),
        stable_payer: true,
    }
}

/// Eight listed securities over 2019-2023 with distinct yields and
/// price paths across three sectors.
pub(crate) fn market() -> SecurityDataset {
    let securities = [
        ("SNTS", "TELECOM", 0.065),
        ("ORAC", "TELECOM", 0.072),
        ("SGBC", "BANK", 0.081),
        ("ETIT", "BANK", 0.030),
        ("SOGC", "AGRI", 0.058),
        ("PALC", "AGRI", 0.049),
        ("SIVC", "AGRI", 0.012),
        ("BOAB", "BANK", 0.090),
    ];
    let mut records = Vec::new();
    for (k, (name, sector, base_yield)) in securities.iter().enumerate() {
        let mut price = 1_000.0 * (k as f64 + 1.0);
        for (t, year) in (2019..=2023).enumerate() {
            let variation = 0.02 * ((t * (k + 1)) % 4) as f64 - 0.025;
            price *= 1.0 + variation;
            let dividend_yield = base_yield + 0.002 * (t % 2) as f64;
            records.push(record(name, sector, year, price, variation, dividend_yield));
        }
    }
    SecurityDataset::new(records).unwrap()
}

/// Three crops: tomato in both methods, cabbage open field only, lettuce
/// greenhouse only.
pub(crate) fn catalog() -> CropCatalog {
    let params = |crop_yield: f64, price: f64, sensitivity: f64, cycles: u32| MethodParameters {
        crop_yield,
        price,
        input_cost: 300_000.0,
        labor_cost: 200_000.0,
        sigma: 0.15,
        yield_risk: RiskEvent {
            probability: 0.1,
            impact: 0.2,
        },
        price_risk: RiskEvent {
            probability: 0.1,
            impact: 0.15,
        },
        climate_sensitivity: sensitivity,
        cycles_per_year: cycles,
    };

    let mut catalog = CropCatalog::default();
    catalog.insert(
        "tomato",
        CropEntry {
            open_field: Some(params(25.0, 250.0, 0.6, 2)),
            greenhouse: Some(params(60.0, 300.0, 0.2, 3)),
        },
    );
    catalog.insert(
        "cabbage",
        CropEntry {
            open_field: Some(params(30.0, 150.0, 0.5, 2)),
            greenhouse: None,
        },
    );
    catalog.insert(
        "lettuce",
        CropEntry {
            open_field: None,
            greenhouse: Some(params(20.0, 400.0, 0.3, 4)),
        },
    );
    catalog
}
