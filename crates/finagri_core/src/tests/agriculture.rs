//! Tests for the agricultural project simulator
//!
//! These tests verify that:
//! - Representative scenarios bracket every scenario total
//! - Tax is zero on exempt farms and never negative elsewhere
//! - Loan repayments add up to the yearly annuity
//! - Observed weather scales yields without touching the random stream
//! - Identical seeds reproduce identical tables

use std::collections::BTreeMap;

use super::catalog;
use crate::agriculture::{AgriFinancing, AgriculturalConfig, simulate_agricultural_project};
use crate::error::{DataError, SimulationError};
use crate::financing::monthly_payment;
use crate::model::{CropHistory, CultivationMethod, SimulationProgress, WeatherObservation};

fn config(total_surface: f64) -> AgriculturalConfig {
    AgriculturalConfig {
        total_surface,
        duration_years: 4,
        greenhouse_share: 0.25,
        crops: vec!["tomato".into(), "cabbage".into(), "lettuce".into()],
        scenarios: 60,
        ..Default::default()
    }
}

#[test]
fn test_representatives_bracket_all_scenarios() {
    let result = simulate_agricultural_project(&catalog(), &config(8.0), &[], None, None).unwrap();
    assert_eq!(result.num_scenarios(), 60);

    let reps = &result.representatives;
    for total in &result.scenario_totals {
        assert!(reps.minimum.total_net_profit <= *total);
        assert!(reps.maximum.total_net_profit >= *total);
    }
    assert!(reps.minimum.total_net_profit <= reps.median.total_net_profit);
    assert!(reps.median.total_net_profit <= reps.maximum.total_net_profit);

    // tables are internally consistent
    for table in [&reps.minimum, &reps.median, &reps.maximum] {
        let sum: f64 = table.records.iter().map(|r| r.net_profit).sum();
        assert!((sum - table.total_net_profit).abs() < 1e-6 * sum.abs().max(1.0));
        assert!(table.records.iter().all(|r| r.scenario == table.scenario));
        assert_eq!(
            result.scenario_totals[table.scenario - 1],
            table.total_net_profit
        );
    }
}

#[test]
fn test_record_layout() {
    let result = simulate_agricultural_project(&catalog(), &config(8.0), &[], None, None).unwrap();
    // greenhouse: tomato 3 + lettuce 4 cycles; open field: tomato 2 + cabbage 2
    let per_year = 3 + 4 + 2 + 2;
    assert_eq!(result.scenario_records(1).count(), 4 * per_year);
    assert_eq!(result.records.len(), 60 * 4 * per_year);

    let first_year: Vec<_> = result.scenario_records(1).take(per_year).collect();
    assert!(first_year.iter().all(|r| r.year == 1));
    assert_eq!(first_year[0].method, CultivationMethod::Greenhouse);
    assert_eq!(first_year[0].crop, "tomato");
    assert_eq!(first_year[0].cycle, 1);
    // 2 ha of greenhouse split between tomato and lettuce
    assert!((first_year[0].surface - 1.0).abs() < 1e-12);
    let open_tomato = first_year
        .iter()
        .find(|r| r.method == CultivationMethod::OpenField && r.crop == "tomato")
        .unwrap();
    assert!((open_tomato.surface - 3.0).abs() < 1e-12);
}

#[test]
fn test_tax_invariant() {
    let exempt = simulate_agricultural_project(&catalog(), &config(8.0), &[], None, None).unwrap();
    assert!(exempt.records.iter().all(|r| r.tax == 0.0));

    let small = simulate_agricultural_project(&catalog(), &config(2.0), &[], None, None).unwrap();
    for r in &small.records {
        let gross = r.net_profit + r.tax;
        assert!(r.tax >= 0.0);
        assert!((r.tax - 0.15 * gross.max(0.0)).abs() < 1e-6 * gross.abs().max(1.0));
    }
    assert!(small.records.iter().any(|r| r.tax > 0.0));
}

#[test]
fn test_identical_seed_identical_tables() {
    let a = simulate_agricultural_project(&catalog(), &config(8.0), &[], None, None).unwrap();
    let b = simulate_agricultural_project(&catalog(), &config(8.0), &[], None, None).unwrap();
    assert_eq!(a, b);

    let reseeded = AgriculturalConfig {
        seed: 1,
        ..config(8.0)
    };
    let c = simulate_agricultural_project(&catalog(), &reseeded, &[], None, None).unwrap();
    assert_ne!(a.scenario_totals, c.scenario_totals);
}

#[test]
fn test_loan_repayment_matches_annuity() {
    let financed = AgriculturalConfig {
        financing: AgriFinancing::Loan {
            amount: 20_000_000.0,
            annual_rate: 0.02,
        },
        scenarios: 2,
        ..config(8.0)
    };
    let result = simulate_agricultural_project(&catalog(), &financed, &[], None, None).unwrap();
    let yearly = 12.0 * monthly_payment(20_000_000.0, 0.02, 4);

    for year in 1..=4 {
        let repaid: f64 = result
            .scenario_records(1)
            .filter(|r| r.year == year)
            .map(|r| r.loan_repayment)
            .sum();
        assert!((repaid - yearly).abs() < 1e-6 * yearly, "year {year}: {repaid} vs {yearly}");
    }

    // same random stream, so profits drop by exactly the repayment on an exempt farm
    let unfinanced = AgriculturalConfig {
        scenarios: 2,
        ..config(8.0)
    };
    let base = simulate_agricultural_project(&catalog(), &unfinanced, &[], None, None).unwrap();
    let drop = base.scenario_totals[0] - result.scenario_totals[0];
    assert!((drop - 4.0 * yearly).abs() < 1e-6 * drop.abs());
}

#[test]
fn test_loan_repayment_without_greenhouse_crop() {
    // no crop can use the greenhouse quarter, so open field carries the whole loan
    let financed = AgriculturalConfig {
        crops: vec!["cabbage".into()],
        financing: AgriFinancing::Loan {
            amount: 1_000_000.0,
            annual_rate: 0.05,
        },
        scenarios: 2,
        ..config(8.0)
    };
    let result = simulate_agricultural_project(&catalog(), &financed, &[], None, None).unwrap();
    let yearly = 12.0 * monthly_payment(1_000_000.0, 0.05, 4);

    let records: Vec<_> = result.scenario_records(1).filter(|r| r.year == 1).collect();
    assert!(records.iter().all(|r| r.method == CultivationMethod::OpenField));
    let repaid: f64 = records.iter().map(|r| r.loan_repayment).sum();
    assert!((repaid - yearly).abs() < 1e-6 * yearly, "{repaid} vs {yearly}");
}

#[test]
fn test_weather_scales_first_year_production() {
    let dry_hot = [WeatherObservation {
        rainfall: Some(700.0),
        temperature: Some(33.0),
    }];
    let config = AgriculturalConfig {
        scenarios: 3,
        ..config(8.0)
    };
    let plain = simulate_agricultural_project(&catalog(), &config, &[], None, None).unwrap();
    let stressed = simulate_agricultural_project(&catalog(), &config, &dry_hot, None, None).unwrap();
    let catalog = catalog();

    for (p, s) in plain.records.iter().zip(&stressed.records) {
        let sensitivity = catalog
            .get(&p.crop)
            .unwrap()
            .method(p.method)
            .unwrap()
            .climate_sensitivity;
        let factor = if p.year == 1 {
            (1.0 - 0.3 * sensitivity) * (1.0 - 0.15 * sensitivity)
        } else {
            1.0
        };
        assert!(
            (s.production_kg - factor * p.production_kg).abs() < 1e-6 * p.production_kg.max(1.0),
            "year {} {} {}: {} vs {}",
            p.year,
            p.method,
            p.crop,
            s.production_kg,
            p.production_kg
        );
        assert_eq!(s.price, p.price);
    }
}

#[test]
fn test_correlated_history_is_accepted() {
    let series = |base: f64| vec![base, base * 1.1, base * 0.95, base * 1.2, base * 1.15];
    let history = CropHistory {
        rainfall: BTreeMap::from([
            ("tomato".to_string(), series(1100.0)),
            ("cabbage".to_string(), vec![900.0, 950.0, 1000.0, 870.0, 990.0]),
            ("lettuce".to_string(), series(1000.0)),
        ]),
        prices: BTreeMap::new(),
    };
    let result =
        simulate_agricultural_project(&catalog(), &config(8.0), &[], Some(&history), None).unwrap();
    assert_eq!(result.num_scenarios(), 60);
}

#[test]
fn test_partial_history_is_rejected() {
    let history = CropHistory {
        rainfall: BTreeMap::new(),
        prices: BTreeMap::from([("tomato".to_string(), vec![200.0, 220.0, 210.0])]),
    };
    let err = simulate_agricultural_project(&catalog(), &config(8.0), &[], Some(&history), None)
        .unwrap_err();
    assert_eq!(err, SimulationError::Data(DataError::MissingSeries("cabbage".into())));
}

#[test]
fn test_unknown_crop_and_zero_scenarios() {
    let unknown = AgriculturalConfig {
        crops: vec!["okra".into()],
        ..config(8.0)
    };
    assert_eq!(
        simulate_agricultural_project(&catalog(), &unknown, &[], None, None).unwrap_err(),
        SimulationError::Data(DataError::UnknownCrop("okra".into()))
    );

    let empty = AgriculturalConfig {
        scenarios: 0,
        ..config(8.0)
    };
    assert!(matches!(
        simulate_agricultural_project(&catalog(), &empty, &[], None, None),
        Err(SimulationError::Configuration(_))
    ));
}

#[test]
fn test_cancellation() {
    let progress = SimulationProgress::new();
    progress.cancel();
    let err =
        simulate_agricultural_project(&catalog(), &config(8.0), &[], None, Some(&progress)).unwrap_err();
    assert_eq!(err, SimulationError::Cancelled);
}
