//! Criterion benchmarks for finagri_core
//!
//! Run with: cargo bench -p finagri_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use finagri_core::agriculture::{AgriculturalConfig, simulate_agricultural_project};
use finagri_core::equity::{EquitySimulationConfig, simulate_equity};
use finagri_core::financing::plan_capital;
use finagri_core::model::{
    CropCatalog, CropEntry, FinancingMode, MethodParameters, OptimizationStrategy, RiskEvent,
    SecurityDataset, SecurityRecord,
};
use finagri_core::optimization::{OptimizerConfig, optimize_portfolio};

fn create_market(securities: usize, years: i32) -> SecurityDataset {
    let sectors = ["AGRI", "BANK", "TELECOM", "DISTRIBUTION"];
    let mut records = Vec::new();
    for k in 0..securities {
        let base_yield = 0.03 + 0.005 * (k % 10) as f64;
        let mut price = 1_000.0 + 250.0 * k as f64;
        for t in 0..years {
            let variation = 0.015 * ((t as usize * (k + 1)) % 5) as f64 - 0.03;
            price *= 1.0 + variation;
            records.push(SecurityRecord {
                name: format!("SEC{k:02}"),
                sector: sectors[k % sectors.len()].to_string(),
                year: 2010 + t,
                closing_price: Some(price),
                price_variation: Some(variation),
                dividend_paid: Some(price * base_yield),
                outstanding_shares: Some(1_000_000.0),
                remaining_capital: None,
                dividend_yield: Some(base_yield),
                stable_payer: true,
            });
        }
    }
    SecurityDataset::new(records).unwrap()
}

fn create_catalog() -> CropCatalog {
    let params = |crop_yield: f64, price: f64, cycles: u32| MethodParameters {
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
            impact: 0.1,
        },
        climate_sensitivity: 0.5,
        cycles_per_year: cycles,
    };
    let mut catalog = CropCatalog::default();
    catalog.insert(
        "tomato",
        CropEntry {
            open_field: Some(params(25.0, 250.0, 2)),
            greenhouse: Some(params(60.0, 300.0, 3)),
        },
    );
    catalog.insert(
        "onion",
        CropEntry {
            open_field: Some(params(30.0, 200.0, 1)),
            greenhouse: None,
        },
    );
    catalog
}

fn bench_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer");
    let market = create_market(20, 10);

    for strategy in [
        OptimizationStrategy::Stochastic,
        OptimizationStrategy::Convex,
        OptimizationStrategy::Hybrid,
    ] {
        let config = OptimizerConfig {
            strategy,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("strategy", format!("{strategy:?}")),
            &config,
            |b, config| b.iter(|| optimize_portfolio(black_box(&market), black_box(config))),
        );
    }

    group.finish();
}

fn bench_equity(c: &mut Criterion) {
    let mut group = c.benchmark_group("equity");
    let market = create_market(20, 10);
    let portfolio = optimize_portfolio(&market, &OptimizerConfig::default()).unwrap();
    let plan = plan_capital(&FinancingMode::SingleContribution { amount: 1e7 }, 15).unwrap();

    for paths in [100, 500, 1000].iter() {
        let config = EquitySimulationConfig {
            horizon_years: 15,
            paths: *paths,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("paths", paths), paths, |b, _| {
            b.iter(|| {
                simulate_equity(
                    black_box(&market),
                    black_box(&portfolio),
                    black_box(&plan),
                    black_box(&config),
                    None,
                )
            })
        });
    }

    group.finish();
}

fn bench_agriculture(c: &mut Criterion) {
    let mut group = c.benchmark_group("agriculture");
    let catalog = create_catalog();

    for scenarios in [50, 200].iter() {
        let config = AgriculturalConfig {
            crops: vec!["tomato".into(), "onion".into()],
            duration_years: 10,
            scenarios: *scenarios,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("scenarios", scenarios),
            scenarios,
            |b, _| {
                b.iter(|| {
                    simulate_agricultural_project(
                        black_box(&catalog),
                        black_box(&config),
                        &[],
                        None,
                        None,
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_optimizer, bench_equity, bench_agriculture);
criterion_main!(benches);
