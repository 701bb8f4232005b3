use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use finagri::cache::CACHE_FILE;
use finagri::commands::{self, Market};
use finagri::{OptimizationCache, RunFile, init_logging, load_run_file};
use finagri_core::{FinancingMode, Loan, OptimizationStrategy, SimulationProgress};

#[derive(Parser, Debug)]
#[command(name = "finagri")]
#[command(about = "Dividend portfolio and agricultural project simulator")]
struct Cli {
    /// Path to the data directory (default: ~/.finagri/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Common {
    /// YAML run file
    #[arg(short, long)]
    run: PathBuf,

    /// Output directory (default: <data-dir>/results/<command>)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a dividend basket
    Optimize {
        #[command(flatten)]
        common: Common,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Optimize then project the basket over the horizon
    Equity {
        #[command(flatten)]
        common: Common,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// single_contribution, recurring_contribution, single_loan or multiple_loans
        #[arg(long)]
        financing: Option<String>,
        /// Lump sum, or monthly amount for recurring contributions
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
        /// principal:annual_rate:duration_years:start_year (repeatable)
        #[arg(long = "loan", value_parser = parse_loan)]
        loans: Vec<Loan>,
        #[arg(long)]
        paths: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Simulate a farm project over many scenarios
    Agri {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        scenarios: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run every `batch` entry of the run file
    Batch {
        #[command(flatten)]
        common: Common,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Stochastic,
    Convex,
    Hybrid,
}

impl From<StrategyArg> for OptimizationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Stochastic => OptimizationStrategy::Stochastic,
            StrategyArg::Convex => OptimizationStrategy::Convex,
            StrategyArg::Hybrid => OptimizationStrategy::Hybrid,
        }
    }
}

fn parse_loan(raw: &str) -> Result<Loan, String> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [principal, rate, years, start] = parts.as_slice() else {
        return Err(format!(
            "expected principal:annual_rate:duration_years:start_year, got `{raw}`"
        ));
    };
    let number = |field: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|e| format!("invalid {field} `{value}`: {e}"))
    };
    let whole = |field: &str, value: &str| {
        value
            .parse::<u32>()
            .map_err(|e| format!("invalid {field} `{value}`: {e}"))
    };
    Ok(Loan {
        principal: number("principal", principal)?,
        annual_rate: number("annual_rate", rate)?,
        duration_years: whole("duration_years", years)?,
        start_year: whole("start_year", start)?,
    })
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".finagri")
}

/// Run `job` while a side thread prints its completion fraction to stderr.
fn with_progress<T>(
    label: &str,
    job: impl FnOnce(&SimulationProgress) -> color_eyre::Result<T>,
) -> color_eyre::Result<T> {
    let progress = SimulationProgress::new();
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                eprint!("\r{label}: {:>3.0}%", progress.fraction() * 100.0);
                std::thread::sleep(Duration::from_millis(200));
            }
            eprintln!("\r{label}: done");
        });
        let result = job(&progress);
        done.store(true, Ordering::Relaxed);
        result
    })
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    init_logging(&data_dir, &cli.log_level)?;

    let cache_path = data_dir.join(CACHE_FILE);
    let mut cache = OptimizationCache::load(&cache_path);
    let results = data_dir.join("results");
    let out_dir = |common: &Common, name: &str| {
        common.out.clone().unwrap_or_else(|| results.join(name))
    };

    match cli.command {
        Command::Optimize { common, strategy } => {
            let mut run = load_run_file(&common.run)?;
            if let Some(strategy) = strategy {
                run.optimizer.strategy = strategy.into();
            }
            let market = Market::load(&run)?;
            let out = out_dir(&common, "optimize");
            let portfolio = commands::optimize(&market, &mut cache, &run.optimizer, &out)?;

            let stats = portfolio.stats();
            println!(
                "{} securities via {:?}: dividend yield {:.2}%, expected return {:.2}%, volatility {:.2}%, sharpe {:.3}",
                portfolio.len(),
                portfolio.produced_by(),
                stats.dividend_yield * 100.0,
                stats.expected_return * 100.0,
                stats.volatility * 100.0,
                stats.sharpe_ratio
            );
            for holding in portfolio.holdings() {
                println!("  {:<12} {:<14} {:>6.2}%", holding.name, holding.sector, holding.weight * 100.0);
            }
            println!("written to {}", out.display());
        }
        Command::Equity {
            common,
            strategy,
            financing,
            amount,
            loans,
            paths,
            seed,
        } => {
            let mut run = load_run_file(&common.run)?;
            if let Some(strategy) = strategy {
                run.optimizer.strategy = strategy.into();
            }
            if let Some(paths) = paths {
                run.equity.paths = paths;
            }
            if let Some(seed) = seed {
                run.equity.seed = seed;
            }
            let financing = match financing {
                Some(label) => FinancingMode::from_label(&label, amount, loans)?,
                None => run
                    .financing
                    .clone()
                    .ok_or(finagri::ConfigError::Missing("financing"))?,
            };
            let market = Market::load(&run)?;
            let out = out_dir(&common, "equity");

            let outcome = with_progress("equity paths", |progress| {
                commands::equity(
                    &market,
                    &mut cache,
                    &run.optimizer,
                    &financing,
                    &run.equity,
                    Some(progress),
                    &out,
                )
            })?;

            let summary = &outcome.result.summary;
            println!(
                "{} over {} years: median final capital {:.0}, median cumulative dividends {:.0}",
                financing.label(),
                outcome.result.years.len(),
                summary.median_final_capital,
                summary.median_cumulative_dividends
            );
            for (percentile, capital) in &summary.final_capital_percentiles {
                println!("  p{:<3.0} {:>16.0}", percentile * 100.0, capital);
            }
            println!("written to {}", out.display());
        }
        Command::Agri {
            common,
            scenarios,
            seed,
        } => {
            let run = load_run_file(&common.run)?;
            let mut section = run.agriculture()?.clone();
            if let Some(scenarios) = scenarios {
                section.simulation.scenarios = scenarios;
            }
            if let Some(seed) = seed {
                section.simulation.seed = seed;
            }
            let out = out_dir(&common, "agri");

            let result = with_progress("scenarios", |progress| {
                commands::agriculture(&section, Some(progress), &out)
            })?;

            let reps = &result.representatives;
            for (label, table) in [
                ("minimum", &reps.minimum),
                ("median", &reps.median),
                ("maximum", &reps.maximum),
            ] {
                println!(
                    "{label:<8} scenario {:>5}: total net profit {:.0}",
                    table.scenario, table.total_net_profit
                );
            }
            println!("written to {}", out.display());
        }
        Command::Batch { common } => {
            let run: RunFile = load_run_file(&common.run)?;
            let market = Market::load(&run)?;
            let out = out_dir(&common, "batch");

            let summaries = commands::batch(&run, &market, &mut cache, &out)?;
            for s in &summaries {
                println!(
                    "{:<16} {:<22} {:>16.0} {:>16.0}",
                    s.name, s.financing, s.median_final_capital, s.median_cumulative_dividends
                );
            }
            println!(
                "optimizer cache: {} hits, {} misses; written to {}",
                cache.hits(),
                cache.misses(),
                out.display()
            );
        }
    }

    cache.save(&cache_path)?;
    tracing::info!("finagri finished");
    Ok(())
}
