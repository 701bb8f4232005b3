//! Command-line front end for the finagri simulation core
//!
//! Loads YAML run files and CSV datasets, memoizes optimizer results across
//! runs, and writes JSON/CSV reports into the data directory.

pub mod cache;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
pub mod util;

#[cfg(test)]
mod test_support;

pub use cache::OptimizationCache;
pub use config::{ConfigError, RunFile, load_run_file};
pub use logging::init_logging;
