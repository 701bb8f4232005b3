//! Financing planner
//!
//! Turns a [`FinancingMode`] into a [`CapitalPlan`]: the lump sum invested at
//! year 0, the capital injected in later years, and one amortization table
//! per loan.

use std::collections::BTreeMap;

use crate::error::ConfigurationError;
use crate::model::{AmortizationRow, CapitalPlan, FinancingMode, Loan};

const MONTHS_PER_YEAR: u32 = 12;

impl FinancingMode {
    /// Build a mode from its label, as given on a command line.
    ///
    /// `amount` is the lump sum for `single_contribution` and the monthly
    /// amount for `recurring_contribution`; loan modes use `loans`.
    pub fn from_label(
        label: &str,
        amount: f64,
        loans: Vec<Loan>,
    ) -> Result<Self, ConfigurationError> {
        match label {
            "single_contribution" => Ok(FinancingMode::SingleContribution { amount }),
            "recurring_contribution" => Ok(FinancingMode::RecurringContribution {
                monthly_amount: amount,
            }),
            "single_loan" => match loans.as_slice() {
                [loan] => Ok(FinancingMode::SingleLoan { loan: *loan }),
                _ => Err(ConfigurationError::InvalidLoan(format!(
                    "single_loan expects exactly one loan, got {}",
                    loans.len()
                ))),
            },
            "multiple_loans" => Ok(FinancingMode::MultipleLoans { loans }),
            other => Err(ConfigurationError::UnknownFinancingMode(other.to_string())),
        }
    }
}

/// Yearly annuity of a fixed-rate loan. Zero-rate loans repay linearly.
#[must_use]
pub fn annuity(principal: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let n = f64::from(periods);
    if rate == 0.0 {
        principal / n
    } else {
        principal * rate / (1.0 - (1.0 + rate).powf(-n))
    }
}

/// Monthly instalment of a loan repaid over `years` at `annual_rate`.
#[must_use]
pub fn monthly_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    if principal <= 0.0 {
        return 0.0;
    }
    annuity(
        principal,
        annual_rate / f64::from(MONTHS_PER_YEAR),
        years.saturating_mul(MONTHS_PER_YEAR),
    )
}

fn check_loan(loan: &Loan) -> Result<(), ConfigurationError> {
    if loan.duration_years == 0 {
        return Err(ConfigurationError::InvalidLoan(
            "duration must be at least one year".into(),
        ));
    }
    if !loan.principal.is_finite() || loan.principal < 0.0 {
        return Err(ConfigurationError::InvalidLoan(format!(
            "principal must be non-negative, got {}",
            loan.principal
        )));
    }
    if !loan.annual_rate.is_finite() || loan.annual_rate < 0.0 {
        return Err(ConfigurationError::InvalidLoan(format!(
            "rate must be non-negative, got {}",
            loan.annual_rate
        )));
    }
    Ok(())
}

/// Yearly amortization table with exactly `duration_years` rows.
///
/// The final row retires whatever principal remains so the table closes at
/// zero regardless of rounding.
pub fn amortization_schedule(loan: &Loan) -> Result<Vec<AmortizationRow>, ConfigurationError> {
    check_loan(loan)?;

    let payment = annuity(loan.principal, loan.annual_rate, loan.duration_years);
    let mut remaining = loan.principal;
    let mut rows = Vec::with_capacity(loan.duration_years as usize);

    for i in 0..loan.duration_years {
        let interest = remaining * loan.annual_rate;
        let last = i + 1 == loan.duration_years;
        let principal = if last { remaining } else { payment - interest };
        remaining = if last { 0.0 } else { remaining - principal };
        rows.push(AmortizationRow {
            year: loan.start_year + i,
            annuity: interest + principal,
            interest,
            principal,
            remaining_principal: remaining,
        });
    }

    Ok(rows)
}

/// A loan must start inside the horizon and be repaid by its end.
pub fn validate_loan(loan: &Loan, horizon_years: u32) -> Result<(), ConfigurationError> {
    check_loan(loan)?;
    let ends_late = loan
        .start_year
        .checked_add(loan.duration_years)
        .is_none_or(|end| end > horizon_years);
    if loan.start_year >= horizon_years || ends_late {
        return Err(ConfigurationError::LoanExceedsHorizon {
            start_year: loan.start_year,
            duration_years: loan.duration_years,
            horizon_years,
        });
    }
    Ok(())
}

/// Normalize a financing mode into a capital plan over `horizon_years`.
///
/// Zero amounts schedule nothing, so an empty financing yields zero initial
/// capital and no injections.
pub fn plan_capital(
    mode: &FinancingMode,
    horizon_years: u32,
) -> Result<CapitalPlan, ConfigurationError> {
    let plan = match mode {
        FinancingMode::SingleContribution { amount } => {
            check_amount("amount", *amount)?;
            CapitalPlan {
                initial_capital: *amount,
                ..CapitalPlan::default()
            }
        }
        FinancingMode::RecurringContribution { monthly_amount } => {
            check_amount("monthly_amount", *monthly_amount)?;
            let yearly = monthly_amount * f64::from(MONTHS_PER_YEAR);
            let injections = if yearly > 0.0 {
                (0..horizon_years).map(|year| (year, yearly)).collect()
            } else {
                BTreeMap::new()
            };
            CapitalPlan {
                initial_capital: 0.0,
                injections,
                amortization: Vec::new(),
            }
        }
        FinancingMode::SingleLoan { loan } => plan_loans(std::slice::from_ref(loan), horizon_years)?,
        FinancingMode::MultipleLoans { loans } => plan_loans(loans, horizon_years)?,
    };

    tracing::debug!(
        mode = mode.label(),
        initial = plan.initial_capital,
        injections = plan.injections.len(),
        "capital plan prepared"
    );
    Ok(plan)
}

fn plan_loans(loans: &[Loan], horizon_years: u32) -> Result<CapitalPlan, ConfigurationError> {
    let mut plan = CapitalPlan::default();
    for loan in loans {
        validate_loan(loan, horizon_years)?;
        plan.amortization.push(amortization_schedule(loan)?);
        if loan.principal == 0.0 {
            continue;
        }
        if loan.start_year == 0 {
            plan.initial_capital += loan.principal;
        } else {
            *plan.injections.entry(loan.start_year).or_insert(0.0) += loan.principal;
        }
    }
    Ok(plan)
}

fn check_amount(name: &'static str, amount: f64) -> Result<(), ConfigurationError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter {
            name,
            reason: format!("must be a non-negative amount, got {amount}"),
        })
    }
}
