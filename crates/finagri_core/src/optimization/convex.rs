//! Mixed-integer convex search
//!
//! Maximizes `c'w - λ·sqrt(w'Σw)` with `c = pond·div + (1 - pond)·total`
//! subject to
//!
//! - `Σ w = 1`, `w ≥ 0`
//! - `min_weight·z ≤ w ≤ max_weight·z` with `z ∈ {0, 1}` per asset
//! - `div'w ≥ min_dividend_yield`
//! - `Σ z ≥ min_securities`
//!
//! Branch-and-bound runs over the selection indicators. Each node fixes some
//! assets in or out; its continuous relaxation (`0 ≤ w ≤ max_weight` for
//! unfixed assets) is solved by projected gradient ascent and bounds the
//! subtree. Projection onto the feasible polytope alternates between the
//! box-and-budget set and the dividend halfspace (Dykstra).

use nalgebra::{DMatrix, DVector};

use crate::error::OptimizationError;

use super::config::OptimizerConfig;
use super::result::{Allocation, StrategyOutcome};
use super::universe::Universe;

/// Ridge added to the covariance inside the objective
const COVARIANCE_RIDGE: f64 = 1e-6;
const MAX_NODES: usize = 20_000;
const MAX_ASCENT_STEPS: usize = 500;
const MAX_BACKTRACKS: usize = 40;
const MAX_STEP: f64 = 1e6;
const DYKSTRA_ROUNDS: usize = 300;
const BISECTION_ROUNDS: usize = 100;
/// Weights below this are treated as unselected
const ZERO_TOL: f64 = 1e-7;
const FEASIBILITY_TOL: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Free,
    In,
    Out,
}

/// Concave objective of the relaxation
struct Objective {
    coefficients: DVector<f64>,
    covariance: DMatrix<f64>,
    aversion: f64,
}

impl Objective {
    fn new(universe: &Universe, config: &OptimizerConfig) -> Self {
        let n = universe.len();
        let pond = config.dividend_weight;
        let coefficients = DVector::from_iterator(
            n,
            universe
                .dividend_yields
                .iter()
                .zip(&universe.total_returns)
                .map(|(d, t)| pond * d + (1.0 - pond) * t),
        );
        let covariance = &universe.covariance + DMatrix::identity(n, n) * COVARIANCE_RIDGE;
        Self {
            coefficients,
            covariance,
            aversion: config.risk_aversion,
        }
    }

    fn value(&self, w: &DVector<f64>) -> f64 {
        let variance = w.dot(&(&self.covariance * w)).max(0.0);
        self.coefficients.dot(w) - self.aversion * variance.sqrt()
    }

    fn gradient(&self, w: &DVector<f64>) -> DVector<f64> {
        if self.aversion == 0.0 {
            return self.coefficients.clone();
        }
        let sigma_w = &self.covariance * w;
        let vol = w.dot(&sigma_w).max(0.0).sqrt();
        if vol <= 0.0 {
            return self.coefficients.clone();
        }
        &self.coefficients - sigma_w * (self.aversion / vol)
    }
}

/// Feasible set of one node's relaxation
struct Polytope<'a> {
    lower: DVector<f64>,
    upper: DVector<f64>,
    dividends: &'a DVector<f64>,
    min_dividend: f64,
}

impl Polytope<'_> {
    /// Cheap emptiness test: the budget must fit the box, and the best
    /// dividend reachable inside box ∩ budget must meet the floor.
    fn is_empty(&self) -> bool {
        let low: f64 = self.lower.sum();
        let high: f64 = self.upper.sum();
        if low > 1.0 + FEASIBILITY_TOL || high < 1.0 - FEASIBILITY_TOL {
            return true;
        }

        let mut order: Vec<usize> = (0..self.lower.len()).collect();
        order.sort_by(|&a, &b| self.dividends[b].total_cmp(&self.dividends[a]));
        let mut remaining = 1.0 - low;
        let mut best = self.dividends.dot(&self.lower);
        for i in order {
            if remaining <= 0.0 {
                break;
            }
            let room = (self.upper[i] - self.lower[i]).min(remaining);
            best += room * self.dividends[i];
            remaining -= room;
        }
        best < self.min_dividend - FEASIBILITY_TOL
    }

    /// Euclidean projection onto `{lower ≤ w ≤ upper, Σ w = 1}`.
    /// Finds the shift `τ` with `Σ clamp(y - τ) = 1` by bisection.
    fn project_budget(&self, y: &DVector<f64>) -> DVector<f64> {
        let shifted = |tau: f64| {
            DVector::from_fn(y.len(), |i, _| {
                (y[i] - tau).clamp(self.lower[i], self.upper[i])
            })
        };
        let mut lo = (y - &self.upper).min() - 1.0;
        let mut hi = (y - &self.lower).max() + 1.0;
        for _ in 0..BISECTION_ROUNDS {
            let mid = 0.5 * (lo + hi);
            if shifted(mid).sum() > 1.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        shifted(0.5 * (lo + hi))
    }

    fn project_dividend(&self, y: &DVector<f64>) -> DVector<f64> {
        let gap = self.min_dividend - self.dividends.dot(y);
        let norm_sq = self.dividends.norm_squared();
        if gap <= 0.0 || norm_sq == 0.0 {
            y.clone()
        } else {
            y + self.dividends * (gap / norm_sq)
        }
    }

    /// Dykstra's alternating projection onto the intersection
    fn project(&self, y: &DVector<f64>) -> DVector<f64> {
        let n = y.len();
        let mut x = y.clone();
        let mut p = DVector::zeros(n);
        let mut q = DVector::zeros(n);
        let mut out = self.project_budget(&x);
        for _ in 0..DYKSTRA_ROUNDS {
            let a = self.project_budget(&(&x + &p));
            p = &x + &p - &a;
            let b = self.project_dividend(&(&a + &q));
            q = &a + &q - &b;
            let moved = (&b - &x).norm();
            x = b;
            out = a;
            if moved < 1e-12 {
                break;
            }
        }
        if self.contains(&x) { x } else { out }
    }

    fn contains(&self, w: &DVector<f64>) -> bool {
        (w.sum() - 1.0).abs() <= FEASIBILITY_TOL
            && (0..w.len()).all(|i| {
                w[i] >= self.lower[i] - FEASIBILITY_TOL && w[i] <= self.upper[i] + FEASIBILITY_TOL
            })
            && self.dividends.dot(w) >= self.min_dividend - FEASIBILITY_TOL
    }
}

/// Maximize the objective over the polytope; `None` if no feasible point
/// was reached.
fn solve_relaxation(objective: &Objective, polytope: &Polytope<'_>) -> Option<(DVector<f64>, f64)> {
    let start = (&polytope.lower + &polytope.upper) * 0.5;
    let mut x = polytope.project(&start);
    if !polytope.contains(&x) {
        return None;
    }
    let mut fx = objective.value(&x);
    let mut step = 1.0;

    for _ in 0..MAX_ASCENT_STEPS {
        let g = objective.gradient(&x);
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let y = polytope.project(&(&x + &g * step));
            let fy = objective.value(&y);
            if polytope.contains(&y) && fy >= fx + 1e-4 * g.dot(&(&y - &x)) {
                accepted = Some((y, fy));
                break;
            }
            step *= 0.5;
        }
        let Some((y, fy)) = accepted else { break };
        let moved = (&y - &x).norm();
        x = y;
        fx = fy;
        if moved < 1e-10 {
            break;
        }
        step = (step * 2.0).min(MAX_STEP);
    }

    Some((x, fx))
}

struct Search<'a> {
    objective: Objective,
    dividends: DVector<f64>,
    config: &'a OptimizerConfig,
    incumbent: Option<(DVector<f64>, f64)>,
    nodes: usize,
}

impl Search<'_> {
    fn polytope(&self, selection: &[Selection]) -> Polytope<'_> {
        let bounds = |s: &Selection| match s {
            Selection::Free => (0.0, self.config.max_weight),
            Selection::In => (self.config.min_weight, self.config.max_weight),
            Selection::Out => (0.0, 0.0),
        };
        Polytope {
            lower: DVector::from_iterator(selection.len(), selection.iter().map(|s| bounds(s).0)),
            upper: DVector::from_iterator(selection.len(), selection.iter().map(|s| bounds(s).1)),
            dividends: &self.dividends,
            min_dividend: self.config.min_dividend_yield,
        }
    }

    fn is_selected(&self, w: f64) -> bool {
        w >= self.config.min_weight - FEASIBILITY_TOL
    }

    /// Free asset to branch on, or `None` when the relaxed point already
    /// satisfies every indicator constraint.
    fn branching_index(&self, selection: &[Selection], w: &DVector<f64>) -> Option<usize> {
        let fractional = selection
            .iter()
            .enumerate()
            .filter(|(i, s)| **s == Selection::Free && w[*i] > ZERO_TOL && !self.is_selected(w[*i]))
            .max_by(|(a, _), (b, _)| {
                let dist = |i: usize| w[i].min(self.config.min_weight - w[i]);
                dist(*a).total_cmp(&dist(*b))
            })
            .map(|(i, _)| i);
        if fractional.is_some() {
            return fractional;
        }

        let selected = (0..w.len()).filter(|&i| self.is_selected(w[i])).count();
        if selected >= self.config.min_securities {
            return None;
        }
        // Integral but too few picks: force in the best unselected free asset
        selection
            .iter()
            .enumerate()
            .filter(|(i, s)| **s == Selection::Free && !self.is_selected(w[*i]))
            .max_by(|(a, _), (b, _)| {
                self.objective.coefficients[*a].total_cmp(&self.objective.coefficients[*b])
            })
            .map(|(i, _)| i)
    }

    fn explore(&mut self, root: Vec<Selection>) -> Result<(), OptimizationError> {
        let mut stack = vec![root];
        while let Some(selection) = stack.pop() {
            self.nodes += 1;
            if self.nodes > MAX_NODES {
                return Err(OptimizationError::SolverFailed(format!(
                    "node limit of {MAX_NODES} reached"
                )));
            }

            let open = selection.iter().filter(|s| **s != Selection::Out).count();
            if open < self.config.min_securities {
                continue;
            }
            let polytope = self.polytope(&selection);
            if polytope.is_empty() {
                continue;
            }
            let Some((w, bound)) = solve_relaxation(&self.objective, &polytope) else {
                continue;
            };
            if let Some((_, best)) = &self.incumbent
                && bound <= *best + 1e-12
            {
                continue;
            }

            match self.branching_index(&selection, &w) {
                None => self.incumbent = Some((w, bound)),
                Some(i) => {
                    let mut out = selection.clone();
                    out[i] = Selection::Out;
                    let mut inside = selection;
                    inside[i] = Selection::In;
                    // The side closer to the relaxed weight is explored first
                    if w[i] >= 0.5 * self.config.min_weight {
                        stack.push(out);
                        stack.push(inside);
                    } else {
                        stack.push(inside);
                        stack.push(out);
                    }
                }
            }
        }
        Ok(())
    }
}

pub fn convex_search(universe: &Universe, config: &OptimizerConfig) -> StrategyOutcome {
    let n = universe.len();
    if n < config.min_securities {
        return StrategyOutcome::Infeasible(OptimizationError::Infeasible(format!(
            "{n} candidates for a basket of at least {}",
            config.min_securities
        )));
    }

    let mut search = Search {
        objective: Objective::new(universe, config),
        dividends: DVector::from_column_slice(&universe.dividend_yields),
        config,
        incumbent: None,
        nodes: 0,
    };
    let explored = search.explore(vec![Selection::Free; n]);
    tracing::debug!(nodes = search.nodes, "branch and bound finished");

    match (search.incumbent, explored) {
        (Some((w, score)), _) => {
            let weights = w
                .iter()
                .map(|v| if *v < ZERO_TOL { 0.0 } else { v.max(0.0) })
                .collect();
            StrategyOutcome::Success(Allocation { weights, score })
        }
        (None, Err(e)) => StrategyOutcome::Infeasible(e),
        (None, Ok(())) => StrategyOutcome::Infeasible(OptimizationError::Infeasible(
            "no basket satisfies the weight, dividend and cardinality constraints".into(),
        )),
    }
}
