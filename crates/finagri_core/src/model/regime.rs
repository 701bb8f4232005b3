use rand::Rng;
use serde::{Deserialize, Serialize};

/// Macro state driving the equity return distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    #[default]
    Favorable,
    Unfavorable,
    Crisis,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Favorable, Regime::Unfavorable, Regime::Crisis];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Regime::Favorable => 0,
            Regime::Unfavorable => 1,
            Regime::Crisis => 2,
        }
    }
}

/// Row-stochastic Markov transition matrix over the three regimes.
/// Row = current regime, column = next regime, in `Regime::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix(pub [[f64; 3]; 3]);

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self([
            [0.75, 0.20, 0.05],
            [0.25, 0.55, 0.20],
            [0.10, 0.20, 0.70],
        ])
    }
}

impl TransitionMatrix {
    /// Every row must be non-negative and sum to one.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|row| {
            row.iter().all(|p| p.is_finite() && *p >= 0.0)
                && (row.iter().sum::<f64>() - 1.0).abs() < 1e-9
        })
    }

    /// Draw the next regime conditioned on `current`.
    pub fn next<R: Rng + ?Sized>(&self, current: Regime, rng: &mut R) -> Regime {
        let row = &self.0[current.index()];
        let u: f64 = rng.random();
        let mut cumulative = 0.0;
        for (regime, p) in Regime::ALL.iter().zip(row) {
            cumulative += p;
            if u < cumulative {
                return *regime;
            }
        }
        // Rounding left u above the last cumulative sum
        Regime::ALL[2]
    }

    /// Long-run regime frequencies, by power iteration.
    #[must_use]
    pub fn stationary(&self) -> [f64; 3] {
        let mut dist = [1.0 / 3.0; 3];
        for _ in 0..500 {
            let mut next = [0.0; 3];
            for (from, p_from) in dist.iter().enumerate() {
                for (to, slot) in next.iter_mut().enumerate() {
                    *slot += p_from * self.0[from][to];
                }
            }
            dist = next;
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_default_matrix_is_valid() {
        assert!(TransitionMatrix::default().is_valid());
        let mut bad = TransitionMatrix::default();
        bad.0[1][1] = 0.9;
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_absorbing_row() {
        let matrix = TransitionMatrix([[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(matrix.next(Regime::Favorable, &mut rng), Regime::Crisis);
        }
    }

    #[test]
    fn test_empirical_frequencies_match_stationary() {
        let matrix = TransitionMatrix::default();
        let stationary = matrix.stationary();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut counts = [0usize; 3];
        let mut regime = Regime::Favorable;
        let steps = 200_000;
        for _ in 0..steps {
            regime = matrix.next(regime, &mut rng);
            counts[regime.index()] += 1;
        }
        for i in 0..3 {
            let freq = counts[i] as f64 / steps as f64;
            assert!(
                (freq - stationary[i]).abs() < 0.01,
                "regime {i}: empirical {freq:.4} vs stationary {:.4}",
                stationary[i]
            );
        }
    }
}
