//! Saaty random consistency index (RI).
//!
//! `saaty_random_index` is the reference table used for CR. `simulate_random_index`
//! re-derives RI empirically under this crate's solver, for matrix sizes the table
//! does not cover or for comparing against it.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::solver::{consistency_report, priority_weights};

/// RI for n = 1..=15. Larger matrices use the last entry.
pub const SAATY_RANDOM_INDEX: [f64; 15] = [
    0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

pub fn saaty_random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n if n <= SAATY_RANDOM_INDEX.len() => SAATY_RANDOM_INDEX[n - 1],
        _ => SAATY_RANDOM_INDEX[SAATY_RANDOM_INDEX.len() - 1],
    }
}

/// The 17 judgments of the fundamental scale: 1/9..1/2, 1, 2..9.
fn saaty_judgment(rng: &mut StdRng) -> f64 {
    let k: i32 = rng.gen_range(-8..=8);
    match k.cmp(&0) {
        std::cmp::Ordering::Less => 1.0 / f64::from(1 - k),
        std::cmp::Ordering::Equal => 1.0,
        std::cmp::Ordering::Greater => f64::from(k + 1),
    }
}

fn random_reciprocal_matrix(n: usize, rng: &mut StdRng) -> DMatrix<f64> {
    let mut m = DMatrix::<f64>::identity(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let v = saaty_judgment(rng);
            m[(i, j)] = v;
            m[(j, i)] = 1.0 / v;
        }
    }
    m
}

/// Empirical RI estimate for one matrix size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomIndexEstimate {
    pub n: usize,
    pub samples: usize,
    pub mean_consistency_index: f64,
    pub table_value: f64,
}

/// Mean CI of `samples` random reciprocal matrices of size `n`, seeded for reproducibility.
pub fn simulate_random_index(n: usize, samples: usize, seed: u64) -> RandomIndexEstimate {
    let table_value = saaty_random_index(n);
    if n <= 2 || samples == 0 {
        return RandomIndexEstimate {
            n,
            samples,
            mean_consistency_index: 0.0,
            table_value,
        };
    }

    let cfg = EngineConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut total = 0.0;
    let mut used = 0usize;
    for _ in 0..samples {
        let m = random_reciprocal_matrix(n, &mut rng);
        let (weights, _, _) = priority_weights(&m);
        if let Ok(report) = consistency_report(&m, &weights, &cfg) {
            total += report.consistency_index;
            used += 1;
        }
    }

    RandomIndexEstimate {
        n,
        samples: used,
        mean_consistency_index: if used > 0 { total / used as f64 } else { 0.0 },
        table_value,
    }
}
