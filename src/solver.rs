//! Priority vector and consistency solver.
//!
//! Uses the normalized-column average approximation rather than power iteration on
//! the principal eigenvector, so numbers line up with results produced by the
//! lightweight AHP method:
//!
//! 1. column sums `S[j] = Σ_i M[i][j]`
//! 2. normalized matrix `N[i][j] = M[i][j] / S[j]`
//! 3. priorities `w[i] = mean_j N[i][j]`
//! 4. weighted sums `Ws[i] = Σ_j M[i][j] * w[j]`
//! 5. `λmax = mean_i Ws[i] / w[i]`, `CI = (λmax - n) / (n - 1)`, `CR = CI / RI[n]`
//!
//! All sums accumulate left to right in index order, so results are reproducible
//! bit for bit for the same input.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{EngineConfig, ZeroWeightPolicy};
use crate::matrix::{matrix_rows, PairwiseMatrix, ShapeError};
use crate::random_index::saaty_random_index;

/// Weights that sum to 1 within this slack are treated as normalized.
const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("cannot solve an empty matrix")]
    Empty,
    #[error("matrix is {rows}x{cols}, expected square")]
    NotSquare { rows: usize, cols: usize },
    #[error("weight vector has {got} entries for a {expected}x{expected} matrix")]
    WeightLength { expected: usize, got: usize },
    #[error("priority weight for row {row} must be finite and >= 0, got {value}")]
    InvalidWeight { row: usize, value: f64 },
    #[error("priority weight for row {row} is zero; its eigenvalue ratio is undefined")]
    ZeroWeight { row: usize },
    #[error("every priority weight is zero; lambda_max is undefined")]
    NoUsableRows,
}

impl SolveError {
    /// True for division-by-zero style failures, false for degenerate dimensions.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SolveError::InvalidWeight { .. } | SolveError::ZeroWeight { .. } | SolveError::NoUsableRows
        )
    }
}

/// Non-negative weights aligned index-for-index with `item_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriorityVectorRepr")]
pub struct PriorityVector {
    item_ids: Vec<String>,
    weights: Vec<f64>,
}

#[derive(Deserialize)]
struct PriorityVectorRepr {
    item_ids: Vec<String>,
    weights: Vec<f64>,
}

impl TryFrom<PriorityVectorRepr> for PriorityVector {
    type Error = ShapeError;

    fn try_from(repr: PriorityVectorRepr) -> Result<Self, Self::Error> {
        PriorityVector::new(repr.item_ids, repr.weights)
    }
}

impl PriorityVector {
    /// Caller-supplied weights. Must be finite, non-negative and, unless empty, sum to 1.
    /// Unnormalized ratings belong in `CriterionScores::RawScores`.
    pub fn new(item_ids: Vec<String>, weights: Vec<f64>) -> Result<Self, ShapeError> {
        if item_ids.len() != weights.len() {
            return Err(ShapeError::LabelCount {
                labels: item_ids.len(),
                rows: weights.len(),
            });
        }
        for (idx, id) in item_ids.iter().enumerate() {
            if item_ids[..idx].contains(id) {
                return Err(ShapeError::DuplicateItemId {
                    item_id: id.clone(),
                });
            }
        }
        for (id, &w) in item_ids.iter().zip(&weights) {
            if !w.is_finite() || w < 0.0 {
                return Err(ShapeError::InvalidWeight {
                    item_id: id.clone(),
                    value: w,
                });
            }
        }
        let pv = Self { item_ids, weights };
        let sum = pv.sum();
        if !pv.is_empty() && (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ShapeError::NotNormalized { sum });
        }
        Ok(pv)
    }

    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, ShapeError> {
        let (item_ids, weights) = pairs.into_iter().map(|(id, w)| (id.into(), w)).unzip();
        Self::new(item_ids, weights)
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<f64> {
        self.item_ids
            .iter()
            .position(|id| id == item_id)
            .map(|idx| self.weights[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.item_ids
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        let mut total = 0.0;
        for w in &self.weights {
            total += w;
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub lambda_max: f64,
    /// `(λmax - n) / (n - 1)`; 0 for n <= 2.
    pub consistency_index: f64,
    /// `CI / RI[n]`; 0 for n <= 2.
    pub consistency_ratio: f64,
    pub random_index: f64,
    pub is_consistent: bool,
    /// Rows left out of the λmax average because their weight was zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rows: Vec<usize>,
}

/// Full solver output, including the intermediate matrices shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveDetails {
    pub priorities: PriorityVector,
    pub consistency: ConsistencyReport,
    pub normalized_matrix: Vec<Vec<f64>>,
    pub column_sums: Vec<f64>,
    pub weighted_sums: Vec<f64>,
}

/// Steps 1-3: column sums, normalized matrix, row averages.
///
/// Expects a square matrix; a zero column sum leaves that column at zero.
pub(crate) fn priority_weights(values: &DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>, Vec<f64>) {
    let n = values.nrows();
    let mut column_sums = vec![0.0; n];
    for (j, sum) in column_sums.iter_mut().enumerate() {
        for i in 0..n {
            *sum += values[(i, j)];
        }
    }

    let mut normalized = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        if column_sums[j] > 0.0 {
            for i in 0..n {
                normalized[(i, j)] = values[(i, j)] / column_sums[j];
            }
        }
    }

    let mut weights = vec![0.0; n];
    for (i, w) in weights.iter_mut().enumerate() {
        let mut row_sum = 0.0;
        for j in 0..n {
            row_sum += normalized[(i, j)];
        }
        *w = row_sum / n as f64;
    }

    (weights, normalized, column_sums)
}

fn consistency_parts(
    values: &DMatrix<f64>,
    weights: &[f64],
    cfg: &EngineConfig,
) -> Result<(ConsistencyReport, Vec<f64>), SolveError> {
    let n = values.nrows();
    if n == 0 {
        return Err(SolveError::Empty);
    }
    if values.ncols() != n {
        return Err(SolveError::NotSquare {
            rows: n,
            cols: values.ncols(),
        });
    }
    if weights.len() != n {
        return Err(SolveError::WeightLength {
            expected: n,
            got: weights.len(),
        });
    }
    for (row, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(SolveError::InvalidWeight { row, value });
        }
    }

    let mut weighted_sums = vec![0.0; n];
    for (i, ws) in weighted_sums.iter_mut().enumerate() {
        for (j, w) in weights.iter().enumerate() {
            *ws += values[(i, j)] * w;
        }
    }

    let mut ratio_sum = 0.0;
    let mut used = 0usize;
    let mut skipped_rows = Vec::new();
    for i in 0..n {
        if weights[i] == 0.0 {
            match cfg.zero_weight_policy {
                ZeroWeightPolicy::SkipRow => {
                    skipped_rows.push(i);
                    continue;
                }
                ZeroWeightPolicy::Fail => return Err(SolveError::ZeroWeight { row: i }),
            }
        }
        ratio_sum += weighted_sums[i] / weights[i];
        used += 1;
    }
    if used == 0 {
        return Err(SolveError::NoUsableRows);
    }

    let lambda_max = ratio_sum / used as f64;
    let random_index = saaty_random_index(n);
    let (consistency_index, consistency_ratio, is_consistent) = if n <= 2 {
        (0.0, 0.0, true)
    } else {
        let ci = (lambda_max - n as f64) / (n as f64 - 1.0);
        let cr = ci / random_index;
        (ci, cr, cr < cfg.consistency_threshold)
    };

    Ok((
        ConsistencyReport {
            lambda_max,
            consistency_index,
            consistency_ratio,
            random_index,
            is_consistent,
            skipped_rows,
        },
        weighted_sums,
    ))
}

/// Consistency metrics for `values` under the given priority `weights`.
pub fn consistency_report(
    values: &DMatrix<f64>,
    weights: &[f64],
    cfg: &EngineConfig,
) -> Result<ConsistencyReport, SolveError> {
    consistency_parts(values, weights, cfg).map(|(report, _)| report)
}

/// Solve with the full intermediate breakdown.
pub fn solve_with(matrix: &PairwiseMatrix, cfg: &EngineConfig) -> Result<SolveDetails, SolveError> {
    let values = matrix.values();
    if values.nrows() == 0 {
        return Err(SolveError::Empty);
    }
    if values.nrows() != values.ncols() {
        return Err(SolveError::NotSquare {
            rows: values.nrows(),
            cols: values.ncols(),
        });
    }

    let (weights, normalized, column_sums) = priority_weights(values);
    let (consistency, weighted_sums) = consistency_parts(values, &weights, cfg)?;

    debug!(
        n = matrix.len(),
        lambda_max = consistency.lambda_max,
        consistency_ratio = consistency.consistency_ratio,
        is_consistent = consistency.is_consistent,
        "solved pairwise matrix"
    );

    Ok(SolveDetails {
        priorities: PriorityVector {
            item_ids: matrix.item_ids().to_vec(),
            weights,
        },
        consistency,
        normalized_matrix: matrix_rows(&normalized),
        column_sums,
        weighted_sums,
    })
}

/// Priority vector and consistency report under the default configuration.
pub fn solve(matrix: &PairwiseMatrix) -> Result<(PriorityVector, ConsistencyReport), SolveError> {
    let details = solve_with(matrix, &EngineConfig::default())?;
    Ok((details.priorities, details.consistency))
}
