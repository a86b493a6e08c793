//! Pairwise comparison matrix construction and shape validation.
//!
//! Two entry points:
//! - `PairwiseMatrix::from_comparisons`: one comparison per unordered pair, the
//!   reciprocal half and the unit diagonal are derived.
//! - `PairwiseMatrix::from_dense`: a full matrix (e.g. a spreadsheet sheet). It must
//!   already be reciprocal within tolerance; it is never symmetrized on the caller's behalf.

use std::collections::{HashMap, HashSet};

use nalgebra::DMatrix;
use thiserror::Error;
use tracing::warn;

use crate::config::DEFAULT_RECIPROCAL_TOLERANCE;
use crate::types::{on_saaty_scale, Comparison};

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("duplicate item id: {item_id}")]
    DuplicateItemId { item_id: String },
    #[error("{items} items need {expected} comparisons, got {got}")]
    ComparisonCount {
        items: usize,
        expected: usize,
        got: usize,
    },
    #[error("comparison references unknown item: {item_id}")]
    UnknownItem { item_id: String },
    #[error("item {item_id} compared with itself")]
    SelfComparison { item_id: String },
    #[error("pair ({item_a}, {item_b}) compared more than once")]
    DuplicatePair { item_a: String, item_b: String },
    #[error("comparison value for ({item_a}, {item_b}) must be finite and > 0, got {value}")]
    NonPositiveValue {
        item_a: String,
        item_b: String,
        value: f64,
    },
    #[error("weight for {item_id} must be finite and >= 0, got {value}")]
    InvalidWeight { item_id: String, value: f64 },
    #[error("priority weights must sum to 1, got {sum}")]
    NotNormalized { sum: f64 },
    #[error("{labels} item labels for {rows} rows")]
    LabelCount { labels: usize, rows: usize },
    #[error("row {row} has {got} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("diagonal entry for {item_id} must be 1, got {value}")]
    DiagonalNotOne { item_id: String, value: f64 },
    #[error("entries ({item_a}, {item_b}) = {value} and ({item_b}, {item_a}) = {reverse} are not reciprocal")]
    NotReciprocal {
        item_a: String,
        item_b: String,
        value: f64,
        reverse: f64,
    },
}

/// Positive reciprocal n×n matrix with row/column labels.
///
/// Rows and columns share one ordering, given by `item_ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix {
    item_ids: Vec<String>,
    values: DMatrix<f64>,
}

fn index_items(item_ids: &[String]) -> Result<HashMap<&str, usize>, ShapeError> {
    let mut index = HashMap::with_capacity(item_ids.len());
    for (idx, id) in item_ids.iter().enumerate() {
        if index.insert(id.as_str(), idx).is_some() {
            return Err(ShapeError::DuplicateItemId {
                item_id: id.clone(),
            });
        }
    }
    Ok(index)
}

fn check_value(item_a: &str, item_b: &str, value: f64) -> Result<(), ShapeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ShapeError::NonPositiveValue {
            item_a: item_a.to_string(),
            item_b: item_b.to_string(),
            value,
        });
    }
    if !on_saaty_scale(value) {
        warn!(item_a, item_b, value, "comparison value outside the 1/9..9 scale");
    }
    Ok(())
}

impl PairwiseMatrix {
    /// Build from exactly one comparison per unordered pair of `item_ids`.
    pub fn from_comparisons(
        comparisons: &[Comparison],
        item_ids: &[String],
    ) -> Result<Self, ShapeError> {
        let index = index_items(item_ids)?;
        let n = item_ids.len();
        let expected = n * n.saturating_sub(1) / 2;
        if comparisons.len() != expected {
            return Err(ShapeError::ComparisonCount {
                items: n,
                expected,
                got: comparisons.len(),
            });
        }

        let mut values = DMatrix::<f64>::identity(n, n);
        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(expected);
        for cmp in comparisons {
            let i = *index
                .get(cmp.item_a.as_str())
                .ok_or_else(|| ShapeError::UnknownItem {
                    item_id: cmp.item_a.clone(),
                })?;
            let j = *index
                .get(cmp.item_b.as_str())
                .ok_or_else(|| ShapeError::UnknownItem {
                    item_id: cmp.item_b.clone(),
                })?;
            if i == j {
                return Err(ShapeError::SelfComparison {
                    item_id: cmp.item_a.clone(),
                });
            }
            if !seen.insert((i.min(j), i.max(j))) {
                return Err(ShapeError::DuplicatePair {
                    item_a: cmp.item_a.clone(),
                    item_b: cmp.item_b.clone(),
                });
            }
            check_value(&cmp.item_a, &cmp.item_b, cmp.value)?;
            values[(i, j)] = cmp.value;
            values[(j, i)] = 1.0 / cmp.value;
        }

        Ok(Self {
            item_ids: item_ids.to_vec(),
            values,
        })
    }

    /// Build from a dense row-major matrix using the default reciprocity tolerance.
    pub fn from_dense(item_ids: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, ShapeError> {
        Self::from_dense_with_tolerance(item_ids, rows, DEFAULT_RECIPROCAL_TOLERANCE)
    }

    /// Build from a dense row-major matrix.
    ///
    /// Values are kept verbatim. `tolerance` bounds `|M[i][j] * M[j][i] - 1|` and
    /// `|M[i][i] - 1|`.
    pub fn from_dense_with_tolerance(
        item_ids: Vec<String>,
        rows: &[Vec<f64>],
        tolerance: f64,
    ) -> Result<Self, ShapeError> {
        index_items(&item_ids)?;
        let n = rows.len();
        if item_ids.len() != n {
            return Err(ShapeError::LabelCount {
                labels: item_ids.len(),
                rows: n,
            });
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ShapeError::NotSquare {
                    row: row_idx,
                    expected: n,
                    got: row.len(),
                });
            }
        }

        let mut values = DMatrix::<f64>::zeros(n, n);
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                check_value(&item_ids[i], &item_ids[j], value)?;
                values[(i, j)] = value;
            }
        }

        for i in 0..n {
            let diag = values[(i, i)];
            if (diag - 1.0).abs() > tolerance {
                return Err(ShapeError::DiagonalNotOne {
                    item_id: item_ids[i].clone(),
                    value: diag,
                });
            }
            for j in (i + 1)..n {
                let (value, reverse) = (values[(i, j)], values[(j, i)]);
                if (value * reverse - 1.0).abs() > tolerance {
                    return Err(ShapeError::NotReciprocal {
                        item_a: item_ids[i].clone(),
                        item_b: item_ids[j].clone(),
                        value,
                        reverse,
                    });
                }
            }
        }

        Ok(Self { item_ids, values })
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.len() && col < self.len()).then(|| self.values[(row, col)])
    }

    pub fn index_of(&self, item_id: &str) -> Option<usize> {
        self.item_ids.iter().position(|id| id == item_id)
    }

    /// Row-major copy, for serialization and display.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        matrix_rows(&self.values)
    }
}

pub(crate) fn matrix_rows(values: &DMatrix<f64>) -> Vec<Vec<f64>> {
    (0..values.nrows())
        .map(|r| (0..values.ncols()).map(|c| values[(r, c)]).collect())
        .collect()
}

/// Build a matrix from one-sided comparisons over `item_ids`.
pub fn build_matrix(
    comparisons: &[Comparison],
    item_ids: &[String],
) -> Result<PairwiseMatrix, ShapeError> {
    PairwiseMatrix::from_comparisons(comparisons, item_ids)
}
