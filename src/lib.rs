#![forbid(unsafe_code)]

//! # ahp-engine
//!
//! Analytic Hierarchy Process scoring for multi-criteria decisions.
//!
//! Decision makers compare criteria two at a time ("cost matters 3× more than
//! foot traffic"), and the same for candidates under each criterion. Each set of
//! judgments becomes a reciprocal pairwise matrix; the solver turns it into a
//! priority vector with a consistency ratio that flags contradictory judgments;
//! the aggregator folds criterion weights and per-criterion scores into one
//! ranked list.
//!
//! The computation is pure and synchronous. Persistence, auth and presentation
//! are left to callers.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod matrix;
pub mod random_index;
pub mod report;
pub mod solver;
pub mod types;
pub mod workbook;

pub use aggregate::{
    aggregate, CriterionScores, DimensionMismatchError, EvaluationResult, RankedAlternative,
    WeightingMode,
};
pub use config::{load_config_from_path, EngineConfig, ZeroWeightPolicy};
pub use error::{AhpError, ErrorKind};
pub use evaluation::{run_evaluation, run_evaluation_with, EvaluationRequest, EvaluationResponse};
pub use matrix::{build_matrix, PairwiseMatrix, ShapeError};
pub use solver::{solve, solve_with, ConsistencyReport, PriorityVector, SolveError};
pub use types::{Alternative, Comparison, Criterion};
