//! Crate-level error umbrella.

use serde::Serialize;
use thiserror::Error;

use crate::aggregate::DimensionMismatchError;
use crate::config::ConfigError;
use crate::matrix::ShapeError;
use crate::solver::SolveError;
use crate::workbook::WorkbookError;

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete comparison input, non-square or non-reciprocal matrix.
    Shape,
    /// Solver called on a degenerate matrix.
    Dimension,
    /// Aggregation inputs disagree on the criterion or alternative set.
    DimensionMismatch,
    /// Division by zero in the consistency computation.
    Numeric,
    /// Unreadable workbook or config file.
    Input,
}

#[derive(Debug, Error)]
pub enum AhpError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatchError),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Failure while processing one named matrix (the criteria matrix or one criterion's).
    #[error("{subject}: {source}")]
    Subject {
        subject: String,
        #[source]
        source: Box<AhpError>,
    },
}

impl AhpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AhpError::Shape(_) => ErrorKind::Shape,
            AhpError::Solve(e) if e.is_numeric() => ErrorKind::Numeric,
            AhpError::Solve(_) => ErrorKind::Dimension,
            AhpError::DimensionMismatch(_) => ErrorKind::DimensionMismatch,
            AhpError::Workbook(e) if e.is_io() => ErrorKind::Input,
            AhpError::Workbook(_) => ErrorKind::Shape,
            AhpError::Config(_) => ErrorKind::Input,
            AhpError::Subject { source, .. } => source.kind(),
        }
    }

    /// Attach the name of the matrix being processed.
    pub fn within(self, subject: impl Into<String>) -> Self {
        AhpError::Subject {
            subject: subject.into(),
            source: Box::new(self),
        }
    }
}
