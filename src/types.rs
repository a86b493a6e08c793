//! Domain records shared across the engine.
//!
//! Everything here is plain data: callers build these from their own storage or
//! request payloads, and the engine never mutates them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lower bound of the Saaty fundamental scale (1/9).
pub const SAATY_MIN: f64 = 1.0 / 9.0;
/// Upper bound of the Saaty fundamental scale.
pub const SAATY_MAX: f64 = 9.0;

/// A decision criterion, referenced everywhere else by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Criterion {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// A candidate (location) being ranked.
///
/// `scores` holds direct per-criterion ratings keyed by criterion id. They are only
/// read for criteria that are evaluated in raw-score mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

impl Alternative {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scores: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, criterion_id: impl Into<String>, score: f64) -> Self {
        self.scores.insert(criterion_id.into(), score);
        self
    }
}

/// One-sided judgment: `item_a` is `value` times as important as `item_b`.
///
/// The reciprocal `(item_b, item_a)` entry is derived, never supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub item_a: String,
    pub item_b: String,
    pub value: f64,
}

impl Comparison {
    pub fn new(item_a: impl Into<String>, item_b: impl Into<String>, value: f64) -> Self {
        Self {
            item_a: item_a.into(),
            item_b: item_b.into(),
            value,
        }
    }
}

/// True when `value` lies on the closed 1/9..9 Saaty scale.
pub fn on_saaty_scale(value: f64) -> bool {
    // 1/9 is not exactly representable; allow the rounding slack of a typed "0.111".
    (SAATY_MIN - 1e-3..=SAATY_MAX).contains(&value)
}
