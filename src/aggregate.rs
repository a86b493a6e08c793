//! Weighted aggregation of per-criterion scores into a final ranking.
//!
//! Two weighting modes, chosen per criterion:
//! - `Priorities`: the criterion's alternative priority vector from a pairwise solve.
//!   Totals stay in [0, 1] when every criterion uses this mode.
//! - `RawScores`: direct ratings (e.g. 1-10) used as-is. The engine does not rescale
//!   them, so totals carry whatever scale the caller chose.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::solver::PriorityVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeScore {
    pub alternative_id: String,
    pub score: f64,
}

/// Scores of every alternative under one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CriterionScores {
    Priorities { priorities: PriorityVector },
    RawScores { scores: Vec<AlternativeScore> },
}

impl CriterionScores {
    pub fn priorities(priorities: PriorityVector) -> Self {
        Self::Priorities { priorities }
    }

    pub fn raw<S: Into<String>>(scores: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self::RawScores {
            scores: scores
                .into_iter()
                .map(|(alternative_id, score)| AlternativeScore {
                    alternative_id: alternative_id.into(),
                    score,
                })
                .collect(),
        }
    }

    fn entries(&self) -> Vec<(&str, f64)> {
        match self {
            Self::Priorities { priorities } => priorities.iter().collect(),
            Self::RawScores { scores } => scores
                .iter()
                .map(|s| (s.alternative_id.as_str(), s.score))
                .collect(),
        }
    }

    fn is_raw(&self) -> bool {
        matches!(self, Self::RawScores { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    Priority,
    RawScore,
    Mixed,
}

#[derive(Debug, Error, PartialEq)]
pub enum DimensionMismatchError {
    #[error("criteria weight vector is empty")]
    NoCriteria,
    #[error("no per-criterion scores for weighted criterion {criterion_id}")]
    MissingCriterion { criterion_id: String },
    #[error("scores supplied for criterion {criterion_id}, which has no weight")]
    UnexpectedCriterion { criterion_id: String },
    #[error("criterion {criterion_id} has no score for alternative {alternative_id}")]
    MissingAlternative {
        criterion_id: String,
        alternative_id: String,
    },
    #[error("criterion {criterion_id} scores unknown alternative {alternative_id}")]
    UnexpectedAlternative {
        criterion_id: String,
        alternative_id: String,
    },
    #[error("criterion {criterion_id} scores alternative {alternative_id} more than once")]
    DuplicateAlternative {
        criterion_id: String,
        alternative_id: String,
    },
    #[error("criterion {criterion_id} has non-finite score {score} for {alternative_id}")]
    InvalidScore {
        criterion_id: String,
        alternative_id: String,
        score: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionContribution {
    pub criterion_id: String,
    pub weight: f64,
    pub score: f64,
    /// `weight * score`
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    /// 1-based.
    pub rank: usize,
    pub alternative_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_name: Option<String>,
    /// Position of the alternative in the input ordering.
    pub input_index: usize,
    pub total_score: f64,
    /// One entry per criterion, in criteria weight order.
    pub breakdown: Vec<CriterionContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mode: WeightingMode,
    /// Sorted by `total_score` descending; ties keep input order.
    pub ranking: Vec<RankedAlternative>,
}

impl EvaluationResult {
    pub fn get(&self, alternative_id: &str) -> Option<&RankedAlternative> {
        self.ranking
            .iter()
            .find(|r| r.alternative_id == alternative_id)
    }

    pub fn total_score(&self, alternative_id: &str) -> Option<f64> {
        self.get(alternative_id).map(|r| r.total_score)
    }

    pub fn ranked_ids(&self) -> Vec<&str> {
        self.ranking
            .iter()
            .map(|r| r.alternative_id.as_str())
            .collect()
    }
}

/// Combine criteria weights with per-criterion alternative scores.
///
/// The alternative input order is the order listed under the first weighted
/// criterion. Every criterion must score exactly that alternative set.
pub fn aggregate(
    criteria_weights: &PriorityVector,
    per_criterion: &HashMap<String, CriterionScores>,
) -> Result<EvaluationResult, DimensionMismatchError> {
    if criteria_weights.is_empty() {
        return Err(DimensionMismatchError::NoCriteria);
    }

    let mut columns: Vec<&CriterionScores> = Vec::with_capacity(criteria_weights.len());
    for criterion_id in criteria_weights.item_ids() {
        let scores =
            per_criterion
                .get(criterion_id)
                .ok_or_else(|| DimensionMismatchError::MissingCriterion {
                    criterion_id: criterion_id.clone(),
                })?;
        columns.push(scores);
    }
    let mut extra: Vec<&String> = per_criterion
        .keys()
        .filter(|id| criteria_weights.get(id).is_none())
        .collect();
    extra.sort();
    if let Some(criterion_id) = extra.first() {
        return Err(DimensionMismatchError::UnexpectedCriterion {
            criterion_id: (*criterion_id).clone(),
        });
    }

    let reference = columns[0].entries();
    let mut alt_index: HashMap<&str, usize> = HashMap::with_capacity(reference.len());
    for (idx, (alt_id, _)) in reference.iter().enumerate() {
        if alt_index.insert(*alt_id, idx).is_some() {
            return Err(DimensionMismatchError::DuplicateAlternative {
                criterion_id: criteria_weights.item_ids()[0].clone(),
                alternative_id: alt_id.to_string(),
            });
        }
    }
    let alt_count = reference.len();

    // scores[alt][criterion]
    let mut scores = vec![vec![0.0; columns.len()]; alt_count];
    for (c_idx, (criterion_id, column)) in criteria_weights
        .item_ids()
        .iter()
        .zip(&columns)
        .enumerate()
    {
        let mut seen = vec![false; alt_count];
        for (alt_id, score) in column.entries() {
            if !score.is_finite() {
                return Err(DimensionMismatchError::InvalidScore {
                    criterion_id: criterion_id.clone(),
                    alternative_id: alt_id.to_string(),
                    score,
                });
            }
            let a_idx = *alt_index.get(alt_id).ok_or_else(|| {
                DimensionMismatchError::UnexpectedAlternative {
                    criterion_id: criterion_id.clone(),
                    alternative_id: alt_id.to_string(),
                }
            })?;
            if seen[a_idx] {
                return Err(DimensionMismatchError::DuplicateAlternative {
                    criterion_id: criterion_id.clone(),
                    alternative_id: alt_id.to_string(),
                });
            }
            seen[a_idx] = true;
            scores[a_idx][c_idx] = score;
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(DimensionMismatchError::MissingAlternative {
                criterion_id: criterion_id.clone(),
                alternative_id: reference[missing].0.to_string(),
            });
        }
    }

    let mut ranking: Vec<RankedAlternative> = reference
        .iter()
        .enumerate()
        .map(|(a_idx, (alt_id, _))| {
            let mut total_score = 0.0;
            let mut breakdown = Vec::with_capacity(columns.len());
            for (c_idx, (criterion_id, weight)) in criteria_weights.iter().enumerate() {
                let score = scores[a_idx][c_idx];
                let weighted_score = weight * score;
                total_score += weighted_score;
                breakdown.push(CriterionContribution {
                    criterion_id: criterion_id.to_string(),
                    weight,
                    score,
                    weighted_score,
                });
            }
            RankedAlternative {
                rank: 0,
                alternative_id: alt_id.to_string(),
                alternative_name: None,
                input_index: a_idx,
                total_score,
                breakdown,
            }
        })
        .collect();

    // sort_by is stable: equal totals keep input order.
    ranking.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    for (pos, entry) in ranking.iter_mut().enumerate() {
        entry.rank = pos + 1;
    }

    let raw = columns.iter().filter(|c| c.is_raw()).count();
    let mode = match raw {
        0 => WeightingMode::Priority,
        r if r == columns.len() => WeightingMode::RawScore,
        _ => WeightingMode::Mixed,
    };

    Ok(EvaluationResult { mode, ranking })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(pairs: &[(&str, f64)]) -> PriorityVector {
        PriorityVector::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn breakdown_follows_criteria_order() {
        let weights = pv(&[("cost", 0.75), ("access", 0.25)]);
        let mut per = HashMap::new();
        per.insert(
            "access".to_string(),
            CriterionScores::priorities(pv(&[("x", 0.5), ("y", 0.5)])),
        );
        per.insert(
            "cost".to_string(),
            CriterionScores::priorities(pv(&[("y", 0.2), ("x", 0.8)])),
        );
        let result = aggregate(&weights, &per).unwrap();
        assert_eq!(result.mode, WeightingMode::Priority);
        let x = result.get("x").unwrap();
        assert_eq!(x.rank, 1);
        assert_eq!(x.breakdown[0].criterion_id, "cost");
        assert!((x.breakdown[0].weighted_score - 0.6).abs() < 1e-12);
        assert!((x.total_score - 0.725).abs() < 1e-12);
        // input order comes from the first weighted criterion
        assert_eq!(result.get("y").unwrap().input_index, 0);
    }

    #[test]
    fn mixed_modes_are_reported() {
        let weights = pv(&[("a", 0.5), ("b", 0.5)]);
        let mut per = HashMap::new();
        per.insert(
            "a".to_string(),
            CriterionScores::priorities(pv(&[("x", 1.0)])),
        );
        per.insert("b".to_string(), CriterionScores::raw([("x", 7.0)]));
        let result = aggregate(&weights, &per).unwrap();
        assert_eq!(result.mode, WeightingMode::Mixed);
        assert!((result.total_score("x").unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn alternative_sets_must_agree() {
        let weights = pv(&[("a", 0.5), ("b", 0.5)]);
        let mut per = HashMap::new();
        per.insert("a".to_string(), CriterionScores::raw([("x", 1.0), ("y", 2.0)]));
        per.insert("b".to_string(), CriterionScores::raw([("x", 1.0)]));
        assert_eq!(
            aggregate(&weights, &per).unwrap_err(),
            DimensionMismatchError::MissingAlternative {
                criterion_id: "b".into(),
                alternative_id: "y".into()
            }
        );

        per.insert(
            "b".to_string(),
            CriterionScores::raw([("x", 1.0), ("y", 2.0), ("z", 3.0)]),
        );
        assert!(matches!(
            aggregate(&weights, &per),
            Err(DimensionMismatchError::UnexpectedAlternative { .. })
        ));

        per.insert(
            "b".to_string(),
            CriterionScores::raw([("x", 1.0), ("x", 2.0)]),
        );
        assert!(matches!(
            aggregate(&weights, &per),
            Err(DimensionMismatchError::DuplicateAlternative { .. })
        ));

        per.insert(
            "b".to_string(),
            CriterionScores::raw([("x", f64::NAN), ("y", 2.0)]),
        );
        assert!(matches!(
            aggregate(&weights, &per),
            Err(DimensionMismatchError::InvalidScore { .. })
        ));
    }

    #[test]
    fn criterion_sets_must_agree() {
        let weights = pv(&[("a", 1.0)]);
        let mut per = HashMap::new();
        per.insert("a".to_string(), CriterionScores::raw([("x", 1.0)]));
        per.insert("zz".to_string(), CriterionScores::raw([("x", 1.0)]));
        assert_eq!(
            aggregate(&weights, &per).unwrap_err(),
            DimensionMismatchError::UnexpectedCriterion {
                criterion_id: "zz".into()
            }
        );

        let empty = PriorityVector::new(vec![], vec![]).unwrap();
        assert_eq!(
            aggregate(&empty, &HashMap::new()).unwrap_err(),
            DimensionMismatchError::NoCriteria
        );
    }

    #[test]
    fn criterion_scores_serde_is_tagged() {
        let raw = CriterionScores::raw([("x", 5.0)]);
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["mode"], "raw_scores");
        assert_eq!(json["scores"][0]["alternative_id"], "x");
        let back: CriterionScores = serde_json::from_value(json).unwrap();
        assert_eq!(back, raw);
    }
}
