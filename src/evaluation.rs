//! One-shot evaluation: judgments in, solved matrices and ranking out.
//!
//! Runs build → solve → aggregate for the criteria matrix and for every criterion,
//! so a caller can assemble the whole input once and get back everything needed to
//! render tables, charts and exports.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{aggregate, CriterionScores, DimensionMismatchError, EvaluationResult};
use crate::config::EngineConfig;
use crate::error::AhpError;
use crate::matrix::{PairwiseMatrix, ShapeError};
use crate::solver::{solve_with, ConsistencyReport, PriorityVector};
use crate::types::{Alternative, Comparison, Criterion};

/// Subject name of the criteria-level matrix in analyses and errors.
pub const CRITERIA_SUBJECT: &str = "criteria";

/// Pairwise judgments over one item set, either sparse or dense.
///
/// Deserializes from `{"comparisons": [...]}` or `{"labels": [...]?, "matrix": [[...]]}`;
/// a payload carrying both shapes is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Judgments {
    Comparisons {
        comparisons: Vec<Comparison>,
    },
    /// Row-major dense matrix. Without `labels`, rows follow the item order of the request.
    Matrix {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        labels: Option<Vec<String>>,
        matrix: Vec<Vec<f64>>,
    },
}

#[derive(Deserialize)]
struct JudgmentsRepr {
    comparisons: Option<Vec<Comparison>>,
    labels: Option<Vec<String>>,
    matrix: Option<Vec<Vec<f64>>>,
}

impl TryFrom<JudgmentsRepr> for Judgments {
    type Error = &'static str;

    fn try_from(repr: JudgmentsRepr) -> Result<Self, Self::Error> {
        match (repr.comparisons, repr.labels, repr.matrix) {
            (Some(comparisons), None, None) => Ok(Judgments::Comparisons { comparisons }),
            (None, labels, Some(matrix)) => Ok(Judgments::Matrix { labels, matrix }),
            (Some(_), _, Some(_)) => Err("judgments carry both `comparisons` and `matrix`"),
            (Some(_), Some(_), None) => Err("`labels` only apply to a dense `matrix`"),
            (None, _, None) => Err("judgments need either `comparisons` or `matrix`"),
        }
    }
}

impl<'de> Deserialize<'de> for Judgments {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = JudgmentsRepr::deserialize(deserializer)?;
        Judgments::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl Judgments {
    pub fn build(&self, item_ids: &[String], cfg: &EngineConfig) -> Result<PairwiseMatrix, ShapeError> {
        match self {
            Judgments::Comparisons { comparisons } => {
                PairwiseMatrix::from_comparisons(comparisons, item_ids)
            }
            Judgments::Matrix { labels, matrix } => {
                let ids = match labels {
                    Some(labels) => {
                        if labels.len() != item_ids.len() {
                            return Err(ShapeError::LabelCount {
                                labels: labels.len(),
                                rows: item_ids.len(),
                            });
                        }
                        if let Some(unknown) = labels.iter().find(|l| !item_ids.contains(l)) {
                            return Err(ShapeError::UnknownItem {
                                item_id: unknown.clone(),
                            });
                        }
                        labels.clone()
                    }
                    None => item_ids.to_vec(),
                };
                PairwiseMatrix::from_dense_with_tolerance(ids, matrix, cfg.reciprocal_tolerance)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub criteria: Vec<Criterion>,
    pub alternatives: Vec<Alternative>,
    pub criteria_judgments: Judgments,
    /// Criteria absent here are evaluated from `Alternative::scores` (raw-score mode).
    #[serde(default)]
    pub alternative_judgments: BTreeMap<String, Judgments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
}

/// Solved view of one pairwise matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixAnalysis {
    /// `"criteria"` or the criterion id the alternatives were compared under.
    pub subject: String,
    pub item_ids: Vec<String>,
    pub pairwise_matrix: Vec<Vec<f64>>,
    pub normalized_matrix: Vec<Vec<f64>>,
    pub priorities: PriorityVector,
    pub consistency: ConsistencyReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub request_hash: String,
    pub criteria: MatrixAnalysis,
    /// Per-criterion alternative analyses, in criteria order; raw-score criteria have none.
    pub alternatives: Vec<MatrixAnalysis>,
    pub result: EvaluationResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EvaluationResponse {
    /// Consistency of every solved matrix, criteria first.
    pub fn consistency_reports(&self) -> impl Iterator<Item = (&str, &ConsistencyReport)> {
        std::iter::once(&self.criteria)
            .chain(&self.alternatives)
            .map(|a| (a.subject.as_str(), &a.consistency))
    }
}

/// Build and solve one matrix.
pub fn analyze(
    subject: &str,
    judgments: &Judgments,
    item_ids: &[String],
    cfg: &EngineConfig,
) -> Result<MatrixAnalysis, AhpError> {
    let matrix = judgments
        .build(item_ids, cfg)
        .map_err(|e| AhpError::from(e).within(subject))?;
    let details = solve_with(&matrix, cfg).map_err(|e| AhpError::from(e).within(subject))?;
    Ok(MatrixAnalysis {
        subject: subject.to_string(),
        item_ids: matrix.item_ids().to_vec(),
        pairwise_matrix: matrix.to_rows(),
        normalized_matrix: details.normalized_matrix,
        priorities: details.priorities,
        consistency: details.consistency,
    })
}

/// Re-express `pv` in `order`; ids missing from `pv` are dropped.
fn reorder(pv: &PriorityVector, order: &[String]) -> Result<PriorityVector, ShapeError> {
    let (ids, weights) = order
        .iter()
        .filter_map(|id| pv.get(id).map(|w| (id.clone(), w)))
        .unzip();
    PriorityVector::new(ids, weights)
}

fn hash_request(req: &EvaluationRequest) -> String {
    let mut hasher = blake3::Hasher::new();
    // Only structs, sequences and string-keyed maps: serde_json cannot reject this
    // value, and writing into the hasher never fails.
    let _ = serde_json::to_writer(&mut hasher, req);
    hasher.finalize().to_hex().to_string()
}

fn note_inconsistent(analysis: &MatrixAnalysis, cfg: &EngineConfig, warnings: &mut Vec<String>) {
    if analysis.consistency.is_consistent {
        return;
    }
    warn!(
        subject = %analysis.subject,
        consistency_ratio = analysis.consistency.consistency_ratio,
        "inconsistent pairwise matrix"
    );
    warnings.push(format!(
        "{}: consistency ratio {:.4} is not below {:.2}",
        analysis.subject, analysis.consistency.consistency_ratio, cfg.consistency_threshold
    ));
}

/// Evaluate with the request's embedded config, or the default one.
pub fn run_evaluation(req: &EvaluationRequest) -> Result<EvaluationResponse, AhpError> {
    run_evaluation_with(req, &EngineConfig::default())
}

/// Evaluate; a config embedded in the request takes precedence over `base`.
pub fn run_evaluation_with(
    req: &EvaluationRequest,
    base: &EngineConfig,
) -> Result<EvaluationResponse, AhpError> {
    let cfg = req.config.as_ref().unwrap_or(base);
    cfg.validate()?;

    let criterion_ids: Vec<String> = req.criteria.iter().map(|c| c.id.clone()).collect();
    let alternative_ids: Vec<String> = req.alternatives.iter().map(|a| a.id.clone()).collect();
    let mut warnings = Vec::new();

    let criteria = analyze(CRITERIA_SUBJECT, &req.criteria_judgments, &criterion_ids, cfg)?;
    note_inconsistent(&criteria, cfg, &mut warnings);

    if let Some(unknown) = req
        .alternative_judgments
        .keys()
        .find(|id| !criterion_ids.contains(id))
    {
        return Err(DimensionMismatchError::UnexpectedCriterion {
            criterion_id: unknown.clone(),
        }
        .into());
    }

    let mut alternatives = Vec::new();
    let mut per_criterion: HashMap<String, CriterionScores> = HashMap::new();
    for criterion in &req.criteria {
        let scores = match req.alternative_judgments.get(&criterion.id) {
            Some(judgments) => {
                let analysis = analyze(&criterion.id, judgments, &alternative_ids, cfg)?;
                note_inconsistent(&analysis, cfg, &mut warnings);
                let priorities = reorder(&analysis.priorities, &alternative_ids)?;
                alternatives.push(analysis);
                CriterionScores::priorities(priorities)
            }
            None => {
                let mut raw = Vec::with_capacity(req.alternatives.len());
                for alt in &req.alternatives {
                    let score = alt.scores.get(&criterion.id).copied().ok_or_else(|| {
                        DimensionMismatchError::MissingAlternative {
                            criterion_id: criterion.id.clone(),
                            alternative_id: alt.id.clone(),
                        }
                    })?;
                    raw.push((alt.id.clone(), score));
                }
                CriterionScores::raw(raw)
            }
        };
        per_criterion.insert(criterion.id.clone(), scores);
    }

    let weights = reorder(&criteria.priorities, &criterion_ids)?;
    let mut result = aggregate(&weights, &per_criterion)?;
    let names: HashMap<&str, &str> = req
        .alternatives
        .iter()
        .map(|a| (a.id.as_str(), a.name.as_str()))
        .collect();
    for entry in &mut result.ranking {
        entry.alternative_name = names.get(entry.alternative_id.as_str()).map(|n| n.to_string());
    }

    info!(
        criteria = criterion_ids.len(),
        alternatives = alternative_ids.len(),
        mode = ?result.mode,
        warnings = warnings.len(),
        "evaluation complete"
    );

    Ok(EvaluationResponse {
        request_hash: hash_request(req),
        criteria,
        alternatives,
        result,
        warnings,
    })
}
