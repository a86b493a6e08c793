use std::collections::HashMap;

use ahp_engine::aggregate::{aggregate, CriterionScores, DimensionMismatchError, WeightingMode};
use ahp_engine::solver::PriorityVector;

fn two_criteria() -> PriorityVector {
    PriorityVector::from_pairs([("A", 0.6), ("B", 0.4)]).unwrap()
}

#[test]
fn tied_totals_keep_input_order() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert(
        "A".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.7), ("y", 0.3)]).unwrap()),
    );
    per_criterion.insert(
        "B".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.2), ("y", 0.8)]).unwrap()),
    );

    let result = aggregate(&two_criteria(), &per_criterion).unwrap();
    assert_eq!(result.mode, WeightingMode::Priority);
    assert_eq!(result.ranked_ids(), vec!["x", "y"]);
    assert!((result.total_score("x").unwrap() - 0.5).abs() < 1e-12);
    assert!((result.total_score("y").unwrap() - 0.5).abs() < 1e-12);

    let x = result.get("x").unwrap();
    assert_eq!(x.rank, 1);
    assert_eq!(x.breakdown.len(), 2);
    assert_eq!(x.breakdown[0].criterion_id, "A");
    assert!((x.breakdown[0].weighted_score - 0.42).abs() < 1e-12);
    assert!((x.breakdown[1].weighted_score - 0.08).abs() < 1e-12);
    assert_eq!(result.get("y").unwrap().rank, 2);
}

#[test]
fn higher_total_ranks_first_regardless_of_input_order() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert(
        "A".to_string(),
        CriterionScores::priorities(
            PriorityVector::from_pairs([("x", 0.2), ("y", 0.5), ("z", 0.3)]).unwrap(),
        ),
    );
    per_criterion.insert(
        "B".to_string(),
        CriterionScores::priorities(
            PriorityVector::from_pairs([("z", 0.6), ("x", 0.1), ("y", 0.3)]).unwrap(),
        ),
    );

    let result = aggregate(&two_criteria(), &per_criterion).unwrap();
    // y: 0.30 + 0.12, z: 0.18 + 0.24, x: 0.12 + 0.04
    assert_eq!(result.ranked_ids()[2], "x");
    assert_eq!(result.get("z").unwrap().input_index, 2);
    assert!((result.total_score("x").unwrap() - 0.16).abs() < 1e-12);
}

#[test]
fn missing_criterion_is_a_dimension_mismatch() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert(
        "A".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.7), ("y", 0.3)]).unwrap()),
    );

    let err = aggregate(&two_criteria(), &per_criterion).unwrap_err();
    assert_eq!(
        err,
        DimensionMismatchError::MissingCriterion {
            criterion_id: "B".to_string()
        }
    );
}

#[test]
fn alternative_sets_must_agree() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert(
        "A".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.7), ("y", 0.3)]).unwrap()),
    );
    per_criterion.insert(
        "B".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.2), ("w", 0.8)]).unwrap()),
    );

    let err = aggregate(&two_criteria(), &per_criterion).unwrap_err();
    assert!(matches!(
        err,
        DimensionMismatchError::UnexpectedAlternative { ref alternative_id, .. } if alternative_id == "w"
    ));
}

#[test]
fn raw_scores_are_weighted_directly() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert("A".to_string(), CriterionScores::raw([("x", 8.0), ("y", 5.0)]));
    per_criterion.insert("B".to_string(), CriterionScores::raw([("x", 2.0), ("y", 9.0)]));

    let result = aggregate(&two_criteria(), &per_criterion).unwrap();
    assert_eq!(result.mode, WeightingMode::RawScore);
    // y: 3.0 + 3.6, x: 4.8 + 0.8
    assert_eq!(result.ranked_ids(), vec!["y", "x"]);
    assert!((result.total_score("y").unwrap() - 6.6).abs() < 1e-12);
}

#[test]
fn mixing_priorities_and_raw_scores_is_reported() {
    let mut per_criterion = HashMap::new();
    per_criterion.insert(
        "A".to_string(),
        CriterionScores::priorities(PriorityVector::from_pairs([("x", 0.7), ("y", 0.3)]).unwrap()),
    );
    per_criterion.insert("B".to_string(), CriterionScores::raw([("x", 1.0), ("y", 0.0)]));

    let result = aggregate(&two_criteria(), &per_criterion).unwrap();
    assert_eq!(result.mode, WeightingMode::Mixed);
    assert_eq!(result.ranked_ids(), vec!["x", "y"]);
}
