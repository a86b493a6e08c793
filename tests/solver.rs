use ahp_engine::matrix::{build_matrix, PairwiseMatrix};
use ahp_engine::solver::{solve, solve_with};
use ahp_engine::types::Comparison;
use ahp_engine::EngineConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c{i}")).collect()
}

fn dense(rows: Vec<Vec<f64>>) -> PairwiseMatrix {
    PairwiseMatrix::from_dense(ids(rows.len()), &rows).unwrap()
}

fn assert_close(got: f64, want: f64, tol: f64) {
    assert!((got - want).abs() <= tol, "expected {want}, got {got}");
}

#[test]
fn three_criteria_worked_example() {
    let m = dense(vec![
        vec![1.0, 3.0, 5.0],
        vec![1.0 / 3.0, 1.0, 2.0],
        vec![1.0 / 5.0, 1.0 / 2.0, 1.0],
    ]);
    let (pv, report) = solve(&m).unwrap();

    let w = pv.weights();
    assert_close(w[0], 0.647947, 1e-5);
    assert_close(w[1], 0.229871, 1e-5);
    assert_close(w[2], 0.122182, 1e-5);
    assert_close(pv.sum(), 1.0, 1e-12);

    assert_close(report.lambda_max, 3.003697, 1e-5);
    assert_close(report.consistency_index, 0.0018483, 1e-6);
    assert_close(report.consistency_ratio, 0.0031868, 1e-6);
    assert_eq!(report.random_index, 0.58);
    assert!(report.is_consistent);
    assert!(report.skipped_rows.is_empty());
}

#[test]
fn stronger_second_judgment_shifts_weight() {
    let m = dense(vec![
        vec![1.0, 3.0, 5.0],
        vec![1.0 / 3.0, 1.0, 3.0],
        vec![1.0 / 5.0, 1.0 / 3.0, 1.0],
    ]);
    let (pv, report) = solve(&m).unwrap();

    assert_close(pv.weights()[0], 0.633, 1e-3);
    assert_close(pv.weights()[1], 0.260, 1e-3);
    assert_close(pv.weights()[2], 0.106, 1e-3);
    assert_close(report.lambda_max, 3.038715, 1e-5);
    assert_close(report.consistency_index, 0.019357, 1e-5);
    assert_close(report.consistency_ratio, 0.033375, 1e-5);
    assert!(report.is_consistent);
}

#[test]
fn identity_matrix_gives_uniform_weights() {
    let m = dense(vec![
        vec![1.0, 1.0, 1.0],
        vec![1.0, 1.0, 1.0],
        vec![1.0, 1.0, 1.0],
    ]);
    let (pv, report) = solve(&m).unwrap();
    for w in pv.weights() {
        assert_close(*w, 1.0 / 3.0, 1e-12);
    }
    assert_close(report.lambda_max, 3.0, 1e-12);
    assert_close(report.consistency_ratio, 0.0, 1e-12);
    assert!(report.is_consistent);
}

#[test]
fn cyclic_judgments_are_flagged_inconsistent() {
    // a << b, b << c, but a >> c
    let m = dense(vec![
        vec![1.0, 1.0 / 9.0, 9.0],
        vec![9.0, 1.0, 1.0 / 9.0],
        vec![1.0 / 9.0, 9.0, 1.0],
    ]);
    let (pv, report) = solve(&m).unwrap();
    for w in pv.weights() {
        assert_close(*w, 1.0 / 3.0, 1e-12);
    }
    assert_close(report.lambda_max, 91.0 / 9.0, 1e-9);
    assert!(report.consistency_ratio > 6.0);
    assert!(!report.is_consistent);
}

#[test]
fn two_items_never_inconsistent() {
    let m = build_matrix(
        &[Comparison::new("a", "b", 7.0)],
        &["a".to_string(), "b".to_string()],
    )
    .unwrap();
    let (pv, report) = solve(&m).unwrap();
    assert_close(pv.get("a").unwrap(), 0.875, 1e-12);
    assert_close(report.lambda_max, 2.0, 1e-12);
    assert_eq!(report.consistency_index, 0.0);
    assert_eq!(report.consistency_ratio, 0.0);
    assert!(report.is_consistent);
}

#[test]
fn threshold_comes_from_config() {
    let m = dense(vec![
        vec![1.0, 3.0, 5.0],
        vec![1.0 / 3.0, 1.0, 3.0],
        vec![1.0 / 5.0, 1.0 / 3.0, 1.0],
    ]);
    let strict = EngineConfig {
        consistency_threshold: 0.01,
        ..EngineConfig::default()
    };
    let details = solve_with(&m, &strict).unwrap();
    assert!(!details.consistency.is_consistent);
}

#[test]
fn random_reciprocal_matrices_yield_normalized_weights() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let n = rng.gen_range(1..=9);
        let item_ids = ids(n);
        let mut comparisons = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let v: f64 = rng.gen_range(1.0..=9.0);
                let v = if rng.gen_bool(0.5) { v } else { 1.0 / v };
                comparisons.push(Comparison::new(item_ids[i].clone(), item_ids[j].clone(), v));
            }
        }
        let m = build_matrix(&comparisons, &item_ids).unwrap();
        let (pv, report) = solve(&m).unwrap();

        assert_close(pv.sum(), 1.0, 1e-9);
        assert!(pv.weights().iter().all(|w| *w > 0.0));
        assert!(report.lambda_max >= n as f64 - 1e-9);
        assert!(report.consistency_ratio >= -1e-9);
    }
}

#[test]
fn solving_twice_is_bit_identical() {
    let m = dense(vec![
        vec![1.0, 2.0, 4.0, 3.0],
        vec![0.5, 1.0, 2.0, 2.0],
        vec![0.25, 0.5, 1.0, 1.0],
        vec![1.0 / 3.0, 0.5, 1.0, 1.0],
    ]);
    let first = solve(&m).unwrap();
    let second = solve(&m).unwrap();
    assert_eq!(first, second);
    assert_close(first.1.consistency_ratio, 0.0038384, 1e-6);
}
