//! Markdown rendering of evaluation results.

use crate::evaluation::{EvaluationResponse, MatrixAnalysis};

fn push_matrix(out: &mut String, labels: &[String], rows: &[Vec<f64>]) {
    out.push_str("| |");
    for label in labels {
        out.push_str(&format!(" {label} |"));
    }
    out.push_str("\n|---|");
    for _ in labels {
        out.push_str("---:|");
    }
    out.push('\n');
    for (label, row) in labels.iter().zip(rows) {
        out.push_str(&format!("| **{label}** |"));
        for v in row {
            out.push_str(&format!(" {v:.4} |"));
        }
        out.push('\n');
    }
}

fn push_analysis(out: &mut String, title: &str, analysis: &MatrixAnalysis) {
    let c = &analysis.consistency;
    out.push_str(&format!("\n## {title}\n\n"));
    out.push_str(&format!("- λmax: {:.4}\n", c.lambda_max));
    out.push_str(&format!("- Consistency index (CI): {:.4}\n", c.consistency_index));
    out.push_str(&format!(
        "- Consistency ratio (CR): {:.4} ({})\n",
        c.consistency_ratio,
        if c.is_consistent {
            "consistent"
        } else {
            "inconsistent"
        }
    ));
    if !c.skipped_rows.is_empty() {
        out.push_str(&format!("- Rows skipped (zero weight): {:?}\n", c.skipped_rows));
    }

    out.push_str("\n### Pairwise comparison matrix\n\n");
    push_matrix(out, &analysis.item_ids, &analysis.pairwise_matrix);
    out.push_str("\n### Normalized matrix\n\n");
    push_matrix(out, &analysis.item_ids, &analysis.normalized_matrix);

    out.push_str("\n### Weights\n\n");
    for (id, w) in analysis.priorities.iter() {
        out.push_str(&format!("- `{id}`: {w:.4}\n"));
    }
}

pub fn render_markdown(resp: &EvaluationResponse) -> String {
    let mut out = String::new();
    out.push_str("# AHP Evaluation Report\n\n");
    out.push_str(&format!("- Request hash: `{}`\n", resp.request_hash));
    out.push_str(&format!("- Weighting mode: {:?}\n", resp.result.mode));
    for warning in &resp.warnings {
        out.push_str(&format!("- Warning: {warning}\n"));
    }

    out.push_str("\n## Ranking\n\n");
    let criteria = resp.criteria.priorities.item_ids();
    out.push_str("| Rank | Alternative | Total |");
    for c in criteria {
        out.push_str(&format!(" {c} |"));
    }
    out.push_str("\n|---:|---|---:|");
    for _ in criteria {
        out.push_str("---:|");
    }
    out.push('\n');
    for entry in &resp.result.ranking {
        let name = entry
            .alternative_name
            .as_deref()
            .unwrap_or(&entry.alternative_id);
        out.push_str(&format!(
            "| {} | {} | {:.4} |",
            entry.rank, name, entry.total_score
        ));
        for c in criteria {
            let weighted = entry
                .breakdown
                .iter()
                .find(|b| &b.criterion_id == c)
                .map(|b| b.weighted_score)
                .unwrap_or(0.0);
            out.push_str(&format!(" {weighted:.4} |"));
        }
        out.push('\n');
    }

    push_analysis(&mut out, "Criteria", &resp.criteria);
    for analysis in &resp.alternatives {
        push_analysis(
            &mut out,
            &format!("Alternatives under `{}`", analysis.subject),
            analysis,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{run_evaluation, EvaluationRequest, Judgments};
    use crate::types::{Alternative, Comparison, Criterion};

    #[test]
    fn report_lists_ranking_and_matrices() {
        let mut alternative_judgments = std::collections::BTreeMap::new();
        alternative_judgments.insert(
            "cost".to_string(),
            Judgments::Comparisons {
                comparisons: vec![Comparison::new("north", "south", 2.0)],
            },
        );
        let req = EvaluationRequest {
            criteria: vec![Criterion::new("cost", "Rent")],
            alternatives: vec![
                Alternative::new("north", "North Mall"),
                Alternative::new("south", "South Street"),
            ],
            criteria_judgments: Judgments::Comparisons {
                comparisons: vec![],
            },
            alternative_judgments,
            config: None,
        };
        let resp = run_evaluation(&req).unwrap();
        let md = render_markdown(&resp);

        assert!(md.starts_with("# AHP Evaluation Report"));
        assert!(md.contains("| 1 | North Mall | 0.6667 | 0.6667 |"));
        assert!(md.contains("## Alternatives under `cost`"));
        assert!(md.contains("### Normalized matrix"));
        assert!(md.contains("(consistent)"));
    }
}
