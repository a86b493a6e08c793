//! Spreadsheet ingestion.
//!
//! Layout: one sheet per comparison matrix. The first row and first column hold
//! labels, the remaining cells hold the matrix. The first sheet compares the
//! criteria; each further sheet is named after one criterion and compares the
//! alternatives under it.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::AhpError;
use crate::evaluation::{run_evaluation_with, EvaluationRequest, EvaluationResponse, Judgments};
use crate::types::{Alternative, Criterion};

#[derive(Debug, Error, PartialEq)]
pub enum WorkbookError {
    #[error("failed to read workbook {path}: {message}")]
    Read { path: String, message: String },
    #[error("workbook has no sheets")]
    EmptyWorkbook,
    #[error("sheet {sheet} has no labels")]
    EmptySheet { sheet: String },
    #[error("sheet {sheet} repeats the label {label:?}")]
    DuplicateLabel { sheet: String, label: String },
    #[error("sheet {sheet} has {got} labeled rows for {expected} labeled columns")]
    RowCount {
        sheet: String,
        expected: usize,
        got: usize,
    },
    #[error("sheet {sheet} row {row} is labeled {got:?}, expected {expected:?}")]
    LabelMismatch {
        sheet: String,
        row: usize,
        expected: String,
        got: String,
    },
    #[error("sheet {sheet} cell ({row}, {col}) is not a number: {value:?}")]
    InvalidCell {
        sheet: String,
        row: usize,
        col: usize,
        value: String,
    },
    #[error("sheet {sheet} does not name a criterion")]
    UnknownSheet { sheet: String },
    #[error("criterion {criterion} has more than one sheet")]
    DuplicateSheet { criterion: String },
    #[error("no sheet for criterion {criterion}")]
    MissingSheet { criterion: String },
}

impl WorkbookError {
    pub fn is_io(&self) -> bool {
        matches!(self, WorkbookError::Read { .. } | WorkbookError::EmptyWorkbook)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    fn label(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.label().is_none()
    }

    fn display(&self) -> String {
        self.label().unwrap_or_default()
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Raw cells of one sheet, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Labels plus the numeric block of one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Parse `"3"`, `"0.25"` or `"1/3"`.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    let value = match t.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => t.parse().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Extract labels and the numeric block from one sheet.
///
/// Fully empty rows are ignored; column labels end at the first empty header cell.
pub fn parse_sheet(sheet: &SheetGrid) -> Result<LabeledMatrix, WorkbookError> {
    let mut rows = sheet
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()));

    let header = rows.next().ok_or_else(|| WorkbookError::EmptySheet {
        sheet: sheet.name.clone(),
    })?;
    let labels: Vec<String> = header
        .iter()
        .skip(1)
        .map_while(CellValue::label)
        .collect();
    if labels.is_empty() {
        return Err(WorkbookError::EmptySheet {
            sheet: sheet.name.clone(),
        });
    }
    for (idx, label) in labels.iter().enumerate() {
        if labels[..idx].contains(label) {
            return Err(WorkbookError::DuplicateLabel {
                sheet: sheet.name.clone(),
                label: label.clone(),
            });
        }
    }
    let n = labels.len();

    let body: Vec<&Vec<CellValue>> = rows.collect();
    if body.len() != n {
        return Err(WorkbookError::RowCount {
            sheet: sheet.name.clone(),
            expected: n,
            got: body.len(),
        });
    }

    let mut matrix = Vec::with_capacity(n);
    for (i, row) in body.iter().enumerate() {
        let row_label = row.first().map(CellValue::display).unwrap_or_default();
        if row_label != labels[i] {
            return Err(WorkbookError::LabelMismatch {
                sheet: sheet.name.clone(),
                row: i + 1,
                expected: labels[i].clone(),
                got: row_label,
            });
        }
        let mut values = Vec::with_capacity(n);
        for col in 1..=n {
            let cell = row.get(col);
            let value = match cell {
                Some(CellValue::Number(v)) if v.is_finite() => Some(*v),
                Some(CellValue::Text(s)) => parse_number(s),
                _ => None,
            };
            let value = value.ok_or_else(|| WorkbookError::InvalidCell {
                sheet: sheet.name.clone(),
                row: i + 1,
                col,
                value: cell.map(CellValue::display).unwrap_or_default(),
            })?;
            values.push(value);
        }
        matrix.push(values);
    }

    Ok(LabeledMatrix {
        labels,
        rows: matrix,
    })
}

/// Read every sheet of an `.xlsx`/`.xls`/`.ods` file into cell grids.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Vec<SheetGrid>, WorkbookError> {
    let path = path.as_ref();
    let read_err = |message: String| WorkbookError::Read {
        path: path.display().to_string(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| read_err(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| read_err(e.to_string()))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();
        sheets.push(SheetGrid { name, rows });
    }
    if sheets.is_empty() {
        return Err(WorkbookError::EmptyWorkbook);
    }
    debug!(path = %path.display(), sheets = sheets.len(), "read workbook");
    Ok(sheets)
}

/// Turn parsed sheets into an evaluation request.
pub fn workbook_request(sheets: &[SheetGrid]) -> Result<EvaluationRequest, WorkbookError> {
    let (first, rest) = sheets.split_first().ok_or(WorkbookError::EmptyWorkbook)?;
    let criteria = parse_sheet(first)?;

    let mut per_criterion: Vec<Option<LabeledMatrix>> = vec![None; criteria.labels.len()];
    for sheet in rest {
        let name = sheet.name.trim();
        let idx = criteria
            .labels
            .iter()
            .position(|l| l == name)
            .ok_or_else(|| WorkbookError::UnknownSheet {
                sheet: sheet.name.clone(),
            })?;
        if per_criterion[idx].is_some() {
            return Err(WorkbookError::DuplicateSheet {
                criterion: criteria.labels[idx].clone(),
            });
        }
        per_criterion[idx] = Some(parse_sheet(sheet)?);
    }

    let mut alternative_judgments = std::collections::BTreeMap::new();
    let mut alternatives: Option<Vec<Alternative>> = None;
    for (label, parsed) in criteria.labels.iter().zip(per_criterion) {
        let parsed = parsed.ok_or_else(|| WorkbookError::MissingSheet {
            criterion: label.clone(),
        })?;
        if alternatives.is_none() {
            alternatives = Some(
                parsed
                    .labels
                    .iter()
                    .map(|l| Alternative::new(l.clone(), l.clone()))
                    .collect(),
            );
        }
        alternative_judgments.insert(
            label.clone(),
            Judgments::Matrix {
                labels: Some(parsed.labels),
                matrix: parsed.rows,
            },
        );
    }

    Ok(EvaluationRequest {
        criteria: criteria
            .labels
            .iter()
            .map(|l| Criterion::new(l.clone(), l.clone()))
            .collect(),
        alternatives: alternatives.unwrap_or_default(),
        criteria_judgments: Judgments::Matrix {
            labels: Some(criteria.labels),
            matrix: criteria.rows,
        },
        alternative_judgments,
        config: None,
    })
}

/// Evaluate parsed sheets end to end.
pub fn evaluate_workbook(
    sheets: &[SheetGrid],
    cfg: &EngineConfig,
) -> Result<EvaluationResponse, AhpError> {
    let req = workbook_request(sheets)?;
    run_evaluation_with(&req, cfg)
}
