// src/extractors/aggregator.rs
//! Per-table grade detection, normalization and summary.

use std::fmt;

use serde::Serialize;

use super::number::parse_number;
use crate::config::Configuration;
use crate::document::{Row, RowId, Table, TableId};
use crate::utils::error::ExtractError;

/// Inclusive range a cell value must fall in to count as a grade.
const GRADE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Values above this are read as percentages.
const TEN_POINT_MAX: f64 = 10.0;

/// Maps a detected value onto the 0-10 scale. Decided per value, not per table.
pub fn normalize(raw: f64) -> f64 {
    if raw > TEN_POINT_MAX {
        raw / TEN_POINT_MAX
    } else {
        raw
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRow {
    pub source_row: RowId,
    pub raw_cells: Vec<String>,
    /// Value as written in the cell.
    pub raw_value: Option<f64>,
    /// Value on the 0-10 scale.
    pub detected_value: Option<f64>,
    pub is_low_grade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub table: TableId,
    pub count: usize,
    pub sum: f64,
    /// Absent iff `count` is zero.
    pub average: Option<f64>,
    pub threshold: f64,
}

impl TableSummary {
    pub fn average_or_missing(&self) -> Result<f64, ExtractError> {
        self.average.ok_or(ExtractError::NoGradeDetected(self.table.number()))
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table {}: ", self.table.number())?;
        match self.average_or_missing() {
            Ok(avg) => write!(
                f,
                "average {:.2} over {} grade{}",
                avg,
                self.count,
                if self.count == 1 { "" } else { "s" }
            )?,
            Err(_) => write!(f, "no grade detected")?,
        }
        write!(f, ", threshold {}", self.threshold)
    }
}

/// Summary plus per-row detail for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableAggregate {
    pub summary: TableSummary,
    pub rows: Vec<ExtractedRow>,
}

impl TableAggregate {
    pub fn flagged_rows(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().filter(|r| r.is_low_grade).map(|r| r.source_row)
    }
}

pub struct GradeAggregator<'a> {
    config: &'a Configuration,
}

impl<'a> GradeAggregator<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Builds the summary from scratch: no flag from an earlier pass survives.
    pub fn aggregate(&self, table: &Table) -> TableAggregate {
        let mut rows = Vec::new();
        let mut count = 0;
        let mut sum = 0.0;

        for row in table.data_rows() {
            let raw_value = detect_grade(row);
            let detected_value = raw_value.map(normalize);

            let is_low_grade = match detected_value {
                Some(v) => {
                    count += 1;
                    sum += v;
                    self.config.highlight_low_grades && v < self.config.low_grade_threshold
                }
                None => false,
            };

            rows.push(ExtractedRow {
                source_row: row.id,
                raw_cells: row.cell_texts(),
                raw_value,
                detected_value,
                is_low_grade,
            });
        }

        let average = if count > 0 { Some(sum / count as f64) } else { None };

        if average.is_none() {
            tracing::debug!(
                "No grade detected in table {} ({} data rows)",
                table.id.number(),
                rows.len()
            );
        }

        TableAggregate {
            summary: TableSummary {
                table: table.id,
                count,
                sum,
                average,
                threshold: self.config.low_grade_threshold,
            },
            rows,
        }
    }
}

/// First cell, left to right, holding a value in the grade range.
fn detect_grade(row: &Row) -> Option<f64> {
    row.cells
        .iter()
        .filter_map(|cell| parse_number(&cell.text))
        .find(|v| GRADE_RANGE.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    fn table_from(html: &str) -> Table {
        HtmlDocument::parse(html).document().tables[0].clone()
    }

    #[test]
    fn test_normalization_boundaries() {
        assert_eq!(normalize(85.0), 8.5);
        assert_eq!(normalize(8.5), 8.5);
        assert_eq!(normalize(10.0), 10.0);
        assert_eq!(normalize(100.0), 10.0);
        assert_eq!(normalize(0.0), 0.0);
    }

    #[test]
    fn test_subject_grade_scenario() {
        let table = table_from(
            "<table><tr><th>Subject</th><th>Grade</th></tr>\
             <tr><td>Math</td><td>7,5</td></tr>\
             <tr><td>History</td><td>4</td></tr></table>",
        );
        let config = Configuration::default();
        let result = GradeAggregator::new(&config).aggregate(&table);

        assert_eq!(result.summary.count, 2);
        assert_eq!(result.summary.average, Some(5.75));
        let flagged: Vec<RowId> = result.flagged_rows().collect();
        assert_eq!(flagged, vec![RowId { table: TableId(0), row: 2 }]);
        assert!(!result.rows[0].is_low_grade);
    }

    #[test]
    fn test_percentage_is_normalized_and_not_flagged() {
        let table = table_from(
            "<table><tr><td>Disciplina</td><td>Nota</td></tr><tr><td>Química</td><td>95</td></tr></table>",
        );
        let config = Configuration::default();
        let result = GradeAggregator::new(&config).aggregate(&table);

        assert_eq!(result.rows[0].raw_value, Some(95.0));
        assert_eq!(result.rows[0].detected_value, Some(9.5));
        assert!(!result.rows[0].is_low_grade);
        assert_eq!(result.summary.average, Some(9.5));
    }

    #[test]
    fn test_first_in_range_cell_wins() {
        // 2024 is out of range, so the scan moves on; 42 precedes the real grade
        let table = table_from(
            "<table><tbody>\
             <tr><td>2024</td><td>Biologia</td><td>7</td></tr>\
             <tr><td>42</td><td>Artes</td><td>9</td></tr>\
             <tr><td>-1</td><td>Artes</td><td>3</td></tr>\
             </tbody></table>",
        );
        let config = Configuration::default();
        let result = GradeAggregator::new(&config).aggregate(&table);

        let values: Vec<Option<f64>> = result.rows.iter().map(|r| r.detected_value).collect();
        assert_eq!(values, vec![Some(7.0), Some(4.2), Some(3.0)]);
    }

    #[test]
    fn test_no_grade_detected() {
        let table = table_from("<table><tr><th>Disciplina</th></tr><tr><td>Ausente</td></tr></table>");
        let config = Configuration::default();
        let result = GradeAggregator::new(&config).aggregate(&table);

        assert_eq!(result.summary.count, 0);
        assert_eq!(result.summary.average, None);
        assert_eq!(result.summary.average_or_missing(), Err(ExtractError::NoGradeDetected(1)));
        assert_eq!(result.summary.to_string(), "Table 1: no grade detected, threshold 6");
    }

    #[test]
    fn test_highlight_disabled_flags_nothing() {
        let table = table_from("<table><tr><th>Nota</th></tr><tr><td>1</td></tr><tr><td>2</td></tr></table>");
        let config = Configuration { highlight_low_grades: false, ..Default::default() };
        let result = GradeAggregator::new(&config).aggregate(&table);

        assert_eq!(result.summary.count, 2);
        assert_eq!(result.flagged_rows().count(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let table = table_from("<table><tr><th>Nota</th></tr><tr><td>6,0</td></tr><tr><td>5,9</td></tr></table>");
        let config = Configuration::default();
        let result = GradeAggregator::new(&config).aggregate(&table);

        let flags: Vec<bool> = result.rows.iter().map(|r| r.is_low_grade).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let table = table_from("<table><tr><th>Nota</th></tr><tr><td>3</td></tr><tr><td>80</td></tr></table>");
        let config = Configuration::default();
        let aggregator = GradeAggregator::new(&config);

        assert_eq!(aggregator.aggregate(&table), aggregator.aggregate(&table));
    }

    #[test]
    fn test_summary_display() {
        let summary = TableSummary {
            table: TableId(1),
            count: 2,
            sum: 11.5,
            average: Some(5.75),
            threshold: 6.5,
        };
        assert_eq!(summary.to_string(), "Table 2: average 5.75 over 2 grades, threshold 6.5");
    }
}
