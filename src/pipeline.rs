// src/pipeline.rs
use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::Configuration;
use crate::document::{Document, RowId, TableId};
use crate::export::{to_csv, CsvTable};
use crate::extractors::{
    GradeAggregator, TableAggregate, TableCandidate, TableScorer, TableSelector, TableSummary,
};
use crate::utils::error::ExtractError;

/// Result of a summary pass. The caller applies the row flags and print marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub candidates: Vec<TableCandidate>,
    pub tables: Vec<TableAggregate>,
    pub flagged_rows: BTreeSet<RowId>,
}

impl SummaryReport {
    pub fn summaries(&self) -> impl Iterator<Item = &TableSummary> {
        self.tables.iter().map(|t| &t.summary)
    }

    /// Tables the presentation layer marks for printing.
    pub fn print_targets(&self) -> Vec<TableId> {
        self.candidates.iter().map(|c| c.table).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub text: String,
    pub filename: String,
}

/// Runs selection followed by either aggregation or CSV export. Holds nothing
/// between calls but its configuration.
pub struct GradeExtractionPipeline {
    config: Configuration,
    selector: TableSelector,
}

impl GradeExtractionPipeline {
    pub fn new(config: Configuration) -> Self {
        let config = config.sanitized();
        let selector = TableSelector::new(TableScorer::from_config(&config));
        Self { config, selector }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    fn candidates(&self, document: &Document) -> Result<Vec<TableCandidate>, ExtractError> {
        // the selector falls back to unscored tables, so it only comes back empty here
        if document.is_empty() {
            tracing::info!("No tables found in document");
            return Err(ExtractError::NoTablesFound);
        }
        Ok(self.selector.select(document))
    }

    pub fn compute_summaries(&self, document: &Document) -> Result<SummaryReport, ExtractError> {
        let candidates = self.candidates(document)?;
        let aggregator = GradeAggregator::new(&self.config);

        let tables: Vec<TableAggregate> = candidates
            .iter()
            .filter_map(|c| document.table(c.table))
            .map(|table| aggregator.aggregate(table))
            .collect();

        let flagged_rows = tables.iter().flat_map(|t| t.flagged_rows()).collect();

        for table in &tables {
            tracing::info!("{}", table.summary);
        }

        Ok(SummaryReport { candidates, tables, flagged_rows })
    }

    pub fn export_csv(&self, document: &Document) -> Result<CsvExport, ExtractError> {
        let candidates = self.candidates(document)?;

        let tables: Vec<CsvTable> = candidates
            .iter()
            .filter_map(|c| document.table(c.table))
            .map(CsvTable::from_table)
            .collect();

        let text = to_csv(&tables)?;
        if text.is_empty() {
            return Err(ExtractError::NothingToExport);
        }

        tracing::info!("Prepared CSV for {} tables ({} bytes)", tables.len(), text.len());
        Ok(CsvExport { text, filename: self.config.csv_filename.clone() })
    }

    /// The single best candidate, for printing one table.
    pub fn print_target(&self, document: &Document) -> Result<TableId, ExtractError> {
        self.candidates(document)?
            .first()
            .map(|c| c.table)
            .ok_or(ExtractError::NoTablesFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    const REPORT_CARD: &str = r#"<html><body>
        <table><tr><td>Menu</td></tr></table>
        <main>
          <table>
            <tr><th>Subject</th><th>Grade</th></tr>
            <tr><td>Math</td><td>7,5</td></tr>
            <tr><td>History</td><td>4</td></tr>
          </table>
        </main>
    </body></html>"#;

    #[test]
    fn test_summary_scenario() {
        let parsed = HtmlDocument::parse(REPORT_CARD);
        let pipeline = GradeExtractionPipeline::new(Configuration::default());
        let report = pipeline.compute_summaries(parsed.document()).unwrap();

        assert_eq!(report.candidates[0].table, TableId(1));
        let summary = report.summaries().next().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Some(5.75));
        assert!(report.flagged_rows.contains(&RowId { table: TableId(1), row: 2 }));
        assert!(!report.flagged_rows.contains(&RowId { table: TableId(1), row: 1 }));
    }

    #[test]
    fn test_summaries_are_recomputed_identically() {
        let parsed = HtmlDocument::parse(REPORT_CARD);
        let pipeline = GradeExtractionPipeline::new(Configuration::default());
        assert_eq!(
            pipeline.compute_summaries(parsed.document()),
            pipeline.compute_summaries(parsed.document())
        );
    }

    #[test]
    fn test_no_tables_found_on_both_paths() {
        let parsed = HtmlDocument::parse("<html><body><p>Nenhuma tabela</p></body></html>");
        let pipeline = GradeExtractionPipeline::new(Configuration::default());

        assert_eq!(pipeline.compute_summaries(parsed.document()), Err(ExtractError::NoTablesFound));
        assert_eq!(pipeline.export_csv(parsed.document()), Err(ExtractError::NoTablesFound));
        assert_eq!(pipeline.print_target(parsed.document()), Err(ExtractError::NoTablesFound));
    }

    #[test]
    fn test_export_uses_sanitized_filename() {
        let parsed = HtmlDocument::parse(REPORT_CARD);
        let config = Configuration { csv_filename: "../x.csv".into(), ..Default::default() };
        let export = GradeExtractionPipeline::new(config).export_csv(parsed.document()).unwrap();

        assert_eq!(export.filename, crate::config::DEFAULT_CSV_FILENAME);
        assert!(export.text.starts_with("\"Table 1\"\n\"Subject\",\"Grade\"\n\"Math\",\"7,5\""));
        // the menu table scores zero and is not a candidate
        assert!(!export.text.contains("Menu"));
        assert!(export.text.ends_with("\"History\",\"4\"\n\n"));
    }

    #[test]
    fn test_table_without_grades_does_not_abort_others() {
        let html = r#"
            <table><tr><th>Disciplina</th><th>Situação</th></tr><tr><td>Artes</td><td>Cursando</td></tr></table>
            <table><tr><th>Disciplina</th><th>Nota</th></tr><tr><td>Artes</td><td>9</td></tr></table>
        "#;
        let parsed = HtmlDocument::parse(html);
        let report = GradeExtractionPipeline::new(Configuration::default())
            .compute_summaries(parsed.document())
            .unwrap();

        let averages: Vec<Option<f64>> = report.summaries().map(|s| s.average).collect();
        assert_eq!(averages, vec![None, Some(9.0)]);
    }

    #[test]
    fn test_print_target_is_best_candidate() {
        let parsed = HtmlDocument::parse(REPORT_CARD);
        let pipeline = GradeExtractionPipeline::new(Configuration::default());
        assert_eq!(pipeline.print_target(parsed.document()), Ok(TableId(1)));
    }
}
