// src/extractors/selector.rs
use serde::Serialize;

use super::scorer::TableScorer;
use crate::document::{Document, TableId};

pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCandidate {
    pub table: TableId,
    pub relevance_score: u32,
}

/// Picks the tables most likely to hold grades.
pub struct TableSelector {
    scorer: TableScorer,
}

impl TableSelector {
    pub fn new(scorer: TableScorer) -> Self {
        Self { scorer }
    }

    /// Top `MAX_CANDIDATES` tables with a positive score, best first, ties in document
    /// order. Without any positive score, the first tables in document order.
    pub fn select(&self, document: &Document) -> Vec<TableCandidate> {
        let mut scored: Vec<TableCandidate> = document
            .tables
            .iter()
            .map(|table| TableCandidate {
                table: table.id,
                relevance_score: self.scorer.score(table),
            })
            .collect();

        // sort_by is stable, which keeps document order among equal scores
        scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        let ranked: Vec<TableCandidate> = scored
            .iter()
            .filter(|c| c.relevance_score > 0)
            .take(MAX_CANDIDATES)
            .copied()
            .collect();

        if !ranked.is_empty() {
            tracing::debug!("Selected {} scored candidate tables: {:?}", ranked.len(), ranked);
            return ranked;
        }

        let fallback: Vec<TableCandidate> = document
            .tables
            .iter()
            .take(MAX_CANDIDATES)
            .map(|table| TableCandidate { table: table.id, relevance_score: 0 })
            .collect();
        tracing::debug!("No table scored above zero, falling back to the first {}", fallback.len());
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    fn selector() -> TableSelector {
        TableSelector::new(TableScorer::new(["nota"]))
    }

    fn ids(candidates: &[TableCandidate]) -> Vec<usize> {
        candidates.iter().map(|c| c.table.0).collect()
    }

    #[test]
    fn test_ranks_by_score_then_document_order() {
        // scores: 0 (one column), 1, 4, 1, 4
        let html = r#"
            <table><tr><td>x</td></tr></table>
            <table><tr><td>a</td><td>b</td></tr></table>
            <table><tr><td>Nota</td><td>8</td></tr></table>
            <table><tr><td>c</td><td>d</td></tr></table>
            <table><tr><td>nota</td><td>5</td></tr></table>
        "#;
        let parsed = HtmlDocument::parse(html);
        let candidates = selector().select(parsed.document());

        assert_eq!(ids(&candidates), vec![2, 4, 1]);
        assert_eq!(candidates[0].relevance_score, 4);
        assert_eq!(candidates[2].relevance_score, 1);
    }

    #[test]
    fn test_falls_back_to_first_tables() {
        let html = (0..5)
            .map(|i| format!("<table><tr><td>{}</td></tr></table>", i))
            .collect::<String>();
        let parsed = HtmlDocument::parse(&html);
        let candidates = selector().select(parsed.document());

        assert_eq!(ids(&candidates), vec![0, 1, 2]);
        assert!(candidates.iter().all(|c| c.relevance_score == 0));
    }

    #[test]
    fn test_never_more_than_available() {
        let parsed = HtmlDocument::parse("<table><tr><td>nota</td><td>1</td></tr></table>");
        assert_eq!(selector().select(parsed.document()).len(), 1);

        let empty = HtmlDocument::parse("<p>nada</p>");
        assert!(selector().select(empty.document()).is_empty());
    }
}
