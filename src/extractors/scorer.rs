// src/extractors/scorer.rs
use crate::config::Configuration;
use crate::document::Table;

const KEYWORD_WEIGHT: u32 = 3;
const SHAPE_WEIGHT: u32 = 1;
const PLACEMENT_WEIGHT: u32 = 1;

// Plausible column range for a grade listing, inclusive
const MIN_COLUMNS: usize = 2;
const MAX_COLUMNS: usize = 8;

/// Scores how likely a table is to hold grades.
#[derive(Debug, Clone)]
pub struct TableScorer {
    keywords: Vec<String>,
}

impl TableScorer {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(&config.keyword_vocabulary)
    }

    /// Additive score: keyword hit +3, 2..=8 columns in the first row +1, inside the
    /// main content area +1.
    pub fn score_parts(&self, text: &str, first_row_cells: usize, in_main_content: bool) -> u32 {
        let text = text.to_lowercase();
        let mut score = 0;

        if self.keywords.iter().any(|k| text.contains(k.as_str())) {
            score += KEYWORD_WEIGHT;
        }
        if (MIN_COLUMNS..=MAX_COLUMNS).contains(&first_row_cells) {
            score += SHAPE_WEIGHT;
        }
        if in_main_content {
            score += PLACEMENT_WEIGHT;
        }

        score
    }

    pub fn score(&self, table: &Table) -> u32 {
        let score =
            self.score_parts(&table.text, table.first_row_cell_count(), table.in_main_content);
        tracing::trace!("Table {} scored {}", table.id.number(), score);
        score
    }
}
