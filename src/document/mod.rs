// src/document/mod.rs
//! Read-only snapshot of the tables found in a document.
//!
//! The extraction core works on these types only. `html` builds them from markup.

pub mod html;

use serde::Serialize;

pub use html::HtmlDocument;

/// Opaque handle to a table: its position in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TableId(pub usize);

impl TableId {
    /// 1-based number used in labels ("Table 1").
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

/// Opaque handle to a row: owning table plus the row's position within that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowId {
    pub table: TableId,
    pub row: usize,
}

/// Table section a row was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSection {
    Head,
    /// An explicit body section present in the source.
    Body,
    Foot,
    /// Directly under the table, or inside a body section the parser had to invent.
    Unsectioned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub section: RowSection,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn cell_texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.text.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: TableId,
    /// Own rows in document order; rows of nested tables are not included.
    pub rows: Vec<Row>,
    /// Flattened, lowercased text content.
    pub text: String,
    /// Whether the table sits inside the page's main content area.
    pub in_main_content: bool,
}

impl Table {
    pub fn first_row_cell_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    pub fn has_explicit_body(&self) -> bool {
        self.rows.iter().any(|r| r.section == RowSection::Body)
    }

    /// Rows holding data: the explicit body rows, or every row but the first.
    pub fn data_rows(&self) -> Vec<&Row> {
        if self.has_explicit_body() {
            self.rows.iter().filter(|r| r.section == RowSection::Body).collect()
        } else {
            self.rows.iter().skip(1).collect()
        }
    }

    /// Column labels: header cells of the head section, else the first row's cells.
    pub fn header_cells(&self) -> Vec<String> {
        let explicit: Vec<String> = self
            .rows
            .iter()
            .filter(|r| r.section == RowSection::Head)
            .flat_map(|r| r.cells.iter().filter(|c| c.is_header))
            .map(|c| c.text.clone())
            .collect();

        if !explicit.is_empty() {
            return explicit;
        }

        self.rows.first().map(Row::cell_texts).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub tables: Vec<Table>,
}

impl Document {
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
