// src/export/serializer.rs
use crate::document::{RowSection, Table};
use crate::utils::error::ExtractError;

/// One table resolved into header and data rows, ready for writing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Header from the head section (else the first row). Data rows from the explicit
    /// body, else every row after the header row. Rows without cells are dropped.
    pub fn from_table(table: &Table) -> Self {
        let header = table.header_cells();

        let rows = if table.has_explicit_body() {
            table
                .rows
                .iter()
                .filter(|r| r.section == RowSection::Body)
                .collect::<Vec<_>>()
        } else {
            let skip = if header.is_empty() { 0 } else { 1 };
            table.rows.iter().skip(skip).collect()
        };

        Self {
            header,
            rows: rows
                .into_iter()
                .filter(|r| !r.cells.is_empty())
                .map(|r| r.cell_texts())
                .collect(),
        }
    }
}

/// Line breaks become spaces and outer whitespace is trimmed. Quoting is left to the writer.
pub fn sanitize_cell(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

fn write_block(label: &str, table: &CsvTable) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record([label])?;
    if !table.header.is_empty() {
        wtr.write_record(table.header.iter().map(|f| sanitize_cell(f)))?;
    }
    for row in &table.rows {
        wtr.write_record(row.iter().map(|f| sanitize_cell(f)))?;
    }

    let mut data = wtr.into_inner().map_err(|e| e.into_error())?;
    data.push(b'\n'); // blank line separator
    Ok(data)
}

/// Writes every table as a labelled block ending in a blank line. No tables, no text.
pub fn to_csv(tables: &[CsvTable]) -> Result<String, ExtractError> {
    let mut data = Vec::new();

    for (idx, table) in tables.iter().enumerate() {
        let block = write_block(&format!("Table {}", idx + 1), table)
            .map_err(|e| ExtractError::CsvWrite(e.to_string()))?;
        data.extend_from_slice(&block);
    }

    String::from_utf8(data).map_err(|e| ExtractError::CsvWrite(e.to_string()))
}
