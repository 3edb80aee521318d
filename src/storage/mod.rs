// src/storage/mod.rs
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::pipeline::{CsvExport, SummaryReport};
use crate::source::DocumentSource;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    fn write_file(&self, filename: &str, content: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);

        let mut file = fs::File::create(&file_path)
            .map_err(StorageError::IoError)?;
        file.write_all(content.as_bytes())
            .map_err(StorageError::IoError)?;

        Ok(file_path)
    }

    /// Saves the CSV text under the export's configured file name
    pub fn save_csv(&self, export: &CsvExport) -> Result<PathBuf, StorageError> {
        let path = self.write_file(&export.filename, &export.text)?;
        tracing::info!("Saved CSV to {}", path.display());
        Ok(path)
    }

    /// Saves a re-rendered copy of the page, e.g. `boletim_annotated.html`
    pub fn save_page(
        &self,
        source: &DocumentSource,
        suffix: &str,
        html: &str,
    ) -> Result<PathBuf, StorageError> {
        let filename = format!("{}_{}.html", source.stem(), suffix);
        let path = self.write_file(&filename, html)?;
        tracing::info!("Saved {} page to {}", suffix, path.display());
        Ok(path)
    }

    /// Saves a JSON description of the summary pass
    pub fn save_report_metadata(
        &self,
        source: &DocumentSource,
        report: &SummaryReport,
    ) -> Result<PathBuf, StorageError> {
        let filename = format!("{}_summary.json", source.stem());

        let metadata = serde_json::json!({
            "source": source.to_string(),
            "candidates": report.candidates,
            "summaries": report.summaries().collect::<Vec<_>>(),
            "flagged_rows": report.flagged_rows,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let path = self.write_file(&filename, &metadata_str)?;
        tracing::info!("Saved summary metadata to {}", path.display());
        Ok(path)
    }
}
