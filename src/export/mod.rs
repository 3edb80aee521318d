// src/export/mod.rs
pub mod serializer;

pub use serializer::{to_csv, CsvTable};
