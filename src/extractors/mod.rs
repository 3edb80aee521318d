// src/extractors/mod.rs
pub mod aggregator;
pub mod number;
pub mod scorer;
pub mod selector;

// Re-export key extraction types for convenience
pub use aggregator::{GradeAggregator, TableAggregate, TableSummary};
pub use scorer::TableScorer;
pub use selector::{TableCandidate, TableSelector};
