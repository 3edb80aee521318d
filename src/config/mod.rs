// src/config/mod.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::ConfigError;

pub const DEFAULT_LOW_GRADE_THRESHOLD: f64 = 6.0;
pub const DEFAULT_CSV_FILENAME: &str = "grades-export.csv";
pub const MAX_THRESHOLD: f64 = 10.0;

/// Terms that mark a table as carrying grade data. Portuguese terms come from the
/// student portal this tool was first written for.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "disciplina", "matéria", "materia", "nota", "média", "media",
    "avaliacao", "avaliação", "bimestre", "semestre", "conceito",
    "subject", "grade", "score", "term", "semester", "assessment",
];

/// Settings for one pipeline invocation. Immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Normalized grades strictly below this value are flagged (0.0 - 10.0).
    pub low_grade_threshold: f64,

    /// File name handed to the CSV saver.
    pub csv_filename: String,

    /// Flag rows below the threshold.
    pub highlight_low_grades: bool,

    /// Re-run the summaries when the watched document changes.
    pub auto_calc_on_change: bool,

    /// Lowercase keywords searched for in table text.
    pub keyword_vocabulary: BTreeSet<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            low_grade_threshold: DEFAULT_LOW_GRADE_THRESHOLD,
            csv_filename: DEFAULT_CSV_FILENAME.to_string(),
            highlight_low_grades: true,
            auto_calc_on_change: true,
            keyword_vocabulary: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Configuration {
    /// Reports every malformed field. Used for diagnostics only; `sanitized` is what
    /// the pipeline consumes.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        let t = self.low_grade_threshold;
        if !t.is_finite() || !(0.0..=MAX_THRESHOLD).contains(&t) {
            problems.push(ConfigError::MalformedConfiguration(format!(
                "low grade threshold {} is outside [0, {}]",
                t, MAX_THRESHOLD
            )));
        }

        if !is_valid_filename(&self.csv_filename) {
            problems.push(ConfigError::MalformedConfiguration(format!(
                "invalid CSV filename {:?}",
                self.csv_filename
            )));
        }

        problems
    }

    /// Returns a copy with every malformed field clamped or replaced by its default.
    /// Never fails.
    pub fn sanitized(mut self) -> Self {
        for problem in self.validate() {
            tracing::warn!("{}; substituting a safe value", problem);
        }

        let t = self.low_grade_threshold;
        self.low_grade_threshold = if t.is_finite() {
            t.clamp(0.0, MAX_THRESHOLD)
        } else {
            DEFAULT_LOW_GRADE_THRESHOLD
        };

        let trimmed = self.csv_filename.trim().to_string();
        self.csv_filename = if is_valid_filename(&trimmed) {
            trimmed
        } else {
            DEFAULT_CSV_FILENAME.to_string()
        };

        self.keyword_vocabulary = self
            .keyword_vocabulary
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        self
    }
}

fn is_valid_filename(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

/// JSON-file backed preference store. Persistence sits here, at the boundary; the
/// pipeline only ever sees a `Configuration` value.
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Loads the stored preferences merged over the defaults. A missing, unreadable or
    /// corrupt file yields the defaults.
    pub fn load(&self) -> Configuration {
        match self.try_load() {
            Ok(Some(config)) => {
                tracing::debug!("Loaded preferences from {}", self.path.display());
                config
            }
            Ok(None) => {
                tracing::debug!("No preference file at {}, using defaults", self.path.display());
                Configuration::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load preferences from {}, using defaults: {}",
                    self.path.display(),
                    e
                );
                Configuration::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<Configuration>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)?;
        tracing::info!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    /// Overwrites the stored preferences with the defaults and returns them.
    pub fn reset(&self) -> Result<Configuration, ConfigError> {
        let defaults = Configuration::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}
