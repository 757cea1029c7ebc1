//! Error types shared by every analysis step.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A requested column name does not exist in the table.
    #[error("Missing column: '{column}' is not present in the table")]
    MissingColumn { column: String },

    /// A column cannot produce numeric quartiles or medians.
    #[error("Invalid feature '{column}': {reason}")]
    InvalidFeature { column: String, reason: String },

    /// Outlier detection was asked to run over zero features.
    #[error("No features given for outlier detection")]
    NoFeatures,

    #[error("Unmapped category '{value}' in column '{column}'")]
    UnmappedCategory { column: String, value: String },

    #[error("Column '{column}' has {found} values, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Dataset has no header row: {path}")]
    EmptyDataset { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
