//! # CSV Exploratory Data Analyzer
//!
//! Loads a tabular CSV dataset, reports summary statistics, prepares its
//! columns for modelling and removes the rows most frequently flagged as
//! outliers by the 1.5 × IQR rule.
//!
//! ## Features
//!
//! - ISO-8859-1 CSV loading into a column-major [`Table`] with stable row ids
//! - Descriptive statistics, missing values, duplicates, value counts and correlations
//! - Column dropping, categorical-to-numeric mapping and median imputation
//! - IQR outlier detection ranked across features ([`detect_outliers`])
//! - Markdown and plain text reports plus the cleaned dataset
//!
//! ## Usage
//!
//! ### As a library
//!
//! ```rust
//! use csv_eda_analyzer::{Table, detect_outliers};
//!
//! let table = Table::from_csv_reader("Fare\n7.25\n8.05\n7.92\n8.46\n512.33\n".as_bytes()).unwrap();
//! let outliers = detect_outliers(&table, 5, &["Fare"]).unwrap();
//! assert_eq!(outliers.len(), 1);
//! ```
//!
//! ### From command line
//!
//! ```bash
//! # Analyze a single CSV file
//! $ cargo run --release -- path/to/Titanic-Dataset.csv
//!
//! # Analyze all CSV files in a directory
//! $ cargo run --release -- --directory path/to/csv/files
//! ```

pub mod config;
pub mod eda_analyzer;
pub mod error;
pub mod outlier_detector;
pub mod report;
pub mod statistics;
pub mod table;
pub mod transform;

pub use config::EdaConfig;
pub use eda_analyzer::{analyze_dataset, eda_analyzer_main, run_analysis};
pub use error::{AnalysisError, Result};
pub use outlier_detector::detect_outliers;
pub use table::{RowId, Table, Value};
