//! CSV Exploratory Data Analyzer - Main Application
//!
//! This is the entry point for the CSV exploratory data analyzer application.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage (outputs reports to "reports" directory)
//! $ cargo run --release -- path/to/Titanic-Dataset.csv
//!
//! # With custom output directory
//! $ cargo run --release -- path/to/Titanic-Dataset.csv custom/output/dir
//! ```

use csv_eda_analyzer::eda_analyzer_main;

/// call from library
fn main() {
    eda_analyzer_main();
}
