//! # Report Generation
//!
//! Writes the findings of an analysis run as a Markdown report and a plain
//! text report with fixed-width columns, next to the cleaned dataset.
//!
//! For an input `titanic.csv` the files are named:
//!
//! 1. `titanic_eda_report_[timestamp].md` - Markdown report
//! 2. `titanic_eda_report_[timestamp].txt` - Plain text version with formatted columns
//! 3. `titanic_cleaned_[timestamp].csv` - Dataset after preparation and outlier removal

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::eda_analyzer::EdaSummary;
use crate::error::Result;
use crate::statistics::CorrelationMatrix;

/// Maximum number of ranked outliers listed in a report.
const MAX_LISTED_OUTLIERS: usize = 20;

/// Output locations for one analyzed file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub text: PathBuf,
    pub cleaned_csv: PathBuf,
}

impl ReportPaths {
    /// Builds `[basename]_eda_report_[timestamp].md` / `.txt` and
    /// `[basename]_cleaned_[timestamp].csv` inside `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>, basename: &str, timestamp: &str) -> Self {
        let dir = output_dir.as_ref();
        ReportPaths {
            markdown: dir.join(format!("{}_eda_report_{}.md", basename, timestamp)),
            text: dir.join(format!("{}_eda_report_{}.txt", basename, timestamp)),
            cleaned_csv: dir.join(format!("{}_cleaned_{}.csv", basename, timestamp)),
        }
    }
}

/// Extracts the basename from a file path, up to the first `.`.
///
/// # Arguments
///
/// * `file_path` - The file path to extract basename from
///
/// # Returns
///
/// * `Result<String>` - The basename without extension or an `InvalidInput` I/O error
pub fn extract_basename(file_path: impl AsRef<Path>) -> Result<String> {
    let path_ref = file_path.as_ref();

    let filename = path_ref.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid file path: {:?}", path_ref),
        )
    })?;

    let filename_str = filename.to_string_lossy();
    Ok(filename_str
        .split('.')
        .next()
        .filter(|stem| !stem.is_empty())
        .unwrap_or("unknown")
        .to_string())
}

/// Generates a UTC timestamp string for unique filenames.
pub fn generate_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

fn fmt_number(value: f64) -> String {
    format!("{:.2}", value)
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map(fmt_number).unwrap_or_else(|| "-".to_string())
}

/// Escapes text for a Markdown table cell so `|` and line breaks keep the row intact.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pairs above the diagonal whose coefficient survived the threshold.
fn strong_pairs(matrix: &CorrelationMatrix) -> Vec<(String, String, f64)> {
    let mut pairs = Vec::new();
    for (i, row) in matrix.values.iter().enumerate() {
        for (j, value) in row.iter().enumerate().skip(i + 1) {
            if let Some(r) = value {
                pairs.push((matrix.columns[i].clone(), matrix.columns[j].clone(), *r));
            }
        }
    }
    // Strongest first
    pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
    pairs
}

/// Writes the Markdown report to a file.
pub fn generate_markdown_report(path: impl AsRef<Path>, summary: &EdaSummary) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_markdown_report(&mut out, summary)?;
    out.flush()?;
    Ok(())
}

/// Writes the Markdown report to any writer.
///
/// # Report Sections
///
/// * Dataset Overview - Shape, column names and a preview of the first rows
/// * Column Types - Kind and non-missing count per column
/// * Descriptive Statistics - Count, mean, std, min, quartiles and max per numeric column
/// * Missing Values - Count and share of missing cells per column
/// * Target Distribution - Value counts of the target column
/// * Data Preparation - Dropped columns, category mappings and median fills
/// * Correlations - Pairs above the configured threshold
/// * Outliers - Fences per feature and the most frequently flagged rows
/// * Cleaned Dataset - Removed rows and final shape
pub fn write_markdown_report<W: Write>(out: &mut W, summary: &EdaSummary) -> io::Result<()> {
    let (rows, columns) = summary.original_shape;

    writeln!(out, "# Exploratory Data Analysis for {}", summary.basename)?;
    writeln!(out, "\nAnalysis performed on {} rows and {} columns", rows, columns)?;

    writeln!(out, "\n## Dataset Overview")?;
    writeln!(out, "- **Columns**: {}", summary.columns.join(", "))?;
    writeln!(out, "- **Duplicate Rows**: {}", summary.duplicates)?;
    writeln!(out, "- **Text Columns**: {}", join_ids(&summary.text_columns))?;
    writeln!(out, "- **Numeric Columns**: {}", join_ids(&summary.numeric_columns))?;

    // Preview of the first rows
    let head = &summary.head;
    if head.row_count() > 0 {
        writeln!(out, "\n### First {} Rows", head.row_count())?;
        let header: Vec<String> = head.column_names().iter().map(|name| escape_cell(name)).collect();
        writeln!(out, "| Row | {} |", header.join(" | "))?;
        writeln!(out, "|-----|{}", "---|".repeat(head.column_names().len()))?;
        for (position, id) in head.row_ids().iter().enumerate() {
            let cells: Vec<String> = head
                .row(position)
                .iter()
                .map(|value| escape_cell(&value.to_string()))
                .collect();
            writeln!(out, "| {} | {} |", id, cells.join(" | "))?;
        }
    }

    writeln!(out, "\n## Column Types")?;
    writeln!(out, "| Column | Kind | Non-Missing |")?;
    writeln!(out, "|--------|------|-------------|")?;
    for info in &summary.column_info {
        writeln!(out, "| {} | {} | {} |", escape_cell(&info.column), info.kind, info.non_missing)?;
    }

    writeln!(out, "\n## Descriptive Statistics")?;
    writeln!(out, "| Column | Count | Mean | Std | Min | 25% | 50% | 75% | Max |")?;
    writeln!(out, "|--------|-------|------|-----|-----|-----|-----|-----|-----|")?;
    for stats in &summary.description {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&stats.column),
            stats.count,
            fmt_number(stats.mean),
            fmt_optional(stats.std_dev),
            fmt_number(stats.min),
            fmt_number(stats.q1),
            fmt_number(stats.median),
            fmt_number(stats.q3),
            fmt_number(stats.max)
        )?;
    }

    writeln!(out, "\n## Missing Values")?;
    writeln!(out, "| Column | Missing | Percentage |")?;
    writeln!(out, "|--------|---------|------------|")?;
    for missing in &summary.missing {
        writeln!(out, "| {} | {} | {:.2}% |", escape_cell(&missing.column), missing.missing, missing.percentage)?;
    }

    if let Some((target, counts)) = &summary.target_counts {
        writeln!(out, "\n## Target Distribution ({})", target)?;
        writeln!(out, "| Value | Count |")?;
        writeln!(out, "|-------|-------|")?;
        for (label, count) in counts {
            writeln!(out, "| {} | {} |", escape_cell(label), count)?;
        }
    }

    writeln!(out, "\n## Data Preparation")?;
    writeln!(out, "- **Dropped Columns**: {}", join_ids(&summary.dropped_columns))?;
    for mapping in &summary.category_mappings {
        let codes: Vec<String> = mapping
            .values
            .iter()
            .map(|(label, code)| format!("{} → {}", label, code))
            .collect();
        writeln!(
            out,
            "- **Mapped {}**: {} (unmapped: {:?})",
            mapping.column,
            codes.join(", "),
            mapping.unmapped
        )?;
    }
    for (column, median) in &summary.median_fills {
        writeln!(out, "- **Filled {}** with median {}", column, fmt_number(*median))?;
    }

    writeln!(
        out,
        "\n## Correlations (|r| ≥ {})",
        summary.correlation_threshold
    )?;
    let pairs = strong_pairs(&summary.correlations.strong(summary.correlation_threshold));
    if pairs.is_empty() {
        writeln!(out, "No column pairs reach the threshold.")?;
    } else {
        writeln!(out, "| Column A | Column B | Pearson r |")?;
        writeln!(out, "|----------|----------|-----------|")?;
        for (a, b, r) in &pairs {
            writeln!(out, "| {} | {} | {:.3} |", escape_cell(a), escape_cell(b), r)?;
        }
    }

    writeln!(out, "\n## Outliers (1.5 × IQR method)")?;
    writeln!(out, "| Feature | Q1 | Q3 | IQR | Lower Fence | Upper Fence | Flagged Rows |")?;
    writeln!(out, "|---------|----|----|-----|-------------|-------------|--------------|")?;
    for (fences, flagged) in summary.outliers.fences.iter().zip(&summary.outliers.flagged_per_feature) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&fences.feature),
            fmt_number(fences.q1),
            fmt_number(fences.q3),
            fmt_number(fences.iqr),
            fmt_number(fences.lower),
            fmt_number(fences.upper),
            flagged
        )?;
    }

    writeln!(out, "\n### Most Frequently Flagged Rows")?;
    if summary.outliers.ranked.is_empty() {
        writeln!(out, "No rows fall outside the fences of any feature.")?;
    } else {
        writeln!(out, "| Row | Features Flagged |")?;
        writeln!(out, "|-----|------------------|")?;
        for outlier in summary.outliers.ranked.iter().take(MAX_LISTED_OUTLIERS) {
            writeln!(out, "| {} | {} |", outlier.row, outlier.flags)?;
        }
        if summary.outliers.ranked.len() > MAX_LISTED_OUTLIERS {
            writeln!(
                out,
                "\nShowing {} of {} flagged rows.",
                MAX_LISTED_OUTLIERS,
                summary.outliers.ranked.len()
            )?;
        }
    }

    let (final_rows, final_columns) = summary.cleaned.shape();
    writeln!(out, "\n## Cleaned Dataset")?;
    writeln!(
        out,
        "- **Removed Rows** (top {}): {}",
        summary.outlier_top_n,
        join_ids(&summary.removed_rows)
    )?;
    writeln!(out, "- **Final Shape**: {} rows × {} columns", final_rows, final_columns)?;

    Ok(())
}

/// Writes the plain text report to a file.
pub fn generate_text_report(path: impl AsRef<Path>, summary: &EdaSummary) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_text_report(&mut out, summary)?;
    out.flush()?;
    Ok(())
}

/// Plain text version of the report with evenly spaced columns, for viewers
/// that do not render Markdown.
pub fn write_text_report<W: Write>(out: &mut W, summary: &EdaSummary) -> io::Result<()> {
    let (rows, columns) = summary.original_shape;

    writeln!(out, "EXPLORATORY DATA ANALYSIS FOR {}", summary.basename)?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "\nAnalysis performed on {} rows and {} columns", rows, columns)?;
    writeln!(out, "Duplicate rows: {}", summary.duplicates)?;

    writeln!(out, "\nCOLUMN TYPES")?;
    writeln!(out, "{}", "-".repeat(50))?;
    writeln!(out, "{:<20} {:<10} {:<12}", "Column", "Kind", "Non-Missing")?;
    for info in &summary.column_info {
        writeln!(out, "{:<20} {:<10} {:<12}", info.column, info.kind.to_string(), info.non_missing)?;
    }

    writeln!(out, "\nDESCRIPTIVE STATISTICS")?;
    writeln!(out, "{}", "-".repeat(100))?;
    writeln!(
        out,
        "{:<15} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
    )?;
    writeln!(out, "{}", "-".repeat(100))?;
    for stats in &summary.description {
        writeln!(
            out,
            "{:<15} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            stats.column,
            stats.count,
            fmt_number(stats.mean),
            fmt_optional(stats.std_dev),
            fmt_number(stats.min),
            fmt_number(stats.q1),
            fmt_number(stats.median),
            fmt_number(stats.q3),
            fmt_number(stats.max)
        )?;
    }

    writeln!(out, "\nMISSING VALUES")?;
    writeln!(out, "{}", "-".repeat(50))?;
    for missing in summary.missing.iter().filter(|missing| missing.missing > 0) {
        writeln!(
            out,
            "{:<20} {:>8} {:>8.2}%",
            missing.column, missing.missing, missing.percentage
        )?;
    }

    if let Some((target, counts)) = &summary.target_counts {
        writeln!(out, "\nTARGET DISTRIBUTION ({})", target)?;
        writeln!(out, "{}", "-".repeat(50))?;
        for (label, count) in counts {
            writeln!(out, "{:<20} {:>8}", label, count)?;
        }
    }

    writeln!(out, "\nDATA PREPARATION")?;
    writeln!(out, "{}", "-".repeat(50))?;
    writeln!(out, "Dropped columns: {}", join_ids(&summary.dropped_columns))?;
    for (column, median) in &summary.median_fills {
        writeln!(out, "Filled {} with median {}", column, fmt_number(*median))?;
    }

    writeln!(out, "\nSTRONG CORRELATIONS (|r| >= {})", summary.correlation_threshold)?;
    writeln!(out, "{}", "-".repeat(50))?;
    for (a, b, r) in strong_pairs(&summary.correlations.strong(summary.correlation_threshold)) {
        writeln!(out, "{:<15} {:<15} {:>8.3}", a, b, r)?;
    }

    writeln!(out, "\nOUTLIER DETECTION THRESHOLDS (1.5 × IQR method)")?;
    writeln!(out, "{}", "-".repeat(80))?;
    writeln!(
        out,
        "{:<15} {:>10} {:>10} {:>12} {:>12} {:>10}",
        "Feature", "Q1", "Q3", "Lower", "Upper", "Flagged"
    )?;
    writeln!(out, "{}", "-".repeat(80))?;
    for (fences, flagged) in summary.outliers.fences.iter().zip(&summary.outliers.flagged_per_feature) {
        writeln!(
            out,
            "{:<15} {:>10} {:>10} {:>12} {:>12} {:>10}",
            fences.feature,
            fmt_number(fences.q1),
            fmt_number(fences.q3),
            fmt_number(fences.lower),
            fmt_number(fences.upper),
            flagged
        )?;
    }

    writeln!(out, "\nMOST FREQUENTLY FLAGGED ROWS")?;
    writeln!(out, "{}", "-".repeat(50))?;
    writeln!(out, "{:<10} {:<16}", "Row", "Features Flagged")?;
    for outlier in summary.outliers.ranked.iter().take(MAX_LISTED_OUTLIERS) {
        writeln!(out, "{:<10} {:<16}", outlier.row.to_string(), outlier.flags)?;
    }

    let (final_rows, final_columns) = summary.cleaned.shape();
    writeln!(out, "\nCLEANED DATASET")?;
    writeln!(out, "{}", "-".repeat(50))?;
    writeln!(out, "Removed rows:  {}", join_ids(&summary.removed_rows))?;
    writeln!(out, "Final shape:   {} rows x {} columns", final_rows, final_columns)?;

    Ok(())
}

/// Print success message after processing a CSV file
pub fn print_success_message(basename: &str, paths: &ReportPaths) {
    println!("Generated three files with prefix '{}_':", basename);
    println!("  1. {} - Markdown report with statistics, correlations and outliers", paths.markdown.display());
    println!("  2. {} - Plain text version with evenly spaced columns", paths.text.display());
    println!("  3. {} - Cleaned dataset with outlier rows removed", paths.cleaned_csv.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdaConfig;
    use crate::eda_analyzer::run_analysis;
    use crate::table::Table;

    #[test]
    fn test_extract_basename() {
        assert_eq!(extract_basename("data/Titanic-Dataset.csv").unwrap(), "Titanic-Dataset");
        assert_eq!(extract_basename("archive.tar.csv").unwrap(), "archive");
        assert_eq!(extract_basename(".hidden").unwrap(), "unknown");
        assert!(extract_basename("/").is_err());
    }

    #[test]
    fn test_report_paths() {
        let paths = ReportPaths::new("reports", "titanic", "20240101_120000");
        assert_eq!(paths.markdown, Path::new("reports/titanic_eda_report_20240101_120000.md"));
        assert_eq!(paths.text, Path::new("reports/titanic_eda_report_20240101_120000.txt"));
        assert_eq!(paths.cleaned_csv, Path::new("reports/titanic_cleaned_20240101_120000.csv"));
    }

    #[test]
    fn test_timestamp_shape() {
        let timestamp = generate_timestamp();
        assert_eq!(timestamp.len(), 15);
        assert_eq!(timestamp.as_bytes()[8], b'_');
    }

    #[test]
    fn test_markdown_cells_escape_pipes() {
        let table = Table::from_csv_reader(
            "Name,Fare\n\"Smith | Jr\",7\nJones,8\nBrown,9\nLee,100\n".as_bytes(),
        )
        .unwrap();
        let config = EdaConfig {
            target_column: None,
            drop_columns: Vec::new(),
            category_mappings: Vec::new(),
            fill_median_columns: Vec::new(),
            outlier_features: Some(vec!["Fare".to_string()]),
            outlier_top_n: 1,
            ..EdaConfig::default()
        };
        let summary = run_analysis(&table, "fares", &config).unwrap();

        let mut buffer = Vec::new();
        write_markdown_report(&mut buffer, &summary).unwrap();
        let markdown = String::from_utf8(buffer).unwrap();

        assert!(markdown.contains("| 0 | Smith \\| Jr | 7 |"));
        assert!(!markdown.contains("Smith | Jr"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b"), "a\\|b");
        assert_eq!(escape_cell("line\nbreak"), "line break");
        assert_eq!(escape_cell("plain"), "plain");
    }

    #[test]
    fn test_strong_pairs_upper_triangle() {
        let matrix = CorrelationMatrix {
            columns: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            values: vec![
                vec![Some(1.0), Some(0.6), None],
                vec![Some(0.6), Some(1.0), Some(-0.9)],
                vec![None, Some(-0.9), Some(1.0)],
            ],
        };
        let pairs = strong_pairs(&matrix);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("B".to_string(), "C".to_string(), -0.9));
    }
}
