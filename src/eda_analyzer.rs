//! # EDA Pipeline
//!
//! Runs the full exploratory analysis of one CSV file, or of every CSV file
//! in a directory, and writes the reports described in [`crate::report`].
//!
//! ## Usage
//!
//! ```bash
//! # Analyze a single CSV file
//! $ cargo run --release -- path/to/Titanic-Dataset.csv
//!
//! # Analyze a single file with custom output directory and config
//! $ cargo run --release -- path/to/Titanic-Dataset.csv custom/output/dir --config eda.json
//!
//! # Analyze all CSV files in a directory
//! $ cargo run --release -- --directory path/to/csv/files
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{CategoryMapping, EdaConfig};
use crate::error::Result;
use crate::outlier_detector::{OutlierReport, analyze_outliers};
use crate::report::{
    ReportPaths, extract_basename, generate_markdown_report, generate_text_report,
    generate_timestamp, print_success_message,
};
use crate::statistics::{
    ColumnInfo, ColumnSummary, CorrelationMatrix, MissingCount, column_info, correlation_matrix,
    describe, duplicate_rows, missing_counts, value_counts,
};
use crate::table::{RowId, Table};
use crate::transform::{drop_columns, fill_missing_with_median, map_categories};

/// Everything one analysis run found, in pipeline order.
#[derive(Debug, Clone)]
pub struct EdaSummary {
    pub basename: String,
    pub original_shape: (usize, usize),
    pub columns: Vec<String>,
    pub head: Table,
    pub column_info: Vec<ColumnInfo>,
    pub description: Vec<ColumnSummary>,
    pub missing: Vec<MissingCount>,
    pub duplicates: usize,
    pub target_counts: Option<(String, Vec<(String, usize)>)>,
    pub text_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub category_mappings: Vec<CategoryMapping>,
    /// Computed after the category mappings, before median fills.
    pub correlations: CorrelationMatrix,
    pub correlation_threshold: f64,
    pub median_fills: Vec<(String, f64)>,
    pub outliers: OutlierReport,
    pub outlier_top_n: usize,
    pub removed_rows: Vec<RowId>,
    /// Prepared table with outlier rows removed and the index reset.
    pub cleaned: Table,
}

/// Runs every analysis step against an in-memory table.
///
/// The input table is never modified; each preparation step produces a new
/// table that is passed to the next one.
///
/// # Arguments
///
/// * `table` - The loaded dataset
/// * `basename` - Name used in report headings
/// * `config` - Columns to drop, map and fill, and outlier settings
///
/// # Returns
///
/// * `Result<EdaSummary>` - All findings, or the first error from a step
pub fn run_analysis(table: &Table, basename: &str, config: &EdaConfig) -> Result<EdaSummary> {
    // Record the original shape for the overview section
    let (rows, columns) = table.shape();
    info!(dataset = basename, rows, columns, "starting preliminary analysis");

    // Count target values before any column is dropped or remapped
    let target_counts = match &config.target_column {
        Some(target) if table.has_column(target) => Some((target.clone(), value_counts(table, target)?)),
        Some(target) => {
            warn!(column = %target, "target column not found, skipping value counts");
            None
        }
        None => None,
    };

    // Prepare the data for modelling
    let mut prepared = drop_columns(table, &config.drop_columns)?;

    // Encode categorical columns as numbers
    for mapping in &config.category_mappings {
        prepared = map_categories(&prepared, &mapping.column, &mapping.values, mapping.unmapped)?;
    }

    // Correlations see the encoded columns but not the median fills
    let correlations = correlation_matrix(&prepared)?;

    // Fill remaining gaps with each column's median
    let mut median_fills = Vec::with_capacity(config.fill_median_columns.len());
    for column in &config.fill_median_columns {
        let (filled, median) = fill_missing_with_median(&prepared, column)?;
        prepared = filled;
        median_fills.push((column.clone(), median));
    }

    // Detect outliers over the configured features, or every numeric column
    let features = match &config.outlier_features {
        Some(features) => features.clone(),
        None => prepared.numeric_columns(),
    };
    let outliers = analyze_outliers(&prepared, &features)?;
    let removed_rows = outliers.top(config.outlier_top_n);
    info!(
        features = features.len(),
        flagged = outliers.ranked.len(),
        removed = removed_rows.len(),
        "outlier detection finished"
    );

    // Remove the most frequently flagged rows and renumber the rest
    let cleaned = prepared.drop_rows(&removed_rows).reset_index();

    Ok(EdaSummary {
        basename: basename.to_string(),
        original_shape: (rows, columns),
        columns: table.column_names().to_vec(),
        head: table.head(config.head_rows),
        column_info: column_info(table)?,
        description: describe(table)?,
        missing: missing_counts(table)?,
        duplicates: duplicate_rows(table),
        target_counts,
        text_columns: table.text_columns(),
        numeric_columns: table.numeric_columns(),
        dropped_columns: config.drop_columns.clone(),
        category_mappings: config.category_mappings.clone(),
        correlations,
        correlation_threshold: config.correlation_threshold,
        median_fills,
        outliers,
        outlier_top_n: config.outlier_top_n,
        removed_rows,
        cleaned,
    })
}

/// Analyzes a CSV file and writes its reports and cleaned dataset.
///
/// # Arguments
///
/// * `input_file_path` - Path to the input CSV file to analyze
/// * `output_directory_path` - Directory where report files will be saved (created if it doesn't exist)
/// * `config` - Analysis parameters
///
/// # Returns
///
/// * `Result<(EdaSummary, ReportPaths)>` - The findings and where they were written
pub fn analyze_dataset(
    input_file_path: impl AsRef<Path>,
    output_directory_path: impl AsRef<Path>,
    config: &EdaConfig,
) -> Result<(EdaSummary, ReportPaths)> {
    // Ensure output directory exists
    fs::create_dir_all(&output_directory_path)?;

    // Extract the basename and build timestamped output paths
    let input_basename = extract_basename(&input_file_path)?;
    let timestamp = generate_timestamp();
    let paths = ReportPaths::new(&output_directory_path, &input_basename, &timestamp);

    // Load the dataset and run every analysis step
    let table = Table::from_csv_path(&input_file_path)?;
    let summary = run_analysis(&table, &input_basename, config)?;

    // Write both reports and the cleaned dataset
    generate_markdown_report(&paths.markdown, &summary)?;
    generate_text_report(&paths.text, &summary)?;
    summary.cleaned.write_csv(&paths.cleaned_csv)?;

    info!(dataset = %input_basename, output = %output_directory_path.as_ref().display(), "reports written");
    Ok((summary, paths))
}

/// Process all CSV files in a directory and generate analysis reports for each.
///
/// Files are matched by a case-insensitive `.csv` extension and processed in
/// name order. A failing file is logged and skipped; the remaining files are
/// still processed.
///
/// # Returns
///
/// * `Result<usize>` - Number of successfully processed files, or an I/O error reading the directory
pub fn process_directory(
    directory_path: impl AsRef<Path>,
    output_directory: impl AsRef<Path>,
    config: &EdaConfig,
) -> Result<usize> {
    // Collect CSV files, sorted for a stable processing order
    let mut csv_paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(directory_path)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_lowercase() == "csv")
            .unwrap_or(false);
        if path.is_file() && is_csv {
            csv_paths.push(path);
        }
    }
    csv_paths.sort();

    let mut processed_count = 0;
    for path in csv_paths {
        let basename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_string();

        println!("Processing CSV file: {}", basename);

        match analyze_dataset(&path, &output_directory, config) {
            Ok((summary, paths)) => {
                processed_count += 1;
                print_success_message(&summary.basename, &paths);
            }
            Err(e) => {
                error!(file = %basename, error = %e, "analysis failed");
                eprintln!("Error analyzing CSV file {}: {}", basename, e);
            }
        }
    }

    Ok(processed_count)
}

/// Represents the source of CSV files to process
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// A single file to process
    SingleFile(PathBuf),
    /// A directory containing multiple CSV files to process
    Directory(PathBuf),
}

#[derive(Parser, Debug)]
#[command(name = "csv_eda_analyzer")]
#[command(about = "Exploratory data analysis and IQR outlier cleaning for CSV datasets")]
pub struct Args {
    /// Input CSV file, then optional output directory (or only the output directory with --directory)
    #[arg(value_name = "PATH", num_args = 0..=2)]
    pub paths: Vec<PathBuf>,

    /// Analyze every CSV file in this directory
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// JSON file overriding the default analysis parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of most frequently flagged outlier rows to remove
    #[arg(long)]
    pub top_n: Option<usize>,
}

/// Default directory for reports when none is given.
const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Resolves the positional paths into an input source and output directory.
///
/// # Returns
///
/// * `Result<(InputSource, PathBuf), String>` - Tuple of (input_source, output_dir) or error message
pub fn parse_arguments(args: &Args) -> std::result::Result<(InputSource, PathBuf), String> {
    match &args.directory {
        Some(directory) => {
            if args.paths.len() > 1 {
                return Err("--directory accepts only one extra argument: the output directory".to_string());
            }
            let output_dir = args
                .paths
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
            Ok((InputSource::Directory(directory.clone()), output_dir))
        }
        None => {
            let input = args
                .paths
                .first()
                .cloned()
                .ok_or_else(|| "Missing input argument. Use a file path or --directory <path>".to_string())?;
            let output_dir = args
                .paths
                .get(1)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
            Ok((InputSource::SingleFile(input), output_dir))
        }
    }
}

/// Builds the run configuration from the optional config file and CLI overrides.
pub fn load_config(args: &Args) -> anyhow::Result<EdaConfig> {
    let mut config = match &args.config {
        Some(path) => EdaConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => EdaConfig::default(),
    };
    if let Some(top_n) = args.top_n {
        config.outlier_top_n = top_n;
    }
    Ok(config)
}

/// Installs the `tracing` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CSV exploratory data analyzer application.
///
/// # Command Line Arguments
///
/// * Single file mode: `<program> <input_csv_path> [output_directory]`
/// * Directory mode: `<program> --directory <directory_path> [output_directory]`
/// * Options: `--config <json>`, `--top-n <n>`
///
/// # Workflow
///
/// 1. Parse and validate command line arguments
/// 2. Load the analysis configuration
/// 3. Process the input (file or directory)
/// 4. Display success information or error messages
pub fn eda_analyzer_main() {
    init_logging();

    let args = Args::parse();

    let (input_source, output_dir) = parse_arguments(&args).unwrap_or_else(|err| {
        eprintln!("Error parsing arguments: {}", err);
        eprintln!("Usage: csv_eda_analyzer <input_csv_path> [output_directory]");
        eprintln!("   or: csv_eda_analyzer --directory <directory_path> [output_directory]");
        eprintln!("Example: csv_eda_analyzer Titanic-Dataset.csv ./my_reports");
        process::exit(1);
    });

    let config = load_config(&args).unwrap_or_else(|err| {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    });

    println!("Reports will be saved to: {}", output_dir.display());

    match input_source {
        InputSource::SingleFile(input_file) => {
            println!("Analyzing CSV file: {}", input_file.display());

            let result = analyze_dataset(&input_file, &output_dir, &config)
                .with_context(|| format!("Error analyzing CSV file {}", input_file.display()));
            match result {
                Ok((summary, paths)) => {
                    println!(
                        "Indexes of outliers to remove: [{}]",
                        summary
                            .removed_rows
                            .iter()
                            .map(|id| id.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    print_success_message(&summary.basename, &paths);
                }
                Err(e) => {
                    eprintln!("{:#}", e);
                    process::exit(1);
                }
            }
        }
        InputSource::Directory(dir_path) => {
            println!("Analyzing all CSV files in directory: {}", dir_path.display());

            match process_directory(&dir_path, &output_dir, &config) {
                Ok(file_count) => {
                    println!("Successfully processed {} CSV files from directory", file_count);
                }
                Err(e) => {
                    eprintln!("Error processing directory: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    const TITANIC_SAMPLE: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
1,0,3,Braund,male,22,1,0,A/5 21171,7.25,,S
2,1,1,Cumings,female,38,1,0,PC 17599,71.2833,C85,C
3,1,3,Heikkinen,female,26,0,0,STON/O2,7.925,,S
4,1,1,Futrelle,female,35,1,0,113803,53.1,C123,S
5,0,3,Allen,male,35,0,0,373450,8.05,,S
6,0,3,Moran,male,,0,0,330877,8.4583,,Q
7,0,1,McCarthy,male,54,0,0,17463,51.8625,E46,S
8,0,3,Palsson,male,2,3,1,349909,21.075,,S
9,1,3,Johnson,female,27,0,2,347742,11.1333,,S
10,1,2,Nasser,female,14,1,0,237736,30.0708,,C
11,1,3,Sandstrom,female,4,1,1,PP 9549,16.7,G6,S
12,1,1,Bonnell,female,58,0,0,113783,26.55,C103,S
13,0,3,Saundercock,male,20,0,0,A/5. 2151,8.05,,S
14,0,3,Andersson,male,39,1,5,347082,31.275,,S
15,0,3,Vestrom,female,14,0,0,350406,7.8542,,S
16,1,2,Hewlett,female,55,0,0,248706,16,,
17,0,3,Rice,male,2,4,1,382652,29.125,,Q
18,1,2,Williams,male,,0,0,244373,13,,S
19,0,3,Vander Planke,female,31,1,0,345763,18,,S
20,1,3,Masselmani,female,,0,0,2649,7.225,,C
";

    fn sample_table() -> Table {
        Table::from_csv_reader(TITANIC_SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_run_analysis_with_defaults() {
        let summary = run_analysis(&sample_table(), "titanic", &EdaConfig::default()).unwrap();

        assert_eq!(summary.original_shape, (20, 12));
        assert_eq!(summary.duplicates, 0);
        assert_eq!(
            summary.target_counts,
            Some((
                "Survived".to_string(),
                vec![("0".to_string(), 10), ("1".to_string(), 10)]
            ))
        );
        assert_eq!(summary.text_columns, vec!["Name", "Sex", "Ticket", "Cabin", "Embarked"]);

        // Age median over the 17 known ages, Embarked median after mapping S/C/Q
        assert_eq!(summary.median_fills[0], ("Age".to_string(), 27.0));
        assert_eq!(summary.median_fills[1], ("Embarked".to_string(), 1.0));

        assert_eq!(summary.cleaned.row_count(), 20 - summary.removed_rows.len());
        assert!(summary.removed_rows.len() <= 5);
        assert_eq!(
            summary.cleaned.column_names(),
            &["Survived", "Pclass", "Sex", "Age", "SibSp", "Parch", "Fare", "Embarked"]
        );
        assert_eq!(summary.cleaned.text_columns(), Vec::<String>::new());
    }

    #[test]
    fn test_run_analysis_removes_top_outliers() {
        let config = EdaConfig {
            outlier_features: Some(vec!["Parch".to_string(), "SibSp".to_string()]),
            outlier_top_n: 1,
            ..EdaConfig::default()
        };
        let summary = run_analysis(&sample_table(), "titanic", &config).unwrap();

        // Palsson (row 7) and Rice (row 16) are flagged by both features; ties go to the earlier row
        assert_eq!(summary.removed_rows, vec![RowId(7)]);
        assert_eq!(summary.outliers.ranked[1].row, RowId(16));
        assert_eq!(summary.outliers.ranked[1].flags, 2);
        assert!(summary.outliers.ranked.iter().any(|o| o.row == RowId(13)));
        assert_eq!(summary.cleaned.row_ids().last(), Some(&RowId(18)));
    }

    #[test]
    fn test_run_analysis_missing_drop_column() {
        let config = EdaConfig {
            drop_columns: vec!["Boat".to_string()],
            ..EdaConfig::default()
        };
        let result = run_analysis(&sample_table(), "titanic", &config);
        assert!(matches!(result, Err(AnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn test_run_analysis_without_target() {
        let config = EdaConfig {
            target_column: Some("Boat".to_string()),
            ..EdaConfig::default()
        };
        let summary = run_analysis(&sample_table(), "titanic", &config).unwrap();
        assert!(summary.target_counts.is_none());
    }

    #[test]
    fn test_run_analysis_empty_feature_list() {
        let config = EdaConfig {
            outlier_features: Some(Vec::new()),
            ..EdaConfig::default()
        };
        let result = run_analysis(&sample_table(), "titanic", &config);
        assert!(matches!(result, Err(AnalysisError::NoFeatures)));
    }

    #[test]
    fn test_run_analysis_repeated_feature_names() {
        let repeated = EdaConfig {
            outlier_features: Some(vec!["Parch".to_string(), "Parch".to_string(), "SibSp".to_string()]),
            outlier_top_n: 3,
            ..EdaConfig::default()
        };
        let summary = run_analysis(&sample_table(), "titanic", &repeated).unwrap();

        assert_eq!(summary.outliers.fences.len(), 2);
        assert!(summary.outliers.ranked.iter().all(|outlier| outlier.flags <= 2));
        assert_eq!(summary.removed_rows, vec![RowId(7), RowId(16), RowId(8)]);
    }

    #[test]
    fn test_parse_arguments_single_file() {
        let args = Args::try_parse_from(["csv_eda_analyzer", "titanic.csv"]).unwrap();
        let (source, output) = parse_arguments(&args).unwrap();
        assert_eq!(source, InputSource::SingleFile(PathBuf::from("titanic.csv")));
        assert_eq!(output, PathBuf::from("reports"));

        let args = Args::try_parse_from(["csv_eda_analyzer", "titanic.csv", "out"]).unwrap();
        let (_, output) = parse_arguments(&args).unwrap();
        assert_eq!(output, PathBuf::from("out"));
    }

    #[test]
    fn test_parse_arguments_directory() {
        let args = Args::try_parse_from(["csv_eda_analyzer", "--directory", "data", "out"]).unwrap();
        let (source, output) = parse_arguments(&args).unwrap();
        assert_eq!(source, InputSource::Directory(PathBuf::from("data")));
        assert_eq!(output, PathBuf::from("out"));
    }

    #[test]
    fn test_parse_arguments_missing_input() {
        let args = Args::try_parse_from(["csv_eda_analyzer"]).unwrap();
        assert!(parse_arguments(&args).is_err());
    }

    #[test]
    fn test_load_config_applies_top_n() {
        let args = Args::try_parse_from(["csv_eda_analyzer", "titanic.csv", "--top-n", "3"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.outlier_top_n, 3);
    }
}
