//! # Descriptive Statistics
//!
//! Summary statistics over the columns of a [`Table`]: per-column
//! descriptions, missing-value counts, duplicate rows, value counts and a
//! Pearson correlation matrix.
//!
//! ## Percentile method
//!
//! Every quartile and median in this crate is computed with
//! [`percentile_linear`]: linear interpolation between the closest ranks of
//! the sorted values, at position `q * (len - 1)`. This is the default of
//! numpy's `percentile` and pandas' `quantile`, so results line up with those
//! tools on the same data.

use std::collections::{HashMap, HashSet};

use crate::error::{AnalysisError, Result};
use crate::table::{ColumnKind, Table, Value};

/// Linear-interpolation percentile over values that are already sorted ascending.
///
/// # Arguments
///
/// * `sorted` - Values sorted ascending, without NaN
/// * `q` - Fraction in `[0, 1]` (0.25 for Q1, 0.5 for the median)
///
/// # Returns
///
/// * `Option<f64>` - `None` if `sorted` is empty
pub fn percentile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        Some(sorted[lower])
    } else {
        let frac = pos - lower as f64;
        Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
    }
}

/// Median of unsorted values, `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_copy(values);
    percentile_linear(&sorted, 0.5)
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Collects the numbers of a column, skipping missing cells.
///
/// # Errors
///
/// * `MissingColumn` if the column does not exist
/// * `InvalidFeature` if the column holds any text value
pub fn numeric_values(table: &Table, column: &str) -> Result<Vec<f64>> {
    let mut numbers = Vec::new();
    for value in table.column(column)? {
        match value {
            Value::Number(number) => numbers.push(*number),
            Value::Missing => {}
            Value::Text(text) => {
                return Err(AnalysisError::InvalidFeature {
                    column: column.to_string(),
                    reason: format!("non-numeric value '{}'", text),
                });
            }
        }
    }
    Ok(numbers)
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1). `None` with fewer than two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Calculate descriptive statistics for a set of values.
///
/// # Returns
///
/// * `Option<ColumnSummary>` - `None` when `values` is empty
pub fn calculate_statistics(column: &str, values: &[f64]) -> Option<ColumnSummary> {
    let sorted = sorted_copy(values);
    let len = sorted.len();
    let min = *sorted.first()?;
    let max = *sorted.last()?;

    let mean = sorted.iter().sum::<f64>() / len as f64;

    let std_dev = if len > 1 {
        let variance = sorted
            .iter()
            .map(|&x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / (len - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };

    Some(ColumnSummary {
        column: column.to_string(),
        count: len,
        mean,
        std_dev,
        min,
        q1: percentile_linear(&sorted, 0.25)?,
        median: percentile_linear(&sorted, 0.5)?,
        q3: percentile_linear(&sorted, 0.75)?,
        max,
    })
}

/// Describes every numeric column of the table, in table order.
pub fn describe(table: &Table) -> Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::new();
    for name in table.numeric_columns() {
        let values = numeric_values(table, &name)?;
        if let Some(summary) = calculate_statistics(&name, &values) {
            summaries.push(summary);
        }
    }
    Ok(summaries)
}

/// Type and non-missing count of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub column: String,
    pub kind: ColumnKind,
    pub non_missing: usize,
}

/// Type and non-missing count of every column, in table order.
pub fn column_info(table: &Table) -> Result<Vec<ColumnInfo>> {
    table
        .column_names()
        .iter()
        .map(|name| {
            let values = table.column(name)?;
            Ok(ColumnInfo {
                column: name.clone(),
                kind: table.column_kind(name)?,
                non_missing: values.iter().filter(|value| !value.is_missing()).count(),
            })
        })
        .collect()
}

/// Number and share of missing cells in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
    /// Share of rows that are missing, in percent.
    pub percentage: f64,
}

/// Missing-value count for every column.
pub fn missing_counts(table: &Table) -> Result<Vec<MissingCount>> {
    let rows = table.row_count();
    table
        .column_names()
        .iter()
        .map(|name| {
            let missing = table
                .column(name)?
                .iter()
                .filter(|value| value.is_missing())
                .count();
            let percentage = if rows == 0 {
                0.0
            } else {
                missing as f64 / rows as f64 * 100.0
            };
            Ok(MissingCount {
                column: name.clone(),
                missing,
                percentage,
            })
        })
        .collect()
}

/// Number of rows identical, across every column, to an earlier row.
pub fn duplicate_rows(table: &Table) -> usize {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut duplicates = 0;
    for position in 0..table.row_count() {
        let key: Vec<String> = table
            .row(position)
            .iter()
            .map(|value| match value {
                // Keep missing distinct from an empty text cell
                Value::Missing => "\u{0}".to_string(),
                other => other.to_string(),
            })
            .collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    duplicates
}

/// Distinct values of a column with their counts.
///
/// Sorted by count descending; ties keep first-appearance order. Missing
/// values are not counted.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in table.column(column)? {
        if value.is_missing() {
            continue;
        }
        let label = value.to_string();
        let count = counts.entry(label.clone()).or_insert(0);
        if *count == 0 {
            order.push(label);
        }
        *count += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|label| {
            let count = counts.get(&label).copied().unwrap_or(0);
            (label, count)
        })
        .collect();
    // Stable sort keeps first-appearance order for equal counts
    result.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(result)
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` is the correlation of `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Masks every coefficient whose magnitude is below `threshold`.
    pub fn strong(&self, threshold: f64) -> CorrelationMatrix {
        CorrelationMatrix {
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|value| value.filter(|r| r.abs() >= threshold))
                        .collect()
                })
                .collect(),
        }
    }

    /// Coefficient between two named columns, `None` if undefined or unknown.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|name| name == a)?;
        let j = self.columns.iter().position(|name| name == b)?;
        self.values[i][j]
    }
}

/// Pearson correlation over pairwise-complete observations.
///
/// Rows where either column is missing are skipped for that pair. A pair with
/// fewer than two complete observations, or zero variance on either side,
/// yields `None`.
pub fn correlation_matrix(table: &Table) -> Result<CorrelationMatrix> {
    let columns = table.numeric_columns();
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| {
            table
                .column(name)
                .map(|values| values.iter().map(Value::as_number).collect())
        })
        .collect::<Result<_>>()?;

    let values = data
        .iter()
        .map(|x| data.iter().map(|y| pearson(x, y)).collect())
        .collect();

    Ok(CorrelationMatrix { columns, values })
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x.sqrt() * var_y.sqrt()))
}
