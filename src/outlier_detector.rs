//! # Outlier Detector
//!
//! Flags rows that fall outside the 1.5 × IQR fences of one or more numeric
//! features and ranks them by how many features flagged them.
//!
//! For each feature independently:
//!
//! 1. Q1 and Q3 are computed over the feature's values across all rows, using
//!    [`percentile_linear`](crate::statistics::percentile_linear).
//! 2. IQR = Q3 - Q1, fence width = 1.5 × IQR.
//! 3. A row is flagged when its value is strictly below `Q1 - fence` or
//!    strictly above `Q3 + fence`. Both bounds test the same table.
//!
//! Flags are tallied per row. Rows are ranked by descending tally, ties broken
//! by ascending row position, and the first `n` are returned.
//!
//! Missing cells are skipped when computing quartiles and are never flagged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::statistics::{numeric_values, percentile_linear, sorted_copy};
use crate::table::{RowId, Table, Value};

/// Multiplier applied to the IQR to get the fence width.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Quartiles and fence bounds of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFences {
    pub feature: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl FeatureFences {
    /// True when `value` lies strictly outside `[lower, upper]`.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// A flagged row and the number of features that flagged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedOutlier {
    pub row: RowId,
    pub flags: usize,
}

/// Full result of a detection run, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub fences: Vec<FeatureFences>,
    /// Number of rows each feature flagged, aligned with `fences`.
    pub flagged_per_feature: Vec<usize>,
    /// Every flagged row, ranked. Not truncated.
    pub ranked: Vec<RankedOutlier>,
}

impl OutlierReport {
    /// The first `n` ranked row ids.
    pub fn top(&self, n: usize) -> Vec<RowId> {
        self.ranked.iter().take(n).map(|outlier| outlier.row).collect()
    }
}

/// Computes the fences of a single feature.
///
/// # Errors
///
/// * `MissingColumn` if the feature is not a column of `table`
/// * `InvalidFeature` if the column holds text or has no numeric values
pub fn feature_fences(table: &Table, feature: &str) -> Result<FeatureFences> {
    let values = numeric_values(table, feature)?;
    let sorted = sorted_copy(&values);

    let (q1, q3) = match (percentile_linear(&sorted, 0.25), percentile_linear(&sorted, 0.75)) {
        (Some(q1), Some(q3)) => (q1, q3),
        _ => {
            return Err(AnalysisError::InvalidFeature {
                column: feature.to_string(),
                reason: "no numeric values to compute quartiles".to_string(),
            });
        }
    };

    let iqr = q3 - q1;
    let step = IQR_MULTIPLIER * iqr;
    Ok(FeatureFences {
        feature: feature.to_string(),
        q1,
        q3,
        iqr,
        lower: q1 - step,
        upper: q3 + step,
    })
}

/// Runs detection over every feature and returns the ranked, untruncated tally.
///
/// Features form a set: a name listed more than once is tested once, in the
/// position of its first occurrence. Every feature name is checked against
/// the table before any statistics are computed.
///
/// # Errors
///
/// * `NoFeatures` if `features` is empty
/// * `MissingColumn` if any feature is not a column of `table`
/// * `InvalidFeature` if a feature holds text or has no numeric values
pub fn analyze_outliers<S: AsRef<str>>(table: &Table, features: &[S]) -> Result<OutlierReport> {
    if features.is_empty() {
        return Err(AnalysisError::NoFeatures);
    }

    // Validate names and drop repeats, keeping first-seen order
    let mut seen = BTreeSet::new();
    let mut unique_features: Vec<&str> = Vec::with_capacity(features.len());
    for feature in features {
        let feature = feature.as_ref();
        if !table.has_column(feature) {
            return Err(AnalysisError::MissingColumn {
                column: feature.to_string(),
            });
        }
        if seen.insert(feature) {
            unique_features.push(feature);
        }
    }
    if unique_features.len() < features.len() {
        debug!(
            listed = features.len(),
            unique = unique_features.len(),
            "ignoring repeated feature names"
        );
    }

    // Keyed by row position so iteration order is the tie-break order
    let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
    let mut fences_list = Vec::with_capacity(unique_features.len());
    let mut flagged_per_feature = Vec::with_capacity(unique_features.len());

    for feature in unique_features {
        let fences = feature_fences(table, feature)?;

        let mut flagged = 0;
        for (position, value) in table.column(&fences.feature)?.iter().enumerate() {
            if let Value::Number(number) = value {
                if fences.is_outlier(*number) {
                    *tally.entry(position).or_insert(0) += 1;
                    flagged += 1;
                }
            }
        }

        debug!(
            feature = %fences.feature,
            q1 = fences.q1,
            q3 = fences.q3,
            lower = fences.lower,
            upper = fences.upper,
            flagged,
            "computed feature fences"
        );
        fences_list.push(fences);
        flagged_per_feature.push(flagged);
    }

    let row_ids = table.row_ids();
    let mut ranked: Vec<RankedOutlier> = tally
        .into_iter()
        .map(|(position, flags)| RankedOutlier {
            row: row_ids[position],
            flags,
        })
        .collect();
    // Stable sort keeps ascending row position among equal tallies
    ranked.sort_by(|a, b| b.flags.cmp(&a.flags));

    Ok(OutlierReport {
        fences: fences_list,
        flagged_per_feature,
        ranked,
    })
}

/// Returns up to `n` row ids most frequently flagged as outliers across `features`.
///
/// # Arguments
///
/// * `table` - Table to scan; must contain every feature as a column
/// * `n` - Maximum number of row ids to return; `0` yields an empty result
/// * `features` - Names of numeric columns to test
///
/// # Returns
///
/// * `Result<Vec<RowId>>` - Ranked row ids, or `NoFeatures` / `MissingColumn` / `InvalidFeature`
///
/// # Example
///
/// ```
/// use csv_eda_analyzer::outlier_detector::detect_outliers;
/// use csv_eda_analyzer::table::Table;
///
/// let table = Table::from_csv_reader("X\n1\n2\n3\n4\n5\n100\n".as_bytes()).unwrap();
/// let outliers = detect_outliers(&table, 1, &["X"]).unwrap();
/// assert_eq!(outliers[0].0, 5);
/// ```
pub fn detect_outliers<S: AsRef<str>>(table: &Table, n: usize, features: &[S]) -> Result<Vec<RowId>> {
    Ok(analyze_outliers(table, features)?.top(n))
}
