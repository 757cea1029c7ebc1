//! Column transformations that prepare a table for modelling.
//!
//! Every function takes the table by reference and returns a new one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::statistics::{median, numeric_values};
use crate::table::{Table, Value};

/// What to do with a text value that has no entry in a category mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Stop with an `UnmappedCategory` error.
    Fail,
    /// Replace the value with a missing cell.
    SetMissing,
    /// Leave the original text in place.
    Keep,
}

/// Removes the named columns. Every name must exist.
pub fn drop_columns<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Table> {
    let names: Vec<&str> = columns.iter().map(|name| name.as_ref()).collect();
    let dropped = table.without_columns(&names)?;
    info!(columns = ?names, "dropped columns");
    Ok(dropped)
}

/// Replaces the text values of a column with numbers from `mapping`.
///
/// Numbers and missing cells pass through untouched, so mapping an already
/// mapped column is a no-op.
///
/// # Arguments
///
/// * `table` - Source table
/// * `column` - Column to remap
/// * `mapping` - Category label to numeric code
/// * `policy` - Handling of labels absent from `mapping`
///
/// # Returns
///
/// * `Result<Table>` - The remapped table, or `MissingColumn` / `UnmappedCategory`
pub fn map_categories(
    table: &Table,
    column: &str,
    mapping: &BTreeMap<String, f64>,
    policy: UnmappedPolicy,
) -> Result<Table> {
    let mut unmapped = 0;
    let mut mapped_values = Vec::with_capacity(table.row_count());

    for value in table.column(column)? {
        let mapped = match value {
            Value::Text(label) => match mapping.get(label) {
                Some(code) => Value::Number(*code),
                None => {
                    unmapped += 1;
                    match policy {
                        UnmappedPolicy::Fail => {
                            return Err(AnalysisError::UnmappedCategory {
                                column: column.to_string(),
                                value: label.clone(),
                            });
                        }
                        UnmappedPolicy::SetMissing => Value::Missing,
                        UnmappedPolicy::Keep => value.clone(),
                    }
                }
            },
            other => other.clone(),
        };
        mapped_values.push(mapped);
    }

    if unmapped > 0 {
        debug!(column, unmapped, ?policy, "values without a category mapping");
    }
    table.with_column(column, mapped_values)
}

/// Fills missing cells of a numeric column with the column's median.
///
/// # Returns
///
/// * `Result<(Table, f64)>` - The filled table and the median used
///
/// # Errors
///
/// * `MissingColumn` if the column does not exist
/// * `InvalidFeature` if the column holds text or has no numeric values
pub fn fill_missing_with_median(table: &Table, column: &str) -> Result<(Table, f64)> {
    let values = numeric_values(table, column)?;
    let fill = median(&values).ok_or_else(|| AnalysisError::InvalidFeature {
        column: column.to_string(),
        reason: "no numeric values to compute a median".to_string(),
    })?;

    let filled: Vec<Value> = table
        .column(column)?
        .iter()
        .map(|value| match value {
            Value::Missing => Value::Number(fill),
            other => other.clone(),
        })
        .collect();

    let missing = table.row_count() - values.len();
    info!(column, median = fill, filled = missing, "filled missing values with median");
    Ok((table.with_column(column, filled)?, fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnKind, RowId};

    fn passengers() -> Table {
        Table::from_csv_reader(
            "Name,Sex,Age,Embarked\n\
             Braund,male,22,S\n\
             Cumings,female,38,C\n\
             Heikkinen,female,,S\n\
             Moran,male,,Q\n\
             Unknown,other,35,\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn sex_mapping() -> BTreeMap<String, f64> {
        BTreeMap::from([("male".to_string(), 1.0), ("female".to_string(), 0.0)])
    }

    #[test]
    fn test_map_categories_set_missing() {
        let table = map_categories(&passengers(), "Sex", &sex_mapping(), UnmappedPolicy::SetMissing).unwrap();
        assert_eq!(
            table.column("Sex").unwrap(),
            &[
                Value::Number(1.0),
                Value::Number(0.0),
                Value::Number(0.0),
                Value::Number(1.0),
                Value::Missing,
            ]
        );
        assert_eq!(table.numeric_columns(), vec!["Sex", "Age"]);
    }

    #[test]
    fn test_map_categories_keep() {
        let mapping = BTreeMap::from([("S".to_string(), 1.0), ("C".to_string(), 2.0)]);
        let table = map_categories(&passengers(), "Embarked", &mapping, UnmappedPolicy::Keep).unwrap();
        let embarked = table.column("Embarked").unwrap();

        assert_eq!(embarked[1], Value::Number(2.0));
        assert_eq!(embarked[3], Value::Text("Q".to_string()));
        assert_eq!(embarked[4], Value::Missing);
    }

    #[test]
    fn test_map_categories_fail() {
        let result = map_categories(&passengers(), "Sex", &sex_mapping(), UnmappedPolicy::Fail);
        assert!(matches!(
            result,
            Err(AnalysisError::UnmappedCategory { ref value, .. }) if value == "other"
        ));
    }

    #[test]
    fn test_mapped_numbers_pass_through() {
        let once = map_categories(&passengers(), "Sex", &sex_mapping(), UnmappedPolicy::Keep).unwrap();
        let without_other = once.drop_rows(&[RowId(4)]);

        let twice = map_categories(&without_other, "Sex", &sex_mapping(), UnmappedPolicy::Fail).unwrap();
        assert_eq!(twice, without_other);
        assert_eq!(twice.column_kind("Sex").unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_fill_missing_with_median() {
        let (table, fill) = fill_missing_with_median(&passengers(), "Age").unwrap();
        assert_eq!(fill, 35.0);
        assert_eq!(table.column("Age").unwrap()[2], Value::Number(35.0));
        assert!(table.column("Age").unwrap().iter().all(|value| !value.is_missing()));
    }

    #[test]
    fn test_fill_missing_rejects_text() {
        let result = fill_missing_with_median(&passengers(), "Embarked");
        assert!(matches!(result, Err(AnalysisError::InvalidFeature { .. })));
    }

    #[test]
    fn test_drop_columns() {
        let table = drop_columns(&passengers(), &["Name"]).unwrap();
        assert_eq!(table.shape(), (5, 3));

        let result = drop_columns(&passengers(), &["Cabin"]);
        assert!(matches!(result, Err(AnalysisError::MissingColumn { .. })));
    }
}
