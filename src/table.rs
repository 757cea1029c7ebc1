//! # In-memory Table
//!
//! A small column-major table loaded from a CSV file. Each row carries a
//! stable [`RowId`] assigned at load time, so rows can be reported and dropped
//! by identity even after other rows have been removed.
//!
//! Cells are parsed into [`Value`]s:
//!
//! - empty (after trimming) -> `Value::Missing`
//! - finite `f64` -> `Value::Number`
//! - `NaN` or infinite -> `Value::Missing`
//! - anything else -> `Value::Text`
//!
//! Input files are decoded as ISO-8859-1, which maps every byte to a char and
//! therefore never fails on legacy exports.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Stable, position-based identifier of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parses a raw CSV cell.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Value::Number(number),
            Ok(_) => Value::Missing,
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// The numeric value, or `None` for text and missing cells.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// True for an empty cell.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{}", number),
            Value::Text(text) => write!(f, "{}", text),
            Value::Missing => Ok(()),
        }
    }
}

/// Broad type of a column, decided from its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing value is a number and at least one exists.
    Numeric,
    /// At least one value is text.
    Text,
    /// Every value is missing.
    Empty,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        };
        write!(f, "{}", label)
    }
}

/// Column-major table with a separate row index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    index: Vec<RowId>,
}

impl Table {
    /// Builds a table from named columns. Row ids are assigned `0..len`.
    ///
    /// # Errors
    ///
    /// * `ShapeMismatch` if the columns do not all have the same length
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<Value>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(AnalysisError::ShapeMismatch {
                column: "<header>".to_string(),
                expected: names.len(),
                found: columns.len(),
            });
        }

        let expected = columns.first().map(|column| column.len()).unwrap_or(0);
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != expected {
                return Err(AnalysisError::ShapeMismatch {
                    column: name.clone(),
                    expected,
                    found: column.len(),
                });
            }
        }

        Ok(Table {
            names,
            columns,
            index: (0..expected).map(RowId).collect(),
        })
    }

    /// Loads a CSV file with a header row, decoding it as ISO-8859-1.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    ///
    /// # Returns
    ///
    /// * `Result<Table>` - The parsed table, or `Io`/`Csv`/`EmptyDataset` errors
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let bytes = fs::read(path_ref)?;

        // ISO-8859-1: every byte is the code point of the same value
        let text: String = bytes.iter().map(|&byte| char::from(byte)).collect();

        let table = Self::from_csv_reader(text.as_bytes()).map_err(|error| match error {
            AnalysisError::EmptyDataset { .. } => AnalysisError::EmptyDataset {
                path: path_ref.display().to_string(),
            },
            other => other,
        })?;

        debug!(
            path = %path_ref.display(),
            rows = table.row_count(),
            columns = table.names.len(),
            "loaded table"
        );
        Ok(table)
    }

    /// Parses CSV text from any reader. The first record is the header.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let names: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        if names.is_empty() || names.iter().all(|name| name.is_empty()) {
            return Err(AnalysisError::EmptyDataset {
                path: "<reader>".to_string(),
            });
        }

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        for record in csv_reader.records() {
            let record = record?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.push(Value::parse(field));
            }
        }

        Self::from_columns(names, columns)
    }

    /// Returns `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.names.len())
    }

    /// Number of rows currently in the table.
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Row ids in row order. After `drop_rows` these have gaps until `reset_index`.
    pub fn row_ids(&self) -> &[RowId] {
        &self.index
    }

    /// Checks whether a column with this exact name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    /// Values of a column in row order.
    pub fn column(&self, name: &str) -> Result<&[Value]> {
        self.position(name)
            .map(|position| self.columns[position].as_slice())
            .ok_or_else(|| AnalysisError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Values of a single row in column order.
    pub fn row(&self, position: usize) -> Vec<&Value> {
        self.columns.iter().map(|column| &column[position]).collect()
    }

    /// Broad type of the named column.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(kind_of(self.column(name)?))
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    /// Names of the text columns, in table order.
    pub fn text_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Text)
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, column)| kind_of(column) == kind)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// First `rows` rows, keeping their ids.
    pub fn head(&self, rows: usize) -> Table {
        let take = rows.min(self.row_count());
        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| column[..take].to_vec())
                .collect(),
            index: self.index[..take].to_vec(),
        }
    }

    /// Returns a copy with `name` replaced by `values`.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        let position = self.position(name).ok_or_else(|| AnalysisError::MissingColumn {
            column: name.to_string(),
        })?;
        if values.len() != self.row_count() {
            return Err(AnalysisError::ShapeMismatch {
                column: name.to_string(),
                expected: self.row_count(),
                found: values.len(),
            });
        }

        let mut table = self.clone();
        table.columns[position] = values;
        Ok(table)
    }

    /// Returns a copy without the named columns. Every name must exist.
    pub fn without_columns(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            if !self.has_column(name) {
                return Err(AnalysisError::MissingColumn {
                    column: name.to_string(),
                });
            }
        }

        let (kept_names, kept_columns): (Vec<String>, Vec<Vec<Value>>) = self
            .names
            .iter()
            .zip(&self.columns)
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(name, column)| (name.clone(), column.clone()))
            .unzip();

        Ok(Table {
            names: kept_names,
            columns: kept_columns,
            index: self.index.clone(),
        })
    }

    /// Returns a copy without the rows whose ids are listed. Unknown ids are ignored.
    pub fn drop_rows(&self, ids: &[RowId]) -> Table {
        let dropped: HashSet<RowId> = ids.iter().copied().collect();
        let keep: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, id)| !dropped.contains(id))
            .map(|(position, _)| position)
            .collect();

        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| keep.iter().map(|&position| column[position].clone()).collect())
                .collect(),
            index: keep.iter().map(|&position| self.index[position]).collect(),
        }
    }

    /// Renumbers row ids to `0..len`.
    pub fn reset_index(&self) -> Table {
        let mut table = self.clone();
        table.index = (0..table.row_count()).map(RowId).collect();
        table
    }

    /// Writes the table as CSV with a header row. Missing cells are empty.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.names)?;
        for position in 0..self.row_count() {
            writer.write_record(self.row(position).iter().map(|value| value.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn kind_of(values: &[Value]) -> ColumnKind {
    let mut saw_number = false;
    for value in values {
        match value {
            Value::Text(_) => return ColumnKind::Text,
            Value::Number(_) => saw_number = true,
            Value::Missing => {}
        }
    }
    if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "PassengerId,Name,Age,Fare\n\
                          1,Braund,22,7.25\n\
                          2,Cumings,,71.2833\n\
                          3,Heikkinen,26,NaN\n";

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(" 22 "), Value::Number(22.0));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("nan"), Value::Missing);
        assert_eq!(Value::parse("male"), Value::Text("male".to_string()));
    }

    #[test]
    fn test_load_from_reader() {
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.shape(), (3, 4));
        assert_eq!(table.column("Age").unwrap()[1], Value::Missing);
        assert_eq!(table.column("Fare").unwrap()[2], Value::Missing);
        assert_eq!(table.numeric_columns(), vec!["PassengerId", "Age", "Fare"]);
        assert_eq!(table.text_columns(), vec!["Name"]);
        assert_eq!(table.row_ids(), &[RowId(0), RowId(1), RowId(2)]);
    }

    #[test]
    fn test_load_latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        // "Jos\xe9" is not valid UTF-8
        fs::write(&path, b"Name,Age\nJos\xe9,30\n").unwrap();

        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.column("Name").unwrap()[0], Value::Text("José".to_string()));
    }

    #[test]
    fn test_ragged_rows_fail() {
        let result = Table::from_csv_reader("A,B\n1,2\n3\n".as_bytes());
        assert!(matches!(result, Err(AnalysisError::Csv(_))));
    }

    #[test]
    fn test_empty_input_fails() {
        let result = Table::from_csv_reader("".as_bytes());
        assert!(matches!(result, Err(AnalysisError::EmptyDataset { .. })));
    }

    #[test]
    fn test_from_columns_shape_mismatch() {
        let result = Table::from_columns(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![Value::Number(1.0)], vec![]],
        );
        assert!(matches!(result, Err(AnalysisError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_drop_rows_keeps_ids_until_reset() {
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        let dropped = table.drop_rows(&[RowId(1)]);
        assert_eq!(dropped.row_ids(), &[RowId(0), RowId(2)]);
        assert_eq!(dropped.column("Name").unwrap()[1], Value::Text("Heikkinen".to_string()));

        let reset = dropped.reset_index();
        assert_eq!(reset.row_ids(), &[RowId(0), RowId(1)]);
    }

    #[test]
    fn test_without_columns_requires_existing_names() {
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        let slim = table.without_columns(&["Name", "PassengerId"]).unwrap();
        assert_eq!(slim.column_names(), &["Age".to_string(), "Fare".to_string()]);

        let result = table.without_columns(&["Cabin"]);
        assert!(matches!(result, Err(AnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        table.write_csv(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();

        assert!(written.starts_with("PassengerId,Name,Age,Fare\n"));
        assert!(written.contains("2,Cumings,,71.2833\n"));
    }
}
