//! Run parameters for the analysis pipeline.
//!
//! The defaults reproduce the Titanic passenger analysis. A JSON file may
//! override any subset of fields; absent fields keep their defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transform::UnmappedPolicy;

/// A categorical column and the numeric codes its labels map to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub column: String,
    pub values: BTreeMap<String, f64>,
    pub unmapped: UnmappedPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdaConfig {
    /// Column whose value distribution is reported. Skipped when absent.
    pub target_column: Option<String>,
    pub drop_columns: Vec<String>,
    pub category_mappings: Vec<CategoryMapping>,
    pub fill_median_columns: Vec<String>,
    /// Columns tested for outliers; `None` means every numeric column.
    pub outlier_features: Option<Vec<String>>,
    pub outlier_top_n: usize,
    /// Correlations weaker than this are hidden in the "strong" matrix.
    pub correlation_threshold: f64,
    pub head_rows: usize,
}

impl Default for EdaConfig {
    fn default() -> Self {
        EdaConfig {
            target_column: Some("Survived".to_string()),
            drop_columns: ["PassengerId", "Name", "Cabin", "Ticket"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            category_mappings: vec![
                CategoryMapping {
                    column: "Sex".to_string(),
                    values: BTreeMap::from([("male".to_string(), 1.0), ("female".to_string(), 0.0)]),
                    unmapped: UnmappedPolicy::SetMissing,
                },
                CategoryMapping {
                    column: "Embarked".to_string(),
                    values: BTreeMap::from([
                        ("S".to_string(), 1.0),
                        ("C".to_string(), 2.0),
                        ("Q".to_string(), 3.0),
                    ]),
                    unmapped: UnmappedPolicy::Keep,
                },
            ],
            fill_median_columns: vec!["Age".to_string(), "Embarked".to_string()],
            outlier_features: None,
            outlier_top_n: 5,
            correlation_threshold: 0.5,
            head_rows: 5,
        }
    }
}

impl EdaConfig {
    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EdaConfig =
            serde_json::from_str(r#"{ "outlier_top_n": 10, "drop_columns": [] }"#).unwrap();

        assert_eq!(config.outlier_top_n, 10);
        assert!(config.drop_columns.is_empty());
        assert_eq!(config.target_column.as_deref(), Some("Survived"));
        assert_eq!(config.category_mappings.len(), 2);
    }

    #[test]
    fn test_mapping_policy_names() {
        let config: EdaConfig = serde_json::from_str(
            r#"{ "category_mappings": [
                { "column": "Sex", "values": { "m": 1, "f": 0 }, "unmapped": "fail" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(config.category_mappings[0].unmapped, UnmappedPolicy::Fail);
        assert_eq!(config.category_mappings[0].values.get("m"), Some(&1.0));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "target_column": null, "head_rows": 3 }"#).unwrap();

        let config = EdaConfig::from_json_file(&path).unwrap();
        assert_eq!(config.target_column, None);
        assert_eq!(config.head_rows, 3);

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            EdaConfig::from_json_file(&path),
            Err(crate::error::AnalysisError::Config(_))
        ));
    }
}
