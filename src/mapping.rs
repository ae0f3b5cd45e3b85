use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineResult;
use crate::models::{role_name, Selection};

/// Saved column-role choice, replayed as an explicit selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub date_col: Option<String>,
    #[serde(default)]
    pub numeric_col: Option<String>,
    #[serde(default)]
    pub category_col: Option<String>,
}

impl ColumnMapping {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mapping: ColumnMapping = serde_json::from_str(&raw)?;
        info!(path = %path.display(), "loaded column mapping");
        Ok(mapping)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "saved column mapping");
        Ok(())
    }
}

impl From<ColumnMapping> for Selection {
    fn from(mapping: ColumnMapping) -> Self {
        Selection {
            numeric: role_name(mapping.numeric_col.as_deref()),
            category: role_name(mapping.category_col.as_deref()),
            date: role_name(mapping.date_col.as_deref()),
        }
    }
}

impl From<&Selection> for ColumnMapping {
    fn from(selection: &Selection) -> Self {
        ColumnMapping {
            date_col: selection.date.clone(),
            numeric_col: selection.numeric.clone(),
            category_col: selection.category.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_entries_are_unassigned() {
        let mapping: ColumnMapping = serde_json::from_str(
            r#"{"date_col": "None", "numeric_col": "Sales", "category_col": null}"#,
        )
        .unwrap();
        let selection = Selection::from(mapping);
        assert_eq!(selection, Selection::from_names(Some("Sales"), None, None));
    }

    #[test]
    fn missing_keys_default_to_unassigned() {
        let mapping: ColumnMapping = serde_json::from_str(r#"{"numeric_col": "Sales"}"#).unwrap();
        assert_eq!(mapping.date_col, None);
    }

    #[test]
    fn saved_mapping_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let selection = Selection::from_names(Some("Sales"), Some("Region"), Some("Day"));

        ColumnMapping::from(&selection).save(&path).unwrap();
        let loaded = Selection::from(ColumnMapping::load(&path).unwrap());
        assert_eq!(loaded, selection);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(ColumnMapping::load(&path).is_err());
    }
}
