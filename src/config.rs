use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// ## Structure
/// Grid configuration, usually read from a YAML file.
///
/// ```text
/// GridConfig
///   ├── page_size: usize
///   ├── hide_checkbox_column: bool
///   ├── show_row_number_column: bool
///   └── columns: Vec<ColumnConfig>
///       ├── label: String
///       ├── field_name: String        (logical name used by rows and drafts)
///       ├── column_type: ColumnType
///       │   ├── Text
///       │   ├── Date
///       │   └── Number
///       ├── editable: bool
///       └── source: String            (backend field, or dotted relationship path)
/// ```

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Logical name reserved for the record id
pub const ID_FIELD: &str = "id";

/// Backend field that carries the record id
pub const ID_SOURCE: &str = "Id";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Date,
    Number,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Number => "number",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnConfig {
    pub label: String,
    pub field_name: String,
    pub column_type: ColumnType,
    #[serde(default)]
    pub editable: bool,
    pub source: String,
}

impl ColumnConfig {
    fn new(
        label: &str,
        field_name: &str,
        column_type: ColumnType,
        editable: bool,
        source: &str,
    ) -> Self {
        Self {
            label: label.to_string(),
            field_name: field_name.to_string(),
            column_type,
            editable,
            source: source.to_string(),
        }
    }

    /// Whether the column is read from a related entity
    pub fn is_relationship(&self) -> bool {
        self.source.contains('.')
    }

    /// Path segments of `source`
    pub fn source_path(&self) -> impl Iterator<Item = &str> {
        self.source.split('.')
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GridConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub hide_checkbox_column: bool,
    #[serde(default)]
    pub show_row_number_column: bool,
    pub columns: Vec<ColumnConfig>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for GridConfig {
    /// Opportunity line-item grid
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            hide_checkbox_column: false,
            show_row_number_column: false,
            columns: vec![
                ColumnConfig::new(
                    "Opportunity Name",
                    "opportunityName",
                    ColumnType::Text,
                    false,
                    "Opportunity.Name",
                ),
                ColumnConfig::new(
                    "Product Details",
                    "productDetails",
                    ColumnType::Text,
                    true,
                    "Product_Details__c",
                ),
                ColumnConfig::new(
                    "Product Expiration Date",
                    "expirationDate",
                    ColumnType::Date,
                    true,
                    "Product_Expiration_Date__c",
                ),
                ColumnConfig::new(
                    "Warranty (Years)",
                    "warrantyYears",
                    ColumnType::Number,
                    true,
                    "Warranty_yrs__c",
                ),
                ColumnConfig::new(
                    "Product Name",
                    "productName",
                    ColumnType::Text,
                    false,
                    "Product2.Name",
                ),
            ],
        }
    }
}

impl GridConfig {
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: GridConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.field_name == ID_FIELD {
                return Err(ConfigError::Invalid(format!(
                    "field name '{}' is reserved",
                    ID_FIELD
                )));
            }
            if !seen.insert(column.field_name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate field name '{}'",
                    column.field_name
                )));
            }
            if column.source.is_empty() || column.source_path().any(str::is_empty) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' has an empty source",
                    column.field_name
                )));
            }
            if column.source_path().next() == Some(ID_SOURCE) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' cannot be sourced from the record id",
                    column.field_name
                )));
            }
            if column.editable && column.is_relationship() {
                return Err(ConfigError::Invalid(format!(
                    "relationship column '{}' cannot be editable",
                    column.field_name
                )));
            }
        }

        Ok(())
    }

    pub fn column(&self, field_name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.field_name == field_name)
    }

    /// Logical field name to backend field identifier, editable columns only
    pub fn field_map(&self) -> IndexMap<String, String> {
        self.columns
            .iter()
            .filter(|c| c.editable)
            .map(|c| (c.field_name.clone(), c.source.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 100);
        assert_eq!(config.columns.len(), 5);
    }

    #[test]
    fn test_field_map_lists_editable_columns() {
        let map = GridConfig::default().field_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["productDetails"], "Product_Details__c");
        assert_eq!(map["expirationDate"], "Product_Expiration_Date__c");
        assert_eq!(map["warrantyYears"], "Warranty_yrs__c");
        assert!(!map.contains_key("opportunityName"));
    }

    #[test]
    fn test_yaml_roundtrip_of_default() {
        let config = GridConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed = GridConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_deserialization_with_defaults() {
        let yaml = r#"
columns:
  - label: "Name"
    field_name: "name"
    column_type: text
    editable: true
    source: "Name"
  - label: "Account"
    field_name: "accountName"
    column_type: text
    source: "Account.Name"
"#;

        let config = GridConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(!config.hide_checkbox_column);
        assert!(!config.columns[1].editable);
        assert!(config.columns[1].is_relationship());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let yaml = "page_size: 0\ncolumns: []\n";
        let err = GridConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_editable_relationship_is_rejected() {
        let mut config = GridConfig::default();
        config.columns[0].editable = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_and_reserved_names_are_rejected() {
        let mut config = GridConfig::default();
        let dup = config.columns[1].clone();
        config.columns.push(dup);
        assert!(config.validate().is_err());

        let mut config = GridConfig::default();
        config.columns[1].field_name = "id".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_id_source_is_rejected() {
        let mut config = GridConfig::default();
        config.columns[1].source = ID_SOURCE.to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let mut config = GridConfig::default();
        config.columns[0].source = "Id.Name".to_string();
        config.columns[0].editable = false;
        assert!(config.validate().is_err());

        // other fields that merely start with "Id" are fine
        let mut config = GridConfig::default();
        config.columns[1].source = "Identifier__c".to_string();
        assert!(config.validate().is_ok());
    }
}
