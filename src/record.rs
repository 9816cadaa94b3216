use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::GridConfig;

/// Scalar cell value as carried on the wire
pub type FieldValue = Value;

/// A backend entity as returned by the Record Service
///
/// Relationship fields arrive as nested objects, e.g.
/// `{"Id": "...", "Opportunity": {"Name": "Acme"}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Resolve a dotted path through nested relationship objects
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Overwrite the given top-level fields
    pub fn apply_fields(&mut self, fields: &IndexMap<String, FieldValue>) {
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

/// Flat projection of one record into the displayed row shape
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RowViewModel {
    pub id: String,
    #[serde(flatten)]
    pub values: IndexMap<String, FieldValue>,
}

impl RowViewModel {
    /// Id used for selection tracking; always the record id
    pub fn record_id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldValue> {
        self.values.get(field_name)
    }

    fn from_record(config: &GridConfig, record: &Record) -> Self {
        let values = config
            .columns
            .iter()
            .map(|column| {
                let value = record.get_path(&column.source).cloned().unwrap_or(Value::Null);
                (column.field_name.clone(), value)
            })
            .collect();

        Self {
            id: record.id.clone(),
            values,
        }
    }
}

/// Rebuild the row set wholesale from freshly loaded records
pub fn map_records(config: &GridConfig, records: &[Record]) -> Vec<RowViewModel> {
    records
        .iter()
        .map(|record| RowViewModel::from_record(config, record))
        .collect()
}

/// Render a cell for plain-text output
pub fn display_value(value: &FieldValue) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line_item() -> Record {
        serde_json::from_value(json!({
            "Id": "00k1",
            "Opportunity": { "Name": "Acme Renewal" },
            "Product2": { "Name": "Router" },
            "Product_Details__c": "rack mounted",
            "Product_Expiration_Date__c": "2027-03-01",
            "Warranty_yrs__c": 3
        }))
        .unwrap()
    }

    #[test]
    fn test_record_deserializes_id_and_fields() {
        let record = line_item();
        assert_eq!(record.id, "00k1");
        assert_eq!(record.fields.len(), 5);
        assert!(!record.fields.contains_key("Id"));
    }

    #[test]
    fn test_get_path_follows_relationships() {
        let record = line_item();
        assert_eq!(record.get_path("Opportunity.Name"), Some(&json!("Acme Renewal")));
        assert_eq!(record.get_path("Warranty_yrs__c"), Some(&json!(3)));
        assert_eq!(record.get_path("Opportunity.Missing"), None);
        assert_eq!(record.get_path("Warranty_yrs__c.Name"), None);
    }

    #[test]
    fn test_map_records_flattens_in_column_order() {
        let rows = map_records(&GridConfig::default(), &[line_item()]);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.record_id(), "00k1");
        let fields: Vec<&str> = row.values.keys().map(String::as_str).collect();
        assert_eq!(
            fields,
            vec![
                "opportunityName",
                "productDetails",
                "expirationDate",
                "warrantyYears",
                "productName"
            ]
        );
        assert_eq!(row.get("productName"), Some(&json!("Router")));
        assert_eq!(row.get("warrantyYears"), Some(&json!(3)));
    }

    #[test]
    fn test_missing_relationship_maps_to_null() {
        let record = Record::new("00k2").with_field("Warranty_yrs__c", json!(1));
        let rows = map_records(&GridConfig::default(), &[record]);
        assert_eq!(rows[0].get("opportunityName"), Some(&Value::Null));
        assert_eq!(rows[0].get("warrantyYears"), Some(&json!(1)));
    }

    #[test]
    fn test_row_serializes_flat() {
        let rows = map_records(&GridConfig::default(), &[line_item()]);
        let value = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(value["id"], json!("00k1"));
        assert_eq!(value["productDetails"], json!("rack mounted"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(2.5)), "2.5");
    }
}
