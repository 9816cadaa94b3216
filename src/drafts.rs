use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::{ColumnConfig, ColumnType};
use crate::errors::{EditError, EditResult};
use crate::record::FieldValue;

/// Date format accepted by date columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One cell edit as delivered by the UI adapter
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row_id: String,
    pub field: String,
    pub value: FieldValue,
}

/// Partial update of one record, keyed by backend field identifiers
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub record_id: String,
    pub fields: IndexMap<String, FieldValue>,
}

/// Unsaved edits, row id to `{logical field: new value}`
///
/// Rows keep the order in which they were first edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftSet {
    rows: IndexMap<String, IndexMap<String, FieldValue>>,
}

impl DraftSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a value, overwriting any earlier value for the same field
    pub fn stage(&mut self, row_id: &str, field: &str, value: FieldValue) {
        self.rows
            .entry(row_id.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    pub fn row(&self, row_id: &str) -> Option<&IndexMap<String, FieldValue>> {
        self.rows.get(row_id)
    }

    /// Number of rows with at least one staged field
    pub fn len(&self) -> usize {
        self.rows.values().filter(|fields| !fields.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Move every staged edit out, leaving the set empty
    pub fn take(&mut self) -> DraftSet {
        std::mem::take(self)
    }

    /// One request per dirty row, holding only that row's staged fields
    ///
    /// `field_map` translates logical field names to backend identifiers;
    /// fields without a mapping are dropped.
    pub fn into_update_requests(self, field_map: &IndexMap<String, String>) -> Vec<UpdateRequest> {
        self.rows
            .into_iter()
            .filter_map(|(record_id, staged)| {
                let fields: IndexMap<String, FieldValue> = staged
                    .into_iter()
                    .filter_map(|(field, value)| match field_map.get(&field) {
                        Some(backend) => Some((backend.clone(), value)),
                        None => {
                            warn!("Dropping staged value for unmapped field '{}'", field);
                            None
                        }
                    })
                    .collect();

                if fields.is_empty() {
                    None
                } else {
                    Some(UpdateRequest { record_id, fields })
                }
            })
            .collect()
    }
}

/// Check a staged value against the column it targets
pub fn check_value(column: &ColumnConfig, value: &FieldValue) -> EditResult<()> {
    if !column.editable {
        return Err(EditError::ReadOnlyField(column.field_name.clone()));
    }

    let mismatch = || EditError::TypeMismatch {
        field: column.field_name.clone(),
        expected: column.column_type.as_str(),
    };

    match (column.column_type, value) {
        (_, Value::Null) => Ok(()),
        (ColumnType::Text, Value::String(_)) => Ok(()),
        (ColumnType::Number, Value::Number(_)) => Ok(()),
        (ColumnType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(|_| ())
            .map_err(|_| EditError::InvalidDate {
                field: column.field_name.clone(),
                value: s.clone(),
            }),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use serde_json::json;

    #[test]
    fn test_two_rows_produce_two_requests() {
        let mut drafts = DraftSet::new();
        drafts.stage("r1", "productDetails", json!("v1"));
        drafts.stage("r2", "warrantyYears", json!(2));

        let requests = drafts.into_update_requests(&GridConfig::default().field_map());
        assert_eq!(requests.len(), 2);

        assert_eq!(requests[0].record_id, "r1");
        assert_eq!(requests[0].fields.len(), 1);
        assert_eq!(requests[0].fields["Product_Details__c"], json!("v1"));

        assert_eq!(requests[1].record_id, "r2");
        assert_eq!(requests[1].fields.len(), 1);
        assert_eq!(requests[1].fields["Warranty_yrs__c"], json!(2));
    }

    #[test]
    fn test_edits_to_same_row_merge() {
        let mut drafts = DraftSet::new();
        drafts.stage("a", "warrantyYears", json!(5));
        drafts.stage("a", "expirationDate", json!("2030-01-01"));
        assert_eq!(drafts.len(), 1);

        let requests = drafts.into_update_requests(&GridConfig::default().field_map());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].fields["Warranty_yrs__c"], json!(5));
        assert_eq!(requests[0].fields["Product_Expiration_Date__c"], json!("2030-01-01"));
    }

    #[test]
    fn test_last_write_wins_per_field() {
        let mut drafts = DraftSet::new();
        drafts.stage("a", "warrantyYears", json!(1));
        drafts.stage("a", "warrantyYears", json!(4));
        assert_eq!(drafts.row("a").unwrap()["warrantyYears"], json!(4));
    }

    #[test]
    fn test_take_leaves_set_empty() {
        let mut drafts = DraftSet::new();
        drafts.stage("a", "productDetails", json!("x"));
        let taken = drafts.take();
        assert!(drafts.is_empty());
        assert_eq!(taken.len(), 1);
    }

    #[test]
    fn test_unmapped_fields_are_dropped() {
        let mut drafts = DraftSet::new();
        drafts.stage("a", "notAColumn", json!("x"));
        let requests = drafts.into_update_requests(&GridConfig::default().field_map());
        assert!(requests.is_empty());
    }

    #[test]
    fn test_check_value_by_column_type() {
        let config = GridConfig::default();
        let text = config.column("productDetails").unwrap();
        let date = config.column("expirationDate").unwrap();
        let number = config.column("warrantyYears").unwrap();
        let read_only = config.column("productName").unwrap();

        assert!(check_value(text, &json!("anything")).is_ok());
        assert!(check_value(number, &json!(5)).is_ok());
        assert!(check_value(number, &Value::Null).is_ok());
        assert!(check_value(date, &json!("2030-01-01")).is_ok());

        assert_eq!(
            check_value(number, &json!("five")),
            Err(EditError::TypeMismatch {
                field: "warrantyYears".to_string(),
                expected: "number",
            })
        );
        assert!(matches!(
            check_value(date, &json!("01/01/2030")),
            Err(EditError::InvalidDate { .. })
        ));
        assert_eq!(
            check_value(read_only, &json!("x")),
            Err(EditError::ReadOnlyField("productName".to_string()))
        );
    }
}
