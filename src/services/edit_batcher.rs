use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{error, info};

use crate::drafts::UpdateRequest;
use crate::errors::{BatchError, BatchResult, UpdateError};
use crate::services::RecordService;

/// Outcome of a fully successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Ids of the records updated, in submission order
    pub updated: Vec<String>,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
    }
}

/// Submits staged row updates as independent, concurrent requests
///
/// There is no transaction around the batch: rows that succeed stay applied
/// even when a sibling fails.
#[derive(Clone)]
pub struct EditBatcher {
    service: Arc<dyn RecordService>,
}

impl EditBatcher {
    pub fn new(service: Arc<dyn RecordService>) -> Self {
        Self { service }
    }

    /// Fan out every request, wait for all of them to settle, then aggregate
    pub async fn submit(&self, requests: Vec<UpdateRequest>) -> BatchResult<CommitSummary> {
        if requests.is_empty() {
            return Ok(CommitSummary::default());
        }

        info!("Submitting {} record updates", requests.len());

        let pending = requests.iter().map(|request| async move {
            let result = self
                .service
                .update_fields(&request.record_id, &request.fields)
                .await;
            (request.record_id.clone(), result)
        });

        let outcomes: IndexMap<String, Result<(), UpdateError>> =
            join_all(pending).await.into_iter().collect();

        for failure in outcomes.values().filter_map(|o| o.as_ref().err()) {
            error!("Error updating record {}: {}", failure.record_id(), failure);
            if let Some(field_errors) = failure.field_errors() {
                error!("Field errors: {:?}", field_errors);
            }
        }

        if outcomes.values().any(|o| o.is_err()) {
            return Err(BatchError::from_outcomes(outcomes));
        }

        Ok(CommitSummary {
            updated: outcomes.into_keys().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::services::InMemoryRecordService;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn request(id: &str, field: &str, value: serde_json::Value) -> UpdateRequest {
        let mut fields = IndexMap::new();
        fields.insert(field.to_string(), value);
        UpdateRequest {
            record_id: id.to_string(),
            fields,
        }
    }

    fn service_with(ids: &[&str]) -> InMemoryRecordService {
        InMemoryRecordService::new(ids.iter().map(|id| Record::new(*id)).collect())
    }

    #[tokio::test]
    async fn test_empty_batch_issues_nothing() {
        let service = service_with(&["a"]);
        let batcher = EditBatcher::new(Arc::new(service.clone()));

        let summary = batcher.submit(Vec::new()).await.unwrap();
        assert!(summary.is_empty());
        assert!(service.update_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let service = service_with(&["a", "b"]);
        let batcher = EditBatcher::new(Arc::new(service.clone()));

        let summary = batcher
            .submit(vec![
                request("a", "Warranty_yrs__c", json!(1)),
                request("b", "Warranty_yrs__c", json!(2)),
            ])
            .await
            .unwrap();

        assert_eq!(summary.updated, vec!["a".to_string(), "b".to_string()]);
        let records = service.records().await;
        assert_eq!(records[1].fields["Warranty_yrs__c"], json!(2));
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch_without_rollback() {
        let service = service_with(&["a", "b", "c"]);
        let mut field_errors = BTreeMap::new();
        field_errors.insert("Warranty_yrs__c".to_string(), vec!["too large".to_string()]);
        service
            .fail_updates_for(
                "b",
                UpdateError::Rejected {
                    record_id: "b".to_string(),
                    message: "FIELD_CUSTOM_VALIDATION_EXCEPTION".to_string(),
                    field_errors,
                },
            )
            .await;
        let batcher = EditBatcher::new(Arc::new(service.clone()));

        let err = batcher
            .submit(vec![
                request("a", "Warranty_yrs__c", json!(1)),
                request("b", "Warranty_yrs__c", json!(99)),
                request("c", "Warranty_yrs__c", json!(3)),
            ])
            .await
            .unwrap_err();

        assert!(err.is_partial());
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].record_id(), "b");

        let records = service.records().await;
        assert_eq!(records[0].fields["Warranty_yrs__c"], json!(1));
        assert!(records[1].fields.get("Warranty_yrs__c").is_none());
        assert_eq!(records[2].fields["Warranty_yrs__c"], json!(3));
    }

    #[tokio::test]
    async fn test_requests_run_concurrently() {
        let service = service_with(&["a", "b", "c"]).with_update_delay(Duration::from_millis(20));
        let batcher = EditBatcher::new(Arc::new(service.clone()));

        batcher
            .submit(vec![
                request("a", "Product_Details__c", json!("x")),
                request("b", "Product_Details__c", json!("y")),
                request("c", "Product_Details__c", json!("z")),
            ])
            .await
            .unwrap();

        assert_eq!(service.max_concurrent_updates(), 3);
    }
}
