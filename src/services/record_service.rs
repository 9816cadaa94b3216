use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::drafts::UpdateRequest;
use crate::errors::{LoadError, LoadResult, UpdateError, UpdateResult};
use crate::record::{FieldValue, Record};

/// Backend holding the records shown by the grid
///
/// `fetch_all` takes no paging, filtering or sorting parameters; all of that
/// happens client-side.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn fetch_all(&self) -> LoadResult<Vec<Record>>;

    /// Partial update of exactly `fields` on exactly one record
    async fn update_fields(
        &self,
        record_id: &str,
        fields: &IndexMap<String, FieldValue>,
    ) -> UpdateResult<()>;
}

/// In-process record store with failure injection and call accounting
#[derive(Clone, Default)]
pub struct InMemoryRecordService {
    records: Arc<RwLock<Vec<Record>>>,
    fetch_failure: Arc<RwLock<Option<String>>>,
    update_failures: Arc<RwLock<HashMap<String, UpdateError>>>,
    update_delay: Option<Duration>,
    fetch_calls: Arc<AtomicUsize>,
    update_log: Arc<Mutex<Vec<UpdateRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl InMemoryRecordService {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            ..Default::default()
        }
    }

    /// Hold every update for `delay` before applying it
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    /// Make subsequent fetches fail with `message`, or succeed again with `None`
    pub async fn set_fetch_failure(&self, message: Option<String>) {
        *self.fetch_failure.write().await = message;
    }

    /// Make every update of `record_id` fail with `error`
    pub async fn fail_updates_for(&self, record_id: &str, error: UpdateError) {
        self.update_failures
            .write()
            .await
            .insert(record_id.to_string(), error);
    }

    pub async fn replace_records(&self, records: Vec<Record>) {
        *self.records.write().await = records;
    }

    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Every update request received, in arrival order
    pub async fn update_log(&self) -> Vec<UpdateRequest> {
        self.update_log.lock().await.clone()
    }

    /// Highest number of updates observed in flight at once
    pub fn max_concurrent_updates(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn apply_update(
        &self,
        record_id: &str,
        fields: &IndexMap<String, FieldValue>,
    ) -> UpdateResult<()> {
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.update_failures.read().await.get(record_id) {
            return Err(error.clone());
        }

        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| UpdateError::NotFound(record_id.to_string()))?;
        record.apply_fields(fields);
        Ok(())
    }
}

#[async_trait]
impl RecordService for InMemoryRecordService {
    async fn fetch_all(&self) -> LoadResult<Vec<Record>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.fetch_failure.read().await.clone() {
            return Err(LoadError::Service(message));
        }
        Ok(self.records.read().await.clone())
    }

    async fn update_fields(
        &self,
        record_id: &str,
        fields: &IndexMap<String, FieldValue>,
    ) -> UpdateResult<()> {
        self.update_log.lock().await.push(UpdateRequest {
            record_id: record_id.to_string(),
            fields: fields.clone(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = self.apply_update(record_id, fields).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Records kept as a JSON array in a file
///
/// Updates rewrite the whole file. Concurrent updates are serialized by an
/// internal lock so none of them is lost.
pub struct FileRecordService {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRecordService {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> LoadResult<Vec<Record>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<Record> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn service_error(record_id: &str, err: impl std::fmt::Display) -> UpdateError {
        UpdateError::Service {
            record_id: record_id.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl RecordService for FileRecordService {
    async fn fetch_all(&self) -> LoadResult<Vec<Record>> {
        let records = self.read_records().await?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn update_fields(
        &self,
        record_id: &str,
        fields: &IndexMap<String, FieldValue>,
    ) -> UpdateResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self
            .read_records()
            .await
            .map_err(|e| Self::service_error(record_id, e))?;

        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| UpdateError::NotFound(record_id.to_string()))?;
        record.apply_fields(fields);

        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| Self::service_error(record_id, e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Self::service_error(record_id, e))?;

        debug!("Wrote {} fields of record {}", fields.len(), record_id);
        Ok(())
    }
}
