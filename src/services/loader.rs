use std::sync::Arc;

use tracing::{error, info};

use crate::errors::LoadResult;
use crate::record::Record;
use crate::services::RecordService;

/// Single-shot fetch of the full candidate record set
///
/// No retry and no cancellation: a second load started while one is in
/// flight simply races it.
#[derive(Clone)]
pub struct Loader {
    service: Arc<dyn RecordService>,
}

impl Loader {
    pub fn new(service: Arc<dyn RecordService>) -> Self {
        Self { service }
    }

    pub async fn load(&self) -> LoadResult<Vec<Record>> {
        info!("Loading records");
        match self.service.fetch_all().await {
            Ok(records) => {
                info!("Loaded {} records", records.len());
                Ok(records)
            }
            Err(e) => {
                error!("Error loading records: {}", e);
                Err(e)
            }
        }
    }
}
