use audience_gate::screening::{ReportStore, ScreeningRecord, StoreError, SubmissionId};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local lead store; records are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    records: Arc<Mutex<HashMap<SubmissionId, ScreeningRecord>>>,
}

impl InMemoryReportStore {
    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SubmissionId, ScreeningRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("report store mutex poisoned".to_string()))
    }
}

impl ReportStore for InMemoryReportStore {
    fn insert(&self, record: ScreeningRecord) -> Result<ScreeningRecord, StoreError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.submission_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.submission_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ScreeningRecord) -> Result<(), StoreError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.submission_id) {
            guard.insert(record.submission_id.clone(), record);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<ScreeningRecord>, StoreError> {
        let guard = self.records()?;
        Ok(guard.get(id).cloned())
    }
}
