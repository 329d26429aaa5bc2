#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use audience_gate::batch::PipelineSettings;
use audience_gate::fetcher::{FetchError, RenderFetcher, RenderedDocument};
use audience_gate::resolver::CanonicalTarget;
use audience_gate::screening::{ReportStore, ScreeningRecord, StoreError, SubmissionId};
use axum::response::Response;
use serde_json::Value;

pub const INSTAGRAM_24K: &str = r#"<html><head><meta property="og:description" content="24K Followers, 310 Following, 502 Posts - See Instagram photos"></head><body></body></html>"#;
pub const INSTAGRAM_812: &str = r#"<html><head><meta name="description" content="812 Followers, 90 Following, 14 Posts"></head></html>"#;
pub const THREADS_12345: &str = r#"<html><body><div>팔로워 <span class="x1lliihq" title="12,345">1.2만</span></div></body></html>"#;
pub const BLOG_MARKED_642: &str = "<html><body><div class=\"blog_profile\">profile</div></body></html>\n<!-- audience-gate:neighbors:mobile=642 -->";
pub const BLOG_120: &str = r#"<html><body><p class="buddy">이웃 120명</p></body></html>"#;
pub const NOTHING_USEFUL: &str = r#"<html><body><p>Sorry, this page isn't available.</p></body></html>"#;

#[derive(Clone)]
pub enum Scripted {
    Markup(&'static str),
    Fail(&'static str),
}

/// Fetcher that serves canned markup per URL and records every call.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, markup: &'static str) -> Self {
        self.pages.insert(url.to_string(), Scripted::Markup(markup));
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &'static str) -> Self {
        self.pages.insert(url.to_string(), Scripted::Fail(reason));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    /// Highest number of renders observed in flight at once.
    pub fn peak_sessions(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        target: &CanonicalTarget,
        _timeout: Duration,
    ) -> Result<RenderedDocument, FetchError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(target.url.clone());

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(&target.url) {
            Some(Scripted::Markup(markup)) => {
                Ok(RenderedDocument::new(target.clone(), markup.to_string()))
            }
            Some(Scripted::Fail(reason)) => Err(FetchError::Navigation {
                url: target.url.clone(),
                reason: reason.to_string(),
            }),
            None => Err(FetchError::Launch("no page scripted".to_string())),
        }
    }
}

pub fn unpaced() -> PipelineSettings {
    PipelineSettings {
        pacing: Duration::ZERO,
        ..PipelineSettings::default()
    }
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    pub records: Arc<Mutex<HashMap<SubmissionId, ScreeningRecord>>>,
}

impl ReportStore for MemoryStore {
    fn insert(&self, record: ScreeningRecord) -> Result<ScreeningRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.submission_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.submission_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ScreeningRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(record.submission_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<ScreeningRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Memory store whose first `failures` updates are rejected.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures: usize,
    update_attempts: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn failing_updates(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn update_attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }
}

impl ReportStore for FlakyStore {
    fn insert(&self, record: ScreeningRecord) -> Result<ScreeningRecord, StoreError> {
        self.inner.insert(record)
    }

    fn update(&self, record: ScreeningRecord) -> Result<(), StoreError> {
        let attempt = self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(StoreError::Unavailable("write timed out".to_string()));
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<ScreeningRecord>, StoreError> {
        self.inner.fetch(id)
    }
}

pub struct UnavailableStore;

impl ReportStore for UnavailableStore {
    fn insert(&self, _record: ScreeningRecord) -> Result<ScreeningRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ScreeningRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<ScreeningRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}
