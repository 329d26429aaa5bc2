//! Lead intake and HTTP checks on top of the batch pipeline.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    CheckRequest, CheckResponse, LeadSubmission, ScreeningStatus, SubmissionId, TargetRowView,
};
pub use repository::{
    PlatformCheckView, ReportStore, ScreeningRecord, ScreeningStatusView, StoreError,
};
pub use router::screening_router;
pub use service::{ScreeningError, ScreeningService};
