//! Audience-size extraction and eligibility checks for Instagram, Threads, and Naver Blog.
//!
//! A submitted identifier is resolved to a canonical profile URL, rendered in a real browser,
//! reduced to a single audience number by a per-platform strategy cascade, and compared with
//! a configured threshold. Batches run strictly one target at a time.

pub mod batch;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod intake;
pub mod platform;
pub mod resolver;
pub mod screening;
pub mod telemetry;
