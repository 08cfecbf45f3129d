//! # JobTrends - Job Postings Analytics API
//!
//! A small HTTP service over a relational store of job postings.
//!
//! JobTrends provides:
//! - SQLite-backed storage for jobs, companies and skills
//! - Filtered job listing and find-or-create job insertion
//! - Aggregate analytics (salary trends, skill usage, work-setting mix)
//! - An axum HTTP surface plus a small CLI

pub mod model;
pub mod storage;
pub mod query;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Job, NewJob, Company, Skill};
pub use storage::SqliteStore;
pub use query::{AnalyticsEngine, Summary};
pub use config::JobTrendsConfig;

/// Result type alias for JobTrends operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for JobTrends operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    /// True for failures caused by the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}
