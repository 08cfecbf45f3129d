//! Query Layer - filters and aggregates over the job store
//!
//! All queries take a borrowed connection so callers decide the session and
//! transaction boundaries.

pub mod analytics;
pub mod jobs;

pub use analytics::{AnalyticsEngine, Degraded, FallbackReason, NamedCount, NamedSalary, Summary, YearSalary};
pub use jobs::{JobFilter, JobQueries, create_job, DEFAULT_LIST_LIMIT};
