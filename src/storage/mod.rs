//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - companies(company_id, company_name)
//! - skills(skill_id, skill_name)
//! - jobs(job_id, job_title, company_id, salaries, categorical fields, work_year)
//! - job_skills(job_id, skill_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreOptions, Session};
