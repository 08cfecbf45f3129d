//! Analytics aggregation
//!
//! Every figure is computed by the store with GROUP BY / COUNT / AVG, so the
//! service never loads the job table into memory. The whole summary is read
//! inside one transaction and therefore reflects a single snapshot.

use std::fmt;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use crate::Result;

/// Entries kept in the "top N" rankings
pub const TOP_N: usize = 5;

/// Label used for jobs with no value in a grouped column
pub const UNKNOWN_BUCKET: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSalary {
    pub year: i64,
    pub salary: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSalary {
    pub name: String,
    pub salary: i64,
}

/// Analytics summary over all stored jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_jobs: i64,
    /// Mean `min_salary`, truncated; 0 when there is nothing to average
    pub avg_salary: i64,
    pub top_skills: Vec<NamedCount>,
    pub salary_trend: Vec<YearSalary>,
    pub work_setting: Vec<NamedCount>,
    pub company_size: Vec<NamedCount>,
    pub salary_by_experience: Vec<NamedSalary>,
    pub top_categories: Vec<NamedCount>,
}

/// Why a read endpoint answered with its default payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    EmptyStore,
    StoreUnavailable(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EmptyStore => write!(f, "no jobs in store"),
            FallbackReason::StoreUnavailable(cause) => write!(f, "store unavailable: {}", cause),
        }
    }
}

/// A read result that may have been replaced by its default
#[derive(Debug, Clone, PartialEq)]
pub enum Degraded<T> {
    Fresh(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Degraded<T> {
    pub fn value(&self) -> &T {
        match self {
            Degraded::Fresh(value) | Degraded::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Degraded::Fresh(value) | Degraded::Fallback { value, .. } => value,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Degraded::Fresh(_) => None,
            Degraded::Fallback { reason, .. } => Some(reason),
        }
    }
}

impl<T: Default> Degraded<T> {
    /// Substitute the default value when the store could not be read
    pub fn or_unavailable(result: Result<Degraded<T>>) -> Self {
        match result {
            Ok(degraded) => degraded,
            Err(e) => Degraded::Fallback {
                value: T::default(),
                reason: FallbackReason::StoreUnavailable(e.to_string()),
            },
        }
    }
}

/// Grouped categorical columns of `jobs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    WorkSetting,
    CompanySize,
    ExperienceLevel,
    JobCategory,
}

impl Dimension {
    fn column(self) -> &'static str {
        match self {
            Dimension::WorkSetting => "work_setting",
            Dimension::CompanySize => "company_size",
            Dimension::ExperienceLevel => "experience_level",
            Dimension::JobCategory => "job_category",
        }
    }
}

/// Aggregate queries over one connection
pub struct AnalyticsEngine<'a> {
    conn: &'a Connection,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Compute the full summary.
    ///
    /// An empty store yields the all-zero default marked as a fallback.
    pub fn summarize(&self) -> Result<Degraded<Summary>> {
        let snapshot = self.conn.unchecked_transaction()?;

        let total_jobs = self.total_jobs()?;
        if total_jobs == 0 {
            return Ok(Degraded::Fallback {
                value: Summary::default(),
                reason: FallbackReason::EmptyStore,
            });
        }

        let summary = Summary {
            total_jobs,
            avg_salary: self.average_salary()?,
            top_skills: self.top_skills(TOP_N)?,
            salary_trend: self.salary_trend()?,
            work_setting: self.distribution(Dimension::WorkSetting)?,
            company_size: self.distribution(Dimension::CompanySize)?,
            salary_by_experience: self.salary_by(Dimension::ExperienceLevel)?,
            top_categories: self.top_values(Dimension::JobCategory, TOP_N)?,
        };

        snapshot.commit()?;
        tracing::debug!("Analytics prepared over {} jobs", summary.total_jobs);
        Ok(Degraded::Fresh(summary))
    }

    pub fn total_jobs(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn average_salary(&self) -> Result<i64> {
        let avg: Option<f64> = self
            .conn
            .query_row("SELECT AVG(min_salary) FROM jobs", [], |row| row.get(0))?;
        Ok(truncate(avg))
    }

    /// Most used skills; equal counts are ordered by skill name
    pub fn top_skills(&self, limit: usize) -> Result<Vec<NamedCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.skill_name, COUNT(js.job_id) AS uses
             FROM skills s
             JOIN job_skills js ON js.skill_id = s.skill_id
             GROUP BY s.skill_id, s.skill_name
             ORDER BY uses DESC, s.skill_name ASC
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(NamedCount { name: row.get(0)?, count: row.get(1)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Average salary per work year, oldest first
    pub fn salary_trend(&self) -> Result<Vec<YearSalary>> {
        let mut stmt = self.conn.prepare(
            "SELECT work_year, AVG(min_salary)
             FROM jobs
             WHERE work_year IS NOT NULL
             GROUP BY work_year
             ORDER BY work_year ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(YearSalary {
                    year: row.get(0)?,
                    salary: truncate(row.get(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Job count per value, missing values counted as "Unknown"
    fn distribution(&self, dimension: Dimension) -> Result<Vec<NamedCount>> {
        let sql = format!(
            "SELECT COALESCE({col}, '{unknown}') AS bucket, COUNT(*) AS n
             FROM jobs
             GROUP BY bucket
             ORDER BY n DESC, bucket ASC",
            col = dimension.column(),
            unknown = UNKNOWN_BUCKET,
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(NamedCount { name: row.get(0)?, count: row.get(1)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most frequent non-null values
    fn top_values(&self, dimension: Dimension, limit: usize) -> Result<Vec<NamedCount>> {
        let sql = format!(
            "SELECT {col}, COUNT(*) AS n
             FROM jobs
             WHERE {col} IS NOT NULL
             GROUP BY {col}
             ORDER BY n DESC, {col} ASC
             LIMIT ?1",
            col = dimension.column(),
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(NamedCount { name: row.get(0)?, count: row.get(1)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Average salary per value, ordered by value
    fn salary_by(&self, dimension: Dimension) -> Result<Vec<NamedSalary>> {
        let sql = format!(
            "SELECT COALESCE({col}, '{unknown}') AS bucket, AVG(min_salary)
             FROM jobs
             GROUP BY bucket
             ORDER BY bucket ASC",
            col = dimension.column(),
            unknown = UNKNOWN_BUCKET,
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(NamedSalary {
                    name: row.get(0)?,
                    salary: truncate(row.get(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// SQL AVG yields NULL over no values; report that as 0
fn truncate(avg: Option<f64>) -> i64 {
    avg.map(|v| v.trunc() as i64).unwrap_or(0)
}
