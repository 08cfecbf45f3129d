//! Domain records: jobs, companies, skills and the job creation input

use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// Earliest and latest accepted `work_year`
pub const WORK_YEAR_RANGE: std::ops::RangeInclusive<i64> = 1900..=2100;

/// A job posting as stored and served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub location_id: Option<i64>,
    pub industry_id: Option<i64>,
    pub salary_usd: Option<i64>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub work_setting: Option<String>,
    pub job_category: Option<String>,
    pub company_size: Option<String>,
    pub work_year: Option<i64>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

/// Request body for creating a job.
///
/// Only `title` and `company_name` are required. The company is looked up by
/// exact name and created when missing; skills are handled the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub industry_id: Option<i64>,
    #[serde(default)]
    pub salary_usd: Option<i64>,
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub max_salary: Option<i64>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub work_setting: Option<String>,
    #[serde(default)]
    pub job_category: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub work_year: Option<i64>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company_name: company_name.into(),
            ..Default::default()
        }
    }

    /// Reject inputs that can never produce a sensible row
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if self.company_name.trim().is_empty() {
            return Err(Error::Validation("company_name must not be empty".to_string()));
        }

        for (field, value) in [
            ("salary_usd", self.salary_usd),
            ("min_salary", self.min_salary),
            ("max_salary", self.max_salary),
        ] {
            if matches!(value, Some(v) if v < 0) {
                return Err(Error::Validation(format!("{} must not be negative", field)));
            }
        }

        if let (Some(min), Some(max)) = (self.min_salary, self.max_salary) {
            if min > max {
                return Err(Error::Validation(format!(
                    "min_salary ({}) exceeds max_salary ({})",
                    min, max
                )));
            }
        }

        if let Some(year) = self.work_year {
            if !WORK_YEAR_RANGE.contains(&year) {
                return Err(Error::Validation(format!("work_year {} is out of range", year)));
            }
        }

        if self.skill_names().iter().any(|s| s.trim().is_empty()) {
            return Err(Error::Validation("skill names must not be empty".to_string()));
        }

        Ok(())
    }

    /// Skill names deduplicated by exact text, first occurrence wins
    pub fn skill_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.skills.iter().flatten() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }
}
