//! Job listing, lookup and creation

use std::collections::HashMap;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};
use crate::model::{Company, Job, NewJob, Skill};
use crate::{Error, Result};

/// Rows returned by a listing when the caller gives no limit
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Job ids bound per skill lookup, well under SQLite's host parameter limit
const SKILL_LOOKUP_CHUNK: usize = 500;

const SELECT_JOB: &str = r#"
SELECT j.job_id, j.job_title, j.job_description, j.company_id, c.company_name,
       j.location, j.location_id, j.industry_id, j.salary_usd, j.min_salary, j.max_salary,
       j.employment_type, j.experience_level, j.work_setting, j.job_category,
       j.company_size, j.work_year
FROM jobs j
LEFT JOIN companies c ON c.company_id = j.company_id
"#;

/// Listing parameters
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Substring matched against title, location and category
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            search: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl JobFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    /// The search term, if it would actually filter anything
    fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

/// Read-side job queries over one connection
pub struct JobQueries<'a> {
    conn: &'a Connection,
}

impl<'a> JobQueries<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List jobs in primary-key order.
    ///
    /// Matching uses SQLite `LIKE`, which is case-insensitive for ASCII.
    /// Wildcards in the search term match literally.
    pub fn list(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let limit = filter.limit as i64;
        let offset = filter.offset as i64;

        let mut jobs: Vec<Job> = match filter.term() {
            Some(term) => {
                let pattern = format!("%{}%", escape_like(term));
                let sql = format!(
                    "{} WHERE j.job_title LIKE ?1 ESCAPE '\\'
                        OR j.location LIKE ?1 ESCAPE '\\'
                        OR j.job_category LIKE ?1 ESCAPE '\\'
                     ORDER BY j.job_id LIMIT ?2 OFFSET ?3",
                    SELECT_JOB
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![pattern, limit, offset], row_to_job)?
                    .collect::<rusqlite::Result<Vec<Job>>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY j.job_id LIMIT ?1 OFFSET ?2", SELECT_JOB);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit, offset], row_to_job)?
                    .collect::<rusqlite::Result<Vec<Job>>>()?;
                rows
            }
        };

        self.attach_skills(&mut jobs)?;
        Ok(jobs)
    }

    /// Get a job by ID
    pub fn get(&self, id: i64) -> Result<Option<Job>> {
        let sql = format!("{} WHERE j.job_id = ?1", SELECT_JOB);
        let job = self.conn.query_row(&sql, [id], row_to_job).optional()?;

        match job {
            Some(job) => {
                let mut jobs = vec![job];
                self.attach_skills(&mut jobs)?;
                Ok(jobs.pop())
            }
            None => Ok(None),
        }
    }

    /// Count all jobs
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Fill in skill names, one query per chunk of jobs
    fn attach_skills(&self, jobs: &mut [Job]) -> Result<()> {
        let mut by_job: HashMap<i64, Vec<String>> = HashMap::new();

        for chunk in jobs.chunks(SKILL_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT js.job_id, s.skill_name
                 FROM job_skills js
                 JOIN skills s ON s.skill_id = js.skill_id
                 WHERE js.job_id IN ({})
                 ORDER BY s.skill_name",
                placeholders
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter().map(|j| j.id)), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;

            for row in rows {
                let (job_id, name) = row?;
                by_job.entry(job_id).or_default().push(name);
            }
        }

        for job in jobs.iter_mut() {
            job.skills = by_job.remove(&job.id).unwrap_or_default();
        }
        Ok(())
    }
}

/// Look up a company by exact name, inserting it when absent
pub fn find_or_create_company(conn: &Connection, name: &str) -> Result<Company> {
    let existing = conn
        .query_row(
            "SELECT company_id, company_name FROM companies WHERE company_name = ?1",
            [name],
            |row| Ok(Company { id: row.get(0)?, name: row.get(1)? }),
        )
        .optional()?;

    if let Some(company) = existing {
        return Ok(company);
    }

    conn.execute("INSERT INTO companies (company_name) VALUES (?1)", [name])?;
    tracing::debug!("Created company '{}'", name);
    Ok(Company { id: conn.last_insert_rowid(), name: name.to_string() })
}

/// Look up a skill by exact name, inserting it when absent
pub fn find_or_create_skill(conn: &Connection, name: &str) -> Result<Skill> {
    let existing = conn
        .query_row(
            "SELECT skill_id, skill_name FROM skills WHERE skill_name = ?1",
            [name],
            |row| Ok(Skill { id: row.get(0)?, name: row.get(1)? }),
        )
        .optional()?;

    if let Some(skill) = existing {
        return Ok(skill);
    }

    conn.execute("INSERT INTO skills (skill_name) VALUES (?1)", [name])?;
    tracing::debug!("Created skill '{}'", name);
    Ok(Skill { id: conn.last_insert_rowid(), name: name.to_string() })
}

/// Create a job together with its company and skill associations.
///
/// The whole sequence runs in one transaction: if any step fails nothing is
/// kept, including a company or skills created along the way. The write lock
/// is taken up front so concurrent creators queue on the busy timeout
/// instead of failing to upgrade from a read lock.
///
/// `new_job` must already have passed [`NewJob::validate`].
pub fn create_job(conn: &mut Connection, new_job: &NewJob, default_work_year: i64) -> Result<Job> {
    debug_assert!(new_job.validate().is_ok(), "create_job called with unvalidated input");

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let company = find_or_create_company(&tx, &new_job.company_name)?;

    let mut skills = Vec::new();
    for name in new_job.skill_names() {
        skills.push(find_or_create_skill(&tx, name)?);
    }

    tx.execute(
        r#"
        INSERT INTO jobs (job_title, job_description, company_id, location, location_id, industry_id,
                          salary_usd, min_salary, max_salary, employment_type, experience_level,
                          work_setting, job_category, company_size, work_year)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            new_job.title,
            new_job.description,
            company.id,
            new_job.location,
            new_job.location_id,
            new_job.industry_id,
            new_job.salary_usd,
            new_job.min_salary,
            new_job.max_salary,
            new_job.employment_type,
            new_job.experience_level,
            new_job.work_setting,
            new_job.job_category,
            new_job.company_size,
            new_job.work_year.unwrap_or(default_work_year),
        ],
    )?;
    let job_id = tx.last_insert_rowid();

    for skill in &skills {
        tx.execute(
            "INSERT OR IGNORE INTO job_skills (job_id, skill_id) VALUES (?1, ?2)",
            params![job_id, skill.id],
        )?;
    }

    let job = JobQueries::new(&tx)
        .get(job_id)?
        .ok_or_else(|| Error::NotFound(format!("job {} vanished after insert", job_id)))?;

    tx.commit()?;
    tracing::info!("Created job {} '{}' at {}", job.id, new_job.title, company.name);
    Ok(job)
}

/// Escape `LIKE` wildcards so the term matches literally (escape char `\`)
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Helper to convert a row to a Job (skills are attached separately)
fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
    Ok(Job {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        company_id: row.get(3)?,
        company_name: row.get(4)?,
        location: row.get(5)?,
        location_id: row.get(6)?,
        industry_id: row.get(7)?,
        salary_usd: row.get(8)?,
        min_salary: row.get(9)?,
        max_salary: row.get(10)?,
        employment_type: row.get(11)?,
        experience_level: row.get(12)?,
        work_setting: row.get(13)?,
        job_category: row.get(14)?,
        company_size: row.get(15)?,
        work_year: row.get(16)?,
        skills: Vec::new(),
    })
}
