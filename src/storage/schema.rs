//! Database schema definitions

/// SQL to create the companies table
pub const CREATE_COMPANIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    company_id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the skills table
pub const CREATE_SKILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS skills (
    skill_id INTEGER PRIMARY KEY AUTOINCREMENT,
    skill_name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the jobs table
///
/// `location_id` and `industry_id` reference external catalogues that are
/// not stored here, so they carry no foreign key.
pub const CREATE_JOBS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_title TEXT,
    job_description TEXT,
    company_id INTEGER REFERENCES companies(company_id),
    location TEXT,
    location_id INTEGER,
    industry_id INTEGER,
    salary_usd INTEGER,
    min_salary INTEGER,
    max_salary INTEGER,
    employment_type TEXT,
    experience_level TEXT,
    work_setting TEXT,
    work_year INTEGER,
    company_size TEXT,
    job_category TEXT
)
"#;

/// SQL to create the job <-> skill join table
pub const CREATE_JOB_SKILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS job_skills (
    job_id INTEGER NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
    skill_id INTEGER NOT NULL REFERENCES skills(skill_id),
    PRIMARY KEY (job_id, skill_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_jobs_work_year ON jobs(work_year)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id)",
    "CREATE INDEX IF NOT EXISTS idx_job_skills_skill ON job_skills(skill_id)",
];

/// All schema creation statements, parents before children
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_COMPANIES_TABLE,
        CREATE_SKILLS_TABLE,
        CREATE_JOBS_TABLE,
        CREATE_JOB_SKILLS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
