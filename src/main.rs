//! JobTrends CLI - serve the Job Trends API or inspect its analytics

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use jobtrends::config::{self, JobTrendsConfig};
use jobtrends::query::{AnalyticsEngine, FallbackReason};
use jobtrends::storage::SqliteStore;
use jobtrends::ui::{self, Icons};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "jobtrends")]
#[command(version)]
#[command(about = "Job Trends API - job postings with salary and skill analytics")]
#[command(long_about = r#"
JobTrends stores job postings in SQLite and serves them over HTTP:
  • GET  /jobs               list and search postings
  • POST /jobs               create a posting (company and skills are found or created)
  • GET  /analytics/summary  salary trends, top skills, work-setting mix
  • GET  /health             store reachability

Example usage:
  jobtrends init-config
  jobtrends serve --port 8000
  jobtrends summary --json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: jobtrends.toml)
    #[arg(short, long, global = true, env = "JOBTRENDS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "JOBTRENDS_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "JOBTRENDS_PORT")]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long, env = "JOBTRENDS_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Print the analytics summary
    Summary {
        /// Path to the database file
        #[arg(short, long, env = "JOBTRENDS_DATABASE")]
        database: Option<PathBuf>,

        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Create the database schema if it does not exist
    InitDb {
        /// Path to the database file
        #[arg(short, long, env = "JOBTRENDS_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { host, port, database } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }

            tracing::info!("Starting Job Trends API");
            jobtrends::server::start_server(config).await?;
        }

        Commands::Summary { database, json } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            if let Some(database) = database {
                config.database = database;
            }
            print_summary(&config, json)?;
        }

        Commands::InitDb { database } => {
            let mut config = resolve_config(cli.config.as_deref())?;
            if let Some(database) = database {
                config.database = database;
            }
            config::ensure_db_dir(&config.database)?;
            SqliteStore::open(&config.database, &config.store_options())?;
            ui::success(&format!("Database tables ready at {}", config.database.display()));
        }

        Commands::InitConfig { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &JobTrendsConfig::default(), force)?;
            ui::success(&format!("Wrote default config to {}", path.display()));
        }
    }

    Ok(())
}

/// File values (if any) over built-in defaults. An explicitly named file must exist.
fn resolve_config(path: Option<&Path>) -> anyhow::Result<JobTrendsConfig> {
    match config::load_config(path)? {
        Some(config) => Ok(config),
        None => {
            if let Some(path) = path {
                anyhow::bail!("config file {} not found", path.display());
            }
            Ok(JobTrendsConfig::default())
        }
    }
}

fn print_summary(config: &JobTrendsConfig, json: bool) -> anyhow::Result<()> {
    if !config.database.exists() {
        anyhow::bail!("database {} does not exist (run `jobtrends init-db`)", config.database.display());
    }

    let store = SqliteStore::open(&config.database, &config.store_options())?;
    let session = store.session()?;
    let result = AnalyticsEngine::new(&session).summarize()?;

    if let Some(FallbackReason::EmptyStore) = result.fallback_reason() {
        if !json {
            ui::warn("No jobs found in database. Create some with POST /jobs.");
        }
    }
    let summary = result.into_value();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    ui::header("Job Trends Summary");
    ui::status(Icons::DATABASE, "Database", &config.database.display().to_string());
    ui::status(Icons::BRIEFCASE, "Total jobs", &summary.total_jobs.to_string());
    ui::status(Icons::MONEY, "Average salary", &ui::format_usd(summary.avg_salary));

    let sections = [
        (format!("{} Salary trend", Icons::CHART), ui::trend_table(&summary.salary_trend)),
        (format!("{} Top skills", Icons::WRENCH), ui::counts_table(&summary.top_skills)),
        (format!("{} Work setting", Icons::STATS), ui::counts_table(&summary.work_setting)),
        (format!("{} Company size", Icons::STATS), ui::counts_table(&summary.company_size)),
        (format!("{} Salary by experience", Icons::MONEY), ui::experience_table(&summary.salary_by_experience)),
        (format!("{} Top categories", Icons::STATS), ui::counts_table(&summary.top_categories)),
    ];

    for (title, table) in sections {
        ui::section(&title);
        if table.is_empty() {
            ui::summary_row("(none)", "");
        } else {
            println!("{}", table);
        }
    }

    Ok(())
}
