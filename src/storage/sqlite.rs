//! SQLite storage implementation

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use crate::{Result, Error};
use super::schema;

/// One checked-out connection. Returned to the pool when dropped.
pub type Session = PooledConnection<SqliteConnectionManager>;

/// Pool and connection tuning
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub pool_size: u32,
    pub busy_timeout: Duration,
    pub connection_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// SQLite-backed storage for job postings, shared across requests
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        let manager = Self::manager(SqliteConnectionManager::file(path), options.busy_timeout);
        let pool = Pool::builder()
            .max_size(options.pool_size)
            .connection_timeout(options.connection_timeout)
            .build(manager)?;

        let store = Self { pool };
        store.initialize_schema()?;
        tracing::debug!("Opened store at {:?} (pool size {})", path, options.pool_size);
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    ///
    /// Every pooled connection sees the same database through a uniquely
    /// named shared-cache URI. Connections are never reaped, since the data
    /// lives only as long as one of them stays open.
    pub fn open_in_memory() -> Result<Self> {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
        let uri = format!(
            "file:jobtrends_mem_{}?mode=memory&cache=shared",
            NEXT_ID.fetch_add(1, Ordering::Relaxed)
        );

        let options = StoreOptions::default();
        let manager = Self::manager(SqliteConnectionManager::file(uri), options.busy_timeout);
        let pool = Pool::builder()
            .max_size(4)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(options.connection_timeout)
            .build(manager)?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn manager(manager: SqliteConnectionManager, busy_timeout: Duration) -> SqliteConnectionManager {
        manager.with_init(move |conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(busy_timeout)?;
            Ok(())
        })
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.session()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Check out a connection for the current unit of work
    pub fn session(&self) -> Result<Session> {
        Ok(self.pool.get()?)
    }

    /// Run blocking store work on the blocking thread pool.
    ///
    /// The closure gets exactly one pooled connection, which goes back to
    /// the pool when the closure returns, errors or panics.
    pub async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut session = pool.get()?;
            work(&mut session)
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Connections currently open (idle or checked out)
    pub fn open_connections(&self) -> u32 {
        self.pool.state().connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_schema_created() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.session().unwrap();
        assert_eq!(
            table_names(&conn),
            vec!["companies", "job_skills", "jobs", "skills"]
        );
    }

    #[test]
    fn test_schema_creation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");

        let first = SqliteStore::open(&path, &StoreOptions::default()).unwrap();
        first
            .session()
            .unwrap()
            .execute("INSERT INTO companies (company_name) VALUES ('Acme')", [])
            .unwrap();
        drop(first);

        let second = SqliteStore::open(&path, &StoreOptions::default()).unwrap();
        let count: i64 = second
            .session()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.session().unwrap();
        let result = conn.execute("INSERT INTO job_skills (job_id, skill_id) VALUES (99, 99)", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_sessions_share_in_memory_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.session().unwrap();
        let b = store.session().unwrap();
        a.execute("INSERT INTO skills (skill_name) VALUES ('Rust')", []).unwrap();
        let count: i64 = b
            .query_row("SELECT COUNT(*) FROM skills", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_run_releases_session() {
        let store = SqliteStore::open_in_memory().unwrap();
        for _ in 0..10 {
            let n: i64 = store
                .run(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?))
                .await
                .unwrap();
            assert_eq!(n, 1);
        }

        let failed: Result<()> = store
            .run(|conn| {
                conn.execute("SELECT * FROM missing_table", [])?;
                Ok(())
            })
            .await;
        assert!(matches!(failed, Err(Error::Storage(_))));
        assert!(store.open_connections() <= 4);
        assert!(store.session().is_ok());
    }
}
