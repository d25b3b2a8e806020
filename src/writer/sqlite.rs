use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::thread;
use tracing::{info, warn};

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::config::{DatabaseLocation, DbConfig};
use crate::schema::TableSchema;

/// Process-wide database handle, created once at startup and passed to
/// each pipeline step
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the configured database, retrying with a fixed backoff
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let mut last_err = None;

        for attempt in 1..=config.max_attempts {
            match open_connection(config) {
                Ok(conn) => {
                    info!(database = %config.location, attempt, "Connected to database");
                    return Ok(Self { conn });
                }
                Err(err) => {
                    warn!(
                        database = %config.location,
                        attempt,
                        max_attempts = config.max_attempts,
                        error = %format!("{:#}", err),
                        "Database connection failed"
                    );
                    last_err = Some(err);
                    if attempt < config.max_attempts {
                        thread::sleep(config.backoff);
                    }
                }
            }
        }

        let err = last_err.unwrap_or_else(|| anyhow!("no connection attempt was made"));
        Err(err.context(format!(
            "Could not connect to {} after {} attempts",
            config.location, config.max_attempts
        )))
    }

    /// Fresh in-memory database with the same pragmas as a file database
    pub fn open_in_memory() -> Result<Self> {
        let config = DbConfig::new(DatabaseLocation::Memory);
        Ok(Self {
            conn: open_connection(&config)?,
        })
    }

    /// Create the given tables (and their FK indexes) if they are missing
    pub fn ensure_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        for schema in schemas {
            ensure_table(&self.conn, schema)?;
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin an explicit transaction; dropped without commit it rolls back.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`) so that a scope
    /// which reads before it writes waits on `busy_timeout` for another
    /// writer instead of failing to upgrade a stale read snapshot.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")
    }

    /// Number of rows currently in `table`
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        count_rows(&self.conn, table)
    }

    /// Finalize the database before exit
    pub fn close(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }
}

/// Create a table and its indexes if absent
pub fn ensure_table(conn: &Connection, schema: &TableSchema) -> Result<()> {
    let sql = generate_create_table(schema);
    conn.execute(&sql, [])
        .with_context(|| format!("Failed to create table: {}", schema.name))?;

    for index_sql in generate_indexes(schema) {
        conn.execute(&index_sql, [])
            .with_context(|| format!("Failed to create index for: {}", schema.name))?;
    }

    Ok(())
}

/// Number of rows currently in `table`
pub fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .with_context(|| format!("Failed to count rows in {}", table))?;
    Ok(count as u64)
}

fn open_connection(config: &DbConfig) -> Result<Connection> {
    let conn = match &config.location {
        DatabaseLocation::Memory => Connection::open_in_memory(),
        DatabaseLocation::File(path) => Connection::open(path),
    }
    .with_context(|| format!("Failed to open database {}", config.location))?;

    // Set first: switching to WAL takes a lock another connection may hold
    conn.busy_timeout(config.busy_timeout)?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -64000;",
    )
    .context("Failed to configure database")?;

    // Probe so that a bad file surfaces here rather than mid-run
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .context("Database did not answer")?;

    Ok(conn)
}
