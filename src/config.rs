use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Database file created when no connection string is configured
pub const DEFAULT_DB_FILE: &str = "agro.db";

/// Where the SQLite database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parse a connection string.
    ///
    /// Accepts a plain path, `sqlite://path`, `sqlite:path` or `:memory:`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if path.is_empty() {
            bail!("Database connection string {:?} has no path", url);
        }
        if path == ":memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        if url.contains("://") && !url.starts_with("sqlite://") {
            bail!("Unsupported database scheme in {:?} (expected sqlite://)", url);
        }

        Ok(DatabaseLocation::File(PathBuf::from(path)))
    }

    /// Resolve the configured connection string, falling back to the
    /// platform data directory.
    pub fn resolve(url: Option<&str>) -> Result<Self> {
        match url {
            Some(url) => Self::parse(url),
            None => {
                let proj_dirs = ProjectDirs::from("", "", "agro-ingest")
                    .context("Could not determine data directory")?;
                let data_dir = proj_dirs.data_dir();
                fs::create_dir_all(data_dir).context("Failed to create data directory")?;
                Ok(DatabaseLocation::File(data_dir.join(DEFAULT_DB_FILE)))
            }
        }
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::Memory => write!(f, ":memory:"),
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Connection settings, including the startup retry policy
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DatabaseLocation,
    /// Total connection attempts before giving up
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            max_attempts: 10,
            backoff: Duration::from_secs(2),
            busy_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert_eq!(DatabaseLocation::parse(":memory:").unwrap(), DatabaseLocation::Memory);
        assert_eq!(
            DatabaseLocation::parse("sqlite::memory:").unwrap(),
            DatabaseLocation::Memory
        );
        assert_eq!(
            DatabaseLocation::parse("sqlite:///tmp/agro.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("/tmp/agro.db"))
        );
        assert_eq!(
            DatabaseLocation::parse("sqlite:data/agro.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("data/agro.db"))
        );
        assert_eq!(
            DatabaseLocation::parse("agro.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("agro.db"))
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(DatabaseLocation::parse("postgresql://user:pass@db:5432/weatherdb").is_err());
        assert!(DatabaseLocation::parse("sqlite://").is_err());
    }

    #[test]
    fn test_retry_needs_one_attempt() {
        let config = DbConfig::new(DatabaseLocation::Memory).with_retry(0, Duration::ZERO);
        assert_eq!(config.max_attempts, 1);
    }
}
