use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::PipelineKind;

#[derive(Parser, Debug)]
#[command(name = "agro-ingest")]
#[command(version, about = "Load weather and crop-yield station files into SQLite and derive yearly stats")]
pub struct Cli {
    #[command(flatten)]
    pub db: DbArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Database connection string (path, sqlite://path or :memory:)
    #[arg(long, env = "DB_URL", global = true)]
    pub database: Option<String>,

    /// Connection attempts before giving up
    #[arg(long, default_value_t = 10, global = true)]
    pub connect_attempts: u32,

    /// Pause between connection attempts, in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    pub connect_backoff_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory of per-station weather files
    #[arg(long, env = "WX_DATA_DIR", default_value = "wx_data")]
    pub weather_dir: PathBuf,

    /// Directory of per-station crop-yield files
    #[arg(long, env = "YLD_DATA_DIR", default_value = "yld_data")]
    pub yield_dir: PathBuf,
}

/// Pipeline selection for ingest/analyze
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineArg {
    Weather,
    Yield,
    #[default]
    All,
}

impl PipelineArg {
    pub fn kinds(self) -> Vec<PipelineKind> {
        match self {
            PipelineArg::Weather => vec![PipelineKind::Weather],
            PipelineArg::Yield => vec![PipelineKind::Yield],
            PipelineArg::All => PipelineKind::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace the observation tables with the contents of the data directories
    Ingest {
        #[command(flatten)]
        sources: SourceArgs,

        /// Which pipeline(s) to load
        #[arg(short, long, value_enum, default_value_t)]
        pipeline: PipelineArg,
    },

    /// Recompute yearly stats from the observation tables
    Analyze {
        /// Which pipeline(s) to aggregate
        #[arg(short, long, value_enum, default_value_t)]
        pipeline: PipelineArg,
    },

    /// Ingest then analyze every pipeline
    Run {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Print rows from a table as JSON
    Query {
        #[command(subcommand)]
        target: QueryTarget,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1, global = true)]
        page: u32,

        /// Rows per page
        #[arg(long, default_value_t = 100, global = true)]
        per_page: u32,
    },

    /// List all table names
    ListTables,
}

#[derive(Subcommand, Debug)]
pub enum QueryTarget {
    /// Registered stations
    Stations,

    /// Daily weather records
    Weather {
        #[arg(long)]
        station_id: Option<String>,

        /// First date (YYYY-MM-DD), inclusive
        #[arg(long)]
        date_from: Option<NaiveDate>,

        /// Last date (YYYY-MM-DD), inclusive
        #[arg(long)]
        date_to: Option<NaiveDate>,
    },

    /// Yearly weather stats
    WeatherStats {
        #[arg(long)]
        station_id: Option<String>,

        #[arg(long)]
        year: Option<i32>,
    },

    /// Yearly crop-yield records
    Yield {
        #[arg(long)]
        station_id: Option<String>,

        #[arg(long)]
        year_from: Option<i32>,

        #[arg(long)]
        year_to: Option<i32>,
    },

    /// Yearly crop-yield stats
    YieldStats {
        #[arg(long)]
        station_id: Option<String>,

        #[arg(long)]
        year_from: Option<i32>,

        #[arg(long)]
        year_to: Option<i32>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from([
            "agro-ingest",
            "--database",
            "sqlite://test.db",
            "ingest",
            "--weather-dir",
            "wx",
            "--pipeline",
            "weather",
        ])
        .unwrap();

        assert_eq!(cli.db.database.as_deref(), Some("sqlite://test.db"));
        match cli.command {
            Commands::Ingest { sources, pipeline } => {
                assert_eq!(sources.weather_dir, PathBuf::from("wx"));
                assert_eq!(pipeline.kinds(), vec![PipelineKind::Weather]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from([
            "agro-ingest",
            "query",
            "weather",
            "--date-from",
            "1985-01-01",
            "--page",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Query { target: QueryTarget::Weather { date_from, .. }, page, per_page } => {
                assert_eq!(date_from, NaiveDate::from_ymd_opt(1985, 1, 1));
                assert_eq!(page, 2);
                assert_eq!(per_page, 100);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
