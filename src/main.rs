use anyhow::Result;
use agro_ingest::{
    analyze,
    cli::{Cli, Commands, DbArgs, QueryTarget, SourceArgs},
    config::{DatabaseLocation, DbConfig},
    ingest,
    query::{self, Page, WeatherFilter, WeatherStatsFilter, YieldFilter},
    schema::table_names,
    writer::Database,
    ConsoleUi, IngestPlan, PipelineKind,
};
use serde::Serialize;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Run failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest { sources, pipeline } => {
            let start = Instant::now();
            let mut db = connect(&cli.db)?;
            let mut ui = ConsoleUi::new();

            let plan = plan_for(&sources, &pipeline.kinds());
            let reports = ingest(&mut db, &plan, &mut ui)?;
            let total: u64 = reports.iter().map(|r| r.table_rows).sum();

            db.close()?;
            info!(
                "Ingested {} records in {:.1}s",
                total,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Analyze { pipeline } => {
            let start = Instant::now();
            let mut db = connect(&cli.db)?;
            let mut ui = ConsoleUi::new();

            analyze(&mut db, &pipeline.kinds(), &mut ui)?;

            db.close()?;
            info!("Analysis finished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Run { sources } => {
            let start = Instant::now();
            let mut db = connect(&cli.db)?;
            let mut ui = ConsoleUi::new();

            let plan = plan_for(&sources, &PipelineKind::ALL);
            ingest(&mut db, &plan, &mut ui)?;
            analyze(&mut db, &PipelineKind::ALL, &mut ui)?;

            db.close()?;
            info!("Run finished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Query {
            target,
            page,
            per_page,
        } => {
            let db = connect(&cli.db)?;
            let conn = db.connection();
            let page = Page::new(page, per_page);

            match target {
                QueryTarget::Stations => print_json(&query::stations(conn, page)?)?,
                QueryTarget::Weather {
                    station_id,
                    date_from,
                    date_to,
                } => {
                    let filter = WeatherFilter {
                        station_id,
                        date_from,
                        date_to,
                    };
                    print_json(&query::weather_records(conn, &filter, page)?)?
                }
                QueryTarget::WeatherStats { station_id, year } => {
                    let filter = WeatherStatsFilter { station_id, year };
                    print_json(&query::weather_stats(conn, &filter, page)?)?
                }
                QueryTarget::Yield {
                    station_id,
                    year_from,
                    year_to,
                } => {
                    let filter = YieldFilter {
                        station_id,
                        year_from,
                        year_to,
                    };
                    print_json(&query::yield_records(conn, &filter, page)?)?
                }
                QueryTarget::YieldStats {
                    station_id,
                    year_from,
                    year_to,
                } => {
                    let filter = YieldFilter {
                        station_id,
                        year_from,
                        year_to,
                    };
                    print_json(&query::yield_stats(conn, &filter, page)?)?
                }
            }
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn connect(args: &DbArgs) -> Result<Database> {
    let location = DatabaseLocation::resolve(args.database.as_deref())?;
    let config = DbConfig::new(location).with_retry(
        args.connect_attempts,
        Duration::from_millis(args.connect_backoff_ms),
    );
    Database::connect(&config)
}

fn plan_for(sources: &SourceArgs, kinds: &[PipelineKind]) -> IngestPlan {
    kinds.iter().fold(IngestPlan::new(), |plan, kind| match kind {
        PipelineKind::Weather => plan.with(*kind, &sources.weather_dir),
        PipelineKind::Yield => plan.with(*kind, &sources.yield_dir),
    })
}

fn print_json<T: Serialize>(rows: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}
