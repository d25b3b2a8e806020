use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::analysis::compute_and_store_stats;
use crate::scanner::scan_station_files;
use crate::schema::tables::{ALL_TABLES, WEATHER_RECORDS, WEATHER_STATS, YIELD_RECORDS, YIELD_STATS};
use crate::schema::TableSchema;
use crate::ui::{Phase, Ui};
use crate::writer::{ensure_station, BulkLoader, Database, LoadReport};

/// Suffix of the station files both pipelines read
pub const STATION_FILE_SUFFIX: &str = "txt";

/// The weather or yield processing track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Weather,
    Yield,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Weather, PipelineKind::Yield];

    /// Observation table the loader replaces
    pub fn records_table(self) -> &'static TableSchema {
        match self {
            PipelineKind::Weather => &WEATHER_RECORDS,
            PipelineKind::Yield => &YIELD_RECORDS,
        }
    }

    /// Derived table the aggregator upserts into
    pub fn stats_table(self) -> &'static TableSchema {
        match self {
            PipelineKind::Weather => &WEATHER_STATS,
            PipelineKind::Yield => &YIELD_STATS,
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Weather => write!(f, "weather"),
            PipelineKind::Yield => write!(f, "yield"),
        }
    }
}

/// Which pipelines to ingest and where their files live
#[derive(Debug, Clone, Default)]
pub struct IngestPlan {
    pub sources: Vec<(PipelineKind, PathBuf)>,
}

impl IngestPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: PipelineKind, dir: impl Into<PathBuf>) -> Self {
        self.sources.push((kind, dir.into()));
        self
    }
}

/// Load every pipeline in `plan` and commit once at the end.
///
/// Each observation table is replaced wholesale. Any error (unreadable
/// directory, malformed line) rolls the whole run back.
pub fn ingest(db: &mut Database, plan: &IngestPlan, ui: &mut impl Ui) -> Result<Vec<LoadReport>> {
    db.ensure_tables(ALL_TABLES)?;
    info!("Ensured all tables exist");

    let tx = db.transaction()?;
    let mut reports = Vec::with_capacity(plan.sources.len());

    for (kind, dir) in &plan.sources {
        ui.set_phase(Phase::Scanning(*kind));
        let files: Vec<_> = scan_station_files(dir, STATION_FILE_SUFFIX)?.collect();
        ui.log(format!("Found {} {} files in {:?}", files.len(), kind, dir));

        ui.set_phase(Phase::Loading(*kind));
        let total = files.len() as u64;
        let mut loader = BulkLoader::new(&tx, *kind);

        for (idx, file) in files.iter().enumerate() {
            ui.set_progress(idx as u64, total, file.station_id.clone());
            ensure_station(&tx, &file.station_id)?;
            loader
                .load(file)
                .with_context(|| format!("{} ingestion failed", kind))?;
        }
        ui.set_progress(total, total, kind.to_string());

        let report = loader.finish()?;
        ui.log(format!(
            "{}: {} records from {} files",
            kind, report.table_rows, report.files
        ));
        reports.push(report);
    }

    tx.commit().context("Failed to commit ingestion")?;
    ui.set_phase(Phase::Complete);

    Ok(reports)
}

/// Recompute the stats of each pipeline, one transaction per pipeline.
///
/// Returns the number of stats rows written per pipeline.
pub fn analyze(
    db: &mut Database,
    kinds: &[PipelineKind],
    ui: &mut impl Ui,
) -> Result<Vec<(PipelineKind, usize)>> {
    let mut written = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        ui.set_phase(Phase::Aggregating(kind));
        let count = compute_and_store_stats(db, kind)
            .with_context(|| format!("{} analysis failed", kind))?;
        ui.log(format!("{}: {} stats rows", kind.stats_table().name, count));
        written.push((kind, count));
    }

    ui.set_phase(Phase::Complete);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_per_kind() {
        assert_eq!(PipelineKind::Weather.records_table().name, "weather_records");
        assert_eq!(PipelineKind::Weather.stats_table().name, "weather_stats");
        assert_eq!(PipelineKind::Yield.records_table().name, "yield_records");
        assert_eq!(PipelineKind::Yield.stats_table().name, "yield_stats");
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineKind::Weather.to_string(), "weather");
        assert_eq!(PipelineKind::Yield.to_string(), "yield");
    }
}
