use anyhow::{Context, Result};
use rusqlite::params;
use std::collections::BTreeMap;
use tracing::info;

use super::{decode, Mean, TENTHS};
use crate::models::{YieldRecord, YieldStats};
use crate::schema::tables::{STATIONS, YIELD_RECORDS, YIELD_STATS};
use crate::writer::Database;

/// Group yield records by (station, year) and average the present values.
///
/// Output is ordered by station then year; groups with no present yield are
/// omitted.
pub fn aggregate_yield<I>(records: I) -> Vec<YieldStats>
where
    I: IntoIterator<Item = YieldRecord>,
{
    let mut groups: BTreeMap<(String, i32), Mean> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.station_id, record.year))
            .or_default()
            .push(decode(record.yield_bu_tenths, TENTHS));
    }

    groups
        .into_iter()
        .filter_map(|((station_id, year), mean)| {
            mean.value().map(|avg| YieldStats {
                station_id,
                year,
                avg_yield_bu: Some(avg),
            })
        })
        .collect()
}

/// Recompute `yield_stats` from `yield_records` in one transaction
pub fn compute_and_store_yield_stats(db: &mut Database) -> Result<usize> {
    db.ensure_tables(&[&STATIONS, &YIELD_RECORDS, &YIELD_STATS])?;
    info!("Ensured yield_stats table exists");

    let tx = db.transaction()?;

    let mut scanned = 0usize;
    let mut read_err = None;
    let stats = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM yield_records ORDER BY station_id, year",
            YieldRecord::COLUMNS
        ))?;
        let rows = stmt
            .query_map([], YieldRecord::from_row)?
            .map_while(|row| row.map_err(|e| read_err = Some(e)).ok())
            .inspect(|_| scanned += 1);
        aggregate_yield(rows)
    };
    if let Some(err) = read_err {
        return Err(err).context("Failed to read yield_records");
    }

    {
        let mut upsert = tx.prepare(
            "INSERT INTO yield_stats (station_id, year, avg_yield_bu)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (station_id, year) DO UPDATE SET
                 avg_yield_bu = excluded.avg_yield_bu",
        )?;
        for row in &stats {
            upsert
                .execute(params![row.station_id, row.year, row.avg_yield_bu])
                .with_context(|| {
                    format!("Failed to upsert yield stats for {} {}", row.station_id, row.year)
                })?;
        }
    }

    tx.commit().context("Failed to commit yield stats")?;
    info!(records = scanned, stats = stats.len(), "Stored yield stats");

    Ok(stats.len())
}
