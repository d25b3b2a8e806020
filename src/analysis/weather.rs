use anyhow::{Context, Result};
use chrono::Datelike;
use rusqlite::params;
use std::collections::BTreeMap;
use tracing::info;

use super::{decode, Mean, Total, TENTHS, TENTHS_MM_PER_CM};
use crate::models::{WeatherRecord, WeatherStats};
use crate::schema::tables::{STATIONS, WEATHER_RECORDS, WEATHER_STATS};
use crate::writer::Database;

#[derive(Debug, Default)]
struct YearAccumulator {
    tmax_c: Mean,
    tmin_c: Mean,
    precip_cm: Total,
}

impl YearAccumulator {
    fn push(&mut self, record: &WeatherRecord) {
        self.tmax_c.push(decode(record.tmax_c_tenths.into(), TENTHS));
        self.tmin_c.push(decode(record.tmin_c_tenths.into(), TENTHS));
        self.precip_cm
            .push(decode(record.precip_mm_tenths.into(), TENTHS_MM_PER_CM));
    }

    /// Stats for the group, or `None` if every metric was missing
    fn finish(&self, station_id: String, year: i32) -> Option<WeatherStats> {
        let stats = WeatherStats {
            station_id,
            year,
            avg_tmax_c: self.tmax_c.value(),
            avg_tmin_c: self.tmin_c.value(),
            total_precip_cm: self.precip_cm.value(),
        };

        let any_present = stats.avg_tmax_c.is_some()
            || stats.avg_tmin_c.is_some()
            || stats.total_precip_cm.is_some();
        any_present.then_some(stats)
    }
}

/// Group daily records by (station, year) and aggregate them.
///
/// Output is ordered by station then year. Groups without a single present
/// metric are omitted.
pub fn aggregate_weather<I>(records: I) -> Vec<WeatherStats>
where
    I: IntoIterator<Item = WeatherRecord>,
{
    let mut groups: BTreeMap<(String, i32), YearAccumulator> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.station_id.clone(), record.obs_date.year()))
            .or_default()
            .push(&record);
    }

    groups
        .into_iter()
        .filter_map(|((station_id, year), acc)| acc.finish(station_id, year))
        .collect()
}

/// Recompute `weather_stats` from `weather_records` in one transaction
pub fn compute_and_store_weather_stats(db: &mut Database) -> Result<usize> {
    db.ensure_tables(&[&STATIONS, &WEATHER_RECORDS, &WEATHER_STATS])?;
    info!("Ensured weather_stats table exists");

    let tx = db.transaction()?;

    // Primary-key order keeps the floating-point sums reproducible
    let mut scanned = 0usize;
    let mut read_err = None;
    let stats = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM weather_records ORDER BY station_id, obs_date",
            WeatherRecord::COLUMNS
        ))?;
        let rows = stmt
            .query_map([], WeatherRecord::from_row)?
            .map_while(|row| row.map_err(|e| read_err = Some(e)).ok())
            .inspect(|_| scanned += 1);
        aggregate_weather(rows)
    };
    if let Some(err) = read_err {
        return Err(err).context("Failed to read weather_records");
    }

    {
        let mut upsert = tx.prepare(
            "INSERT INTO weather_stats (station_id, year, avg_tmax_c, avg_tmin_c, total_precip_cm)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (station_id, year) DO UPDATE SET
                 avg_tmax_c = excluded.avg_tmax_c,
                 avg_tmin_c = excluded.avg_tmin_c,
                 total_precip_cm = excluded.total_precip_cm",
        )?;
        for row in &stats {
            upsert
                .execute(params![
                    row.station_id,
                    row.year,
                    row.avg_tmax_c,
                    row.avg_tmin_c,
                    row.total_precip_cm
                ])
                .with_context(|| {
                    format!("Failed to upsert weather stats for {} {}", row.station_id, row.year)
                })?;
        }
    }

    tx.commit().context("Failed to commit weather stats")?;
    info!(records = scanned, stats = stats.len(), "Stored weather stats");

    Ok(stats.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(station: &str, date: (i32, u32, u32), tmax: i16, tmin: i16, precip: i16) -> WeatherRecord {
        WeatherRecord {
            station_id: station.to_string(),
            obs_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            tmax_c_tenths: tmax,
            tmin_c_tenths: tmin,
            precip_mm_tenths: precip,
        }
    }

    #[test]
    fn test_basic_year() {
        let stats = aggregate_weather(vec![
            record("S1", (2000, 1, 1), 200, 50, 100),
            record("S1", (2000, 1, 2), 300, 150, 200),
            record("S1", (2000, 1, 3), -9999, -9999, -9999),
        ]);

        assert_eq!(
            stats,
            vec![WeatherStats {
                station_id: "S1".to_string(),
                year: 2000,
                avg_tmax_c: Some(25.0),
                avg_tmin_c: Some(10.0),
                total_precip_cm: Some(3.0),
            }]
        );
    }

    #[test]
    fn test_all_missing_group_omitted() {
        let stats = aggregate_weather(vec![
            record("S2", (2001, 5, 1), -9999, -9999, -9999),
            record("S2", (2001, 6, 1), -9999, -9999, -9999),
        ]);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_metrics_decoded_independently() {
        let stats = aggregate_weather(vec![
            record("S3", (1990, 3, 1), 100, -9999, -9999),
            record("S3", (1990, 3, 2), -9999, 20, -9999),
        ]);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].avg_tmax_c, Some(10.0));
        assert_eq!(stats[0].avg_tmin_c, Some(2.0));
        assert_eq!(stats[0].total_precip_cm, None);
    }

    #[test]
    fn test_groups_split_by_station_and_year() {
        let stats = aggregate_weather(vec![
            record("B", (1985, 12, 31), 10, 0, 5),
            record("A", (1986, 1, 1), 20, 0, 5),
            record("A", (1985, 1, 1), 30, 0, 5),
        ]);

        let keys: Vec<_> = stats.iter().map(|s| (s.station_id.as_str(), s.year)).collect();
        assert_eq!(keys, vec![("A", 1985), ("A", 1986), ("B", 1985)]);
    }
}
