//! Read-only filter and paginate queries over the materialized tables

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, Row};

use crate::models::{Station, WeatherRecord, WeatherStats, YieldRecord, YieldStats};

pub const DEFAULT_PER_PAGE: u32 = 100;
pub const MAX_PER_PAGE: u32 = 1000;

/// 1-based page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Build a page, clamping to `page >= 1` and `1..=MAX_PER_PAGE`
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeatherFilter {
    pub station_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherStatsFilter {
    pub station_id: Option<String>,
    pub year: Option<i32>,
}

/// Filter for both yield tables
#[derive(Debug, Clone, Default)]
pub struct YieldFilter {
    pub station_id: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

/// Accumulates `WHERE` conditions with their bound parameters
#[derive(Default)]
struct Conditions {
    clauses: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    fn push<T: ToSql + 'static>(&mut self, clause: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.clauses.push(clause);
            self.params.push(Box::new(value));
        }
    }

    fn fetch<T>(
        self,
        conn: &Connection,
        table: &str,
        columns: &str,
        order_by: &str,
        page: Page,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut sql = format!("SELECT {} FROM {}", columns, table);
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            order_by,
            page.per_page,
            page.offset()
        ));

        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to query {}", table))?;
        let rows = stmt.query_map(params_from_iter(self.params.iter()), map)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to read {}", table))
    }
}

pub fn stations(conn: &Connection, page: Page) -> Result<Vec<Station>> {
    Conditions::default().fetch(
        conn,
        "stations",
        Station::COLUMNS,
        "station_id",
        page,
        Station::from_row,
    )
}

/// Daily weather records, filtered by station and inclusive date range
pub fn weather_records(
    conn: &Connection,
    filter: &WeatherFilter,
    page: Page,
) -> Result<Vec<WeatherRecord>> {
    let mut cond = Conditions::default();
    cond.push("station_id = ?", filter.station_id.clone());
    cond.push(
        "obs_date >= ?",
        filter.date_from.map(|d| d.format("%Y-%m-%d").to_string()),
    );
    cond.push(
        "obs_date <= ?",
        filter.date_to.map(|d| d.format("%Y-%m-%d").to_string()),
    );
    cond.fetch(
        conn,
        "weather_records",
        WeatherRecord::COLUMNS,
        "station_id, obs_date",
        page,
        WeatherRecord::from_row,
    )
}

/// Yearly weather stats, filtered by station and exact year
pub fn weather_stats(
    conn: &Connection,
    filter: &WeatherStatsFilter,
    page: Page,
) -> Result<Vec<WeatherStats>> {
    let mut cond = Conditions::default();
    cond.push("station_id = ?", filter.station_id.clone());
    cond.push("year = ?", filter.year);
    cond.fetch(
        conn,
        "weather_stats",
        WeatherStats::COLUMNS,
        "station_id, year",
        page,
        WeatherStats::from_row,
    )
}

/// Yield records, filtered by station and inclusive year range
pub fn yield_records(
    conn: &Connection,
    filter: &YieldFilter,
    page: Page,
) -> Result<Vec<YieldRecord>> {
    let mut cond = Conditions::default();
    cond.push("station_id = ?", filter.station_id.clone());
    cond.push("year >= ?", filter.year_from);
    cond.push("year <= ?", filter.year_to);
    cond.fetch(
        conn,
        "yield_records",
        YieldRecord::COLUMNS,
        "station_id, year",
        page,
        YieldRecord::from_row,
    )
}

/// Yearly yield stats, filtered by station and inclusive year range
pub fn yield_stats(conn: &Connection, filter: &YieldFilter, page: Page) -> Result<Vec<YieldStats>> {
    let mut cond = Conditions::default();
    cond.push("station_id = ?", filter.station_id.clone());
    cond.push("year >= ?", filter.year_from);
    cond.push("year <= ?", filter.year_to);
    cond.fetch(
        conn,
        "yield_stats",
        YieldStats::COLUMNS,
        "station_id, year",
        page,
        YieldStats::from_row,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::ALL_TABLES;
    use crate::writer::Database;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.ensure_tables(ALL_TABLES).unwrap();
        db.connection()
            .execute_batch(
                "INSERT INTO stations (station_id, state) VALUES ('A1', 'A1'), ('B2', 'B2');
                 INSERT INTO weather_records VALUES
                     ('A1', '2000-01-01', 10, 1, 0),
                     ('A1', '2000-01-02', 20, 2, 0),
                     ('A1', '2000-01-03', 30, 3, 0),
                     ('B2', '2000-01-01', 40, 4, 0);
                 INSERT INTO yield_stats VALUES ('A1', 1999, 10.0), ('A1', 2000, NULL), ('B2', 2001, 5.5);",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_page_offsets() {
        assert_eq!(Page::default().offset(), 0);
        assert_eq!(Page::new(3, 10).offset(), 20);
        assert_eq!(Page::new(0, 0), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(1, 5000).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_weather_date_range() {
        let db = seeded();
        let filter = WeatherFilter {
            station_id: Some("A1".to_string()),
            date_from: NaiveDate::from_ymd_opt(2000, 1, 2),
            date_to: None,
        };
        let rows = weather_records(db.connection(), &filter, Page::default()).unwrap();
        let temps: Vec<_> = rows.iter().map(|r| r.tmax_c_tenths).collect();
        assert_eq!(temps, vec![20, 30]);
    }

    #[test]
    fn test_weather_pagination() {
        let db = seeded();
        let page2 = weather_records(db.connection(), &WeatherFilter::default(), Page::new(2, 3)).unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].station_id, "B2");
    }

    #[test]
    fn test_yield_stats_year_range() {
        let db = seeded();
        let filter = YieldFilter {
            station_id: None,
            year_from: Some(2000),
            year_to: Some(2001),
        };
        let rows = yield_stats(db.connection(), &filter, Page::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].avg_yield_bu, None);
        assert_eq!(rows[1].avg_yield_bu, Some(5.5));
    }

    #[test]
    fn test_stations_listing() {
        let db = seeded();
        let rows = stations(db.connection(), Page::default()).unwrap();
        let ids: Vec<_> = rows.into_iter().map(|s| s.station_id).collect();
        assert_eq!(ids, vec!["A1", "B2"]);
    }
}
