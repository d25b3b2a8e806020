//! Row types for the station, observation and stats tables

use chrono::NaiveDate;
use rusqlite::Row;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub station_id: String,
    pub state: String,
    pub name: Option<String>,
}

impl Station {
    pub const COLUMNS: &'static str = "station_id, state, name";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            station_id: row.get(0)?,
            state: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

/// Daily weather observation, metrics in tenths (`-9999` = missing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherRecord {
    pub station_id: String,
    pub obs_date: NaiveDate,
    pub tmax_c_tenths: i16,
    pub tmin_c_tenths: i16,
    pub precip_mm_tenths: i16,
}

impl WeatherRecord {
    pub const COLUMNS: &'static str =
        "station_id, obs_date, tmax_c_tenths, tmin_c_tenths, precip_mm_tenths";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            station_id: row.get(0)?,
            obs_date: row.get(1)?,
            tmax_c_tenths: row.get(2)?,
            tmin_c_tenths: row.get(3)?,
            precip_mm_tenths: row.get(4)?,
        })
    }
}

/// Yearly crop yield observation in tenths of a bushel (`-9999` = missing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YieldRecord {
    pub station_id: String,
    pub year: i32,
    pub yield_bu_tenths: i64,
}

impl YieldRecord {
    pub const COLUMNS: &'static str = "station_id, year, yield_bu_tenths";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            station_id: row.get(0)?,
            year: row.get(1)?,
            yield_bu_tenths: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherStats {
    pub station_id: String,
    pub year: i32,
    pub avg_tmax_c: Option<f64>,
    pub avg_tmin_c: Option<f64>,
    pub total_precip_cm: Option<f64>,
}

impl WeatherStats {
    pub const COLUMNS: &'static str =
        "station_id, year, avg_tmax_c, avg_tmin_c, total_precip_cm";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            station_id: row.get(0)?,
            year: row.get(1)?,
            avg_tmax_c: row.get(2)?,
            avg_tmin_c: row.get(3)?,
            total_precip_cm: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldStats {
    pub station_id: String,
    pub year: i32,
    pub avg_yield_bu: Option<f64>,
}

impl YieldStats {
    pub const COLUMNS: &'static str = "station_id, year, avg_yield_bu";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            station_id: row.get(0)?,
            year: row.get(1)?,
            avg_yield_bu: row.get(2)?,
        })
    }
}
