//! Table schema definitions for the station, observation and stats tables

use super::types::*;

// =============================================================================
// Station registry
// =============================================================================

pub static STATIONS: TableSchema = TableSchema {
    name: "stations",
    columns: &[
        Column::required("station_id", ColumnType::Text),
        Column::required("state", ColumnType::Text),
        Column::new("name", ColumnType::Text),
    ],
    primary_key: &["station_id"],
    foreign_keys: &[],
};

// =============================================================================
// Observation tables (truncated and reloaded on every ingest)
// =============================================================================

pub static WEATHER_RECORDS: TableSchema = TableSchema {
    name: "weather_records",
    columns: &[
        Column::required("station_id", ColumnType::Text),
        Column::required("obs_date", ColumnType::Date),
        Column::required("tmax_c_tenths", ColumnType::SmallInt),
        Column::required("tmin_c_tenths", ColumnType::SmallInt),
        Column::required("precip_mm_tenths", ColumnType::SmallInt),
    ],
    primary_key: &["station_id", "obs_date"],
    foreign_keys: &[ForeignKey::new("station_id", "stations").on_delete_cascade()],
};

pub static YIELD_RECORDS: TableSchema = TableSchema {
    name: "yield_records",
    columns: &[
        Column::required("station_id", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::required("yield_bu_tenths", ColumnType::Integer),
    ],
    primary_key: &["station_id", "year"],
    foreign_keys: &[ForeignKey::new("station_id", "stations").on_delete_cascade()],
};

// =============================================================================
// Derived yearly stats (upserted by the aggregator)
// =============================================================================

pub static WEATHER_STATS: TableSchema = TableSchema {
    name: "weather_stats",
    columns: &[
        Column::required("station_id", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::new("avg_tmax_c", ColumnType::Real),
        Column::new("avg_tmin_c", ColumnType::Real),
        Column::new("total_precip_cm", ColumnType::Real),
    ],
    primary_key: &["station_id", "year"],
    foreign_keys: &[],
};

pub static YIELD_STATS: TableSchema = TableSchema {
    name: "yield_stats",
    columns: &[
        Column::required("station_id", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::new("avg_yield_bu", ColumnType::Real),
    ],
    primary_key: &["station_id", "year"],
    foreign_keys: &[],
};

/// All tables, parents before children
pub static ALL_TABLES: &[&TableSchema] = &[
    &STATIONS,
    &WEATHER_RECORDS,
    &YIELD_RECORDS,
    &WEATHER_STATS,
    &YIELD_STATS,
];

/// Look up a table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

/// Names of all known tables
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
