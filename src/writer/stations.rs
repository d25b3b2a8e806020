use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// Number of leading identifier characters used as the region code
const REGION_CODE_LEN: usize = 2;

/// Default region code for a station: the first two characters of its id.
///
/// Only used when the station is first inserted; never recomputed.
pub fn region_code(station_id: &str) -> String {
    station_id.chars().take(REGION_CODE_LEN).collect()
}

/// Insert the station if it is not registered yet.
///
/// Returns `true` when a row was inserted. Existing rows are left untouched,
/// so concurrent pipelines can register the same station safely.
pub fn ensure_station(conn: &Connection, station_id: &str) -> Result<bool> {
    let inserted = conn
        .prepare_cached(
            "INSERT INTO stations (station_id, state) VALUES (?1, ?2)
             ON CONFLICT (station_id) DO NOTHING",
        )?
        .execute(params![station_id, region_code(station_id)])
        .with_context(|| format!("Failed to register station {}", station_id))?;

    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::STATIONS;
    use crate::writer::Database;

    #[test]
    fn test_region_code() {
        assert_eq!(region_code("USC00110072"), "US");
        assert_eq!(region_code("S1"), "S1");
        assert_eq!(region_code("X"), "X");
    }

    #[test]
    fn test_ensure_station_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_tables(&[&STATIONS]).unwrap();

        assert!(ensure_station(db.connection(), "USC00110072").unwrap());
        assert!(!ensure_station(db.connection(), "USC00110072").unwrap());
        assert_eq!(db.count_rows("stations").unwrap(), 1);
    }

    #[test]
    fn test_existing_station_not_updated() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_tables(&[&STATIONS]).unwrap();
        db.connection()
            .execute(
                "INSERT INTO stations (station_id, state, name) VALUES ('USC00110072', 'IL', 'Urbana')",
                [],
            )
            .unwrap();

        ensure_station(db.connection(), "USC00110072").unwrap();

        let (state, name): (String, Option<String>) = db
            .connection()
            .query_row(
                "SELECT state, name FROM stations WHERE station_id = 'USC00110072'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(state, "IL");
        assert_eq!(name.as_deref(), Some("Urbana"));
    }
}
