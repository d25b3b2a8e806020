pub mod loader;
pub mod schema_gen;
pub mod sqlite;
pub mod stations;

pub use loader::{BulkLoader, LoadReport};
pub use sqlite::{count_rows, ensure_table, Database};
pub use stations::{ensure_station, region_code};
