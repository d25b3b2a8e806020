use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, info, warn};

use super::sqlite::count_rows;
use crate::parser::{parse_record, ParsedRow};
use crate::pipeline::PipelineKind;
use crate::scanner::StationFile;
use crate::schema::TableSchema;

const BATCH_SIZE: usize = 1000;

/// Outcome of loading every file of one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub kind: PipelineKind,
    pub files: usize,
    /// Sum of per-file line counts
    pub expected_rows: u64,
    /// Rows found in the table after loading
    pub table_rows: u64,
}

impl LoadReport {
    pub fn is_consistent(&self) -> bool {
        self.expected_rows == self.table_rows
    }
}

/// Appends station files into one observation table.
///
/// The table is emptied before the first file is appended, so a run always
/// replaces the previous snapshot. Run it inside a transaction: a failed
/// file then rolls the table back to its last committed state.
pub struct BulkLoader<'conn> {
    conn: &'conn Connection,
    kind: PipelineKind,
    schema: &'static TableSchema,
    insert_sql: String,
    truncated: bool,
    files: usize,
    expected_rows: u64,
}

impl<'conn> BulkLoader<'conn> {
    pub fn new(conn: &'conn Connection, kind: PipelineKind) -> Self {
        let schema = kind.records_table();
        let columns = schema.column_names();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.name,
            columns.join(", "),
            placeholders.join(", ")
        );

        Self {
            conn,
            kind,
            schema,
            insert_sql,
            truncated: false,
            files: 0,
            expected_rows: 0,
        }
    }

    /// Load one station file, returning the number of rows appended.
    ///
    /// The station must already be registered.
    pub fn load(&mut self, file: &StationFile) -> Result<u64> {
        self.truncate_once()?;

        let reader = BufReader::new(
            File::open(&file.path).with_context(|| format!("Failed to open: {:?}", file.path))?,
        );

        let mut line_count: u64 = 0;
        let mut count: u64 = 0;
        let mut batch: Vec<ParsedRow> = Vec::with_capacity(BATCH_SIZE);

        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line from {:?}", file.path))?;
            line_count += 1;

            let row = parse_record(&line, idx + 1, self.schema)
                .with_context(|| format!("Malformed record in {:?}", file.path))?;
            batch.push(row);

            if batch.len() >= BATCH_SIZE {
                self.insert_batch(&file.station_id, &batch)?;
                count += batch.len() as u64;
                batch.clear();
            }
        }

        // Insert remaining batch
        if !batch.is_empty() {
            self.insert_batch(&file.station_id, &batch)?;
            count += batch.len() as u64;
        }

        self.files += 1;
        self.expected_rows += line_count;
        info!(
            pipeline = %self.kind,
            station = %file.station_id,
            rows = count,
            "Loaded {} rows from {:?}",
            count,
            file.path.file_name().unwrap_or_default()
        );

        Ok(count)
    }

    /// Verify the table against the lines read and report.
    ///
    /// A mismatch is logged, not treated as an error.
    pub fn finish(mut self) -> Result<LoadReport> {
        // A pipeline with no files still replaces the previous snapshot
        self.truncate_once()?;

        let table_rows = count_rows(self.conn, self.schema.name)?;
        let report = LoadReport {
            kind: self.kind,
            files: self.files,
            expected_rows: self.expected_rows,
            table_rows,
        };

        if report.is_consistent() {
            info!(
                pipeline = %self.kind,
                files = report.files,
                "Total records: {} (expected {})",
                report.table_rows,
                report.expected_rows
            );
        } else {
            warn!(
                pipeline = %self.kind,
                files = report.files,
                "Total records: {} differs from expected {}",
                report.table_rows,
                report.expected_rows
            );
        }

        Ok(report)
    }

    fn truncate_once(&mut self) -> Result<()> {
        if self.truncated {
            return Ok(());
        }

        let removed = self
            .conn
            .execute(&format!("DELETE FROM {}", self.schema.name), [])
            .with_context(|| format!("Failed to truncate {}", self.schema.name))?;
        self.truncated = true;
        debug!(pipeline = %self.kind, removed, "Truncated {}", self.schema.name);

        Ok(())
    }

    /// Insert a batch of rows, binding the station id as the leading column
    fn insert_batch(&self, station_id: &str, batch: &[ParsedRow]) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(&self.insert_sql)?;

        for row in batch {
            stmt.raw_bind_parameter(1, station_id)?;
            for (idx, value) in row.values.iter().enumerate() {
                value.bind_to(idx + 2, &mut stmt)?;
            }
            stmt.raw_execute()
                .with_context(|| format!("Failed to insert {} row for {}", self.kind, station_id))?;
        }

        Ok(())
    }
}
