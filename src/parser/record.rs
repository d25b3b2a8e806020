use chrono::NaiveDate;

use crate::error::RecordError;
use crate::schema::{Column, ColumnType, TableSchema};

/// Field separator used by station files
pub const DELIMITER: char = '\t';

/// Date layouts accepted for observation dates
const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d"];

/// A parsed row ready for insertion, in `TableSchema::file_columns` order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub values: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

/// Parse one tab-separated line of a station file for the given table.
///
/// `line_no` is 1-based and only used for error reporting.
pub fn parse_record(
    line: &str,
    line_no: usize,
    schema: &TableSchema,
) -> Result<ParsedRow, RecordError> {
    let columns = schema.file_columns();
    let fields: Vec<&str> = line
        .trim_end_matches(['\r', '\n'])
        .split(DELIMITER)
        .map(str::trim)
        .collect();

    if fields.len() != columns.len() {
        return Err(RecordError::ColumnCount {
            line: line_no,
            expected: columns.len(),
            found: fields.len(),
        });
    }

    let values = columns
        .iter()
        .zip(fields)
        .map(|(col, raw)| parse_value(raw, col, line_no))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedRow { values })
}

fn parse_value(raw: &str, col: &Column, line_no: usize) -> Result<SqlValue, RecordError> {
    let invalid = |reason: String| RecordError::InvalidValue {
        line: line_no,
        column: col.name,
        value: raw.to_string(),
        reason,
    };

    match col.col_type {
        ColumnType::SmallInt => raw
            .parse::<i16>()
            .map(|v| SqlValue::Integer(v.into()))
            .map_err(|e| invalid(e.to_string())),
        ColumnType::Integer => raw
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|e| invalid(e.to_string())),
        ColumnType::Date => parse_date(raw)
            .map(|d| SqlValue::Text(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| invalid("expected YYYYMMDD or YYYY-MM-DD".to_string())),
        // Derived columns only; station files never carry them
        ColumnType::Text | ColumnType::Real => Err(invalid(format!(
            "{} is not a station file column",
            col.col_type.sql_type()
        ))),
    }
}

/// Parse an observation date in any of the accepted layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{WEATHER_RECORDS, YIELD_RECORDS};

    #[test]
    fn test_parse_weather_line() {
        let row = parse_record("19850101\t-22\t-128\t94", 1, &WEATHER_RECORDS).unwrap();
        assert_eq!(
            row.values,
            vec![
                SqlValue::Text("1985-01-01".to_string()),
                SqlValue::Integer(-22),
                SqlValue::Integer(-128),
                SqlValue::Integer(94),
            ]
        );
    }

    #[test]
    fn test_parse_sentinel_and_crlf() {
        let row = parse_record("1985-01-02\t-9999\t-9999\t-9999\r\n", 2, &WEATHER_RECORDS).unwrap();
        assert_eq!(row.values[1], SqlValue::Integer(-9999));
        assert_eq!(row.values[3], SqlValue::Integer(-9999));
    }

    #[test]
    fn test_parse_yield_line() {
        let row = parse_record("1985\t225447", 1, &YIELD_RECORDS).unwrap();
        assert_eq!(row.values, vec![SqlValue::Integer(1985), SqlValue::Integer(225447)]);
    }

    #[test]
    fn test_wrong_column_count() {
        let err = parse_record("19850101\t-22\t-128", 7, &WEATHER_RECORDS).unwrap_err();
        assert_eq!(
            err,
            RecordError::ColumnCount {
                line: 7,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_record("19851301\t1\t2\t3", 3, &WEATHER_RECORDS).unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { column: "obs_date", .. }));

        let err = parse_record("19850101\tabc\t2\t3", 4, &WEATHER_RECORDS).unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { column: "tmax_c_tenths", .. }));
        assert_eq!(err.line(), 4);

        // Out of SMALLINT range
        let err = parse_record("19850101\t40000\t2\t3", 5, &WEATHER_RECORDS).unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { .. }));
    }
}
