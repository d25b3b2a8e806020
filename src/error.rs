use thiserror::Error;

/// A station file line that does not match its table's columns
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: expected {expected} tab-separated columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid value {value:?} for column {column}: {reason}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}

impl RecordError {
    /// 1-based line number of the offending record
    pub fn line(&self) -> usize {
        match self {
            RecordError::ColumnCount { line, .. } | RecordError::InvalidValue { line, .. } => *line,
        }
    }
}
