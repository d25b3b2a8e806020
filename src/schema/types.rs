/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Free text (station identifiers, names)
    Text,
    /// 16-bit fixed-point metric stored in tenths of a unit
    SmallInt,
    Integer,
    Real,
    /// Calendar date stored as ISO `YYYY-MM-DD` text
    Date,
}

impl ColumnType {
    /// SQL type name used in generated DDL
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Date => "DATE",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
    /// Delete child rows together with the referenced parent
    pub cascade: bool,
}

impl ForeignKey {
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: column,
            cascade: false,
        }
    }

    pub const fn on_delete_cascade(self) -> Self {
        Self {
            cascade: true,
            ..self
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Primary key columns, in key order
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    /// Names of every column, in declaration order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Columns supplied by a station file.
    ///
    /// Observation tables declare `station_id` first; it is implied by the
    /// file name and never present in the file itself.
    pub fn file_columns(&self) -> &'static [Column] {
        match self.columns.split_first() {
            Some((first, rest)) if first.name == "station_id" => rest,
            _ => self.columns,
        }
    }
}
