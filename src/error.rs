use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data_type::{DataType, ScaleType};

/// Error type for dataset reading and writing.
///
/// Variants fall into two classes. Usage errors (see [`DatasetError::is_usage`])
/// signal a misuse of the API and are raised before any I/O happens. Every
/// other variant is a data error describing malformed content, with enough
/// row/column context to locate the problem in the file.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by the CSV emitter.
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    // === Usage errors ===
    /// The file to read does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The file to write already exists.
    #[error("file already exists: {path}")]
    FileExists { path: PathBuf },

    /// The file extension does not map to a supported delimiter format.
    #[error("unsupported file type: {path}")]
    UnsupportedFileType { path: PathBuf },

    /// A required argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Column cursor moved past the current row width.
    #[error("column {column} is out of range for a row of {width} cells")]
    ColumnOutOfRange { column: usize, width: usize },

    /// Column access before the first row was read or written.
    #[error("no current row")]
    NoCurrentRow,

    // === Data errors ===
    /// The source has no header row at all.
    #[error("the data has no header row")]
    MissingHeader,

    /// A row does not match the established row width.
    #[error("row {row} (line {line}) has {actual} cells, expected {expected}")]
    RowSize {
        row: usize,
        line: u64,
        expected: usize,
        actual: usize,
    },

    /// A sentinel row has neither `1 + n` nor `2 + n` cells.
    #[error("{sentinel} row (line {line}) has {actual} cells, expected {columns} values")]
    SentinelWidth {
        sentinel: &'static str,
        line: u64,
        columns: usize,
        actual: usize,
    },

    /// A TYPE code could not be decoded.
    #[error("unknown type abbreviation '{code}' for column '{column}'")]
    UnknownTypeCode { code: String, column: String },

    /// Scale type and data type cannot be combined.
    #[error("column '{column}': a {scale} scale cannot hold {data_type} values")]
    IncompatibleScale {
        column: String,
        scale: ScaleType,
        data_type: DataType,
    },

    /// MIN or MAX given for a column whose scale has no bounds.
    #[error("column '{column}': {sentinel} is only allowed for interval or ratio scales")]
    BoundOnNominal {
        column: String,
        sentinel: &'static str,
    },

    /// A cell could not be converted to any allowed type.
    #[error("cannot convert '{value}' at row {row} (line {line}), column {column} to {expected}")]
    Conversion {
        row: usize,
        line: u64,
        column: usize,
        value: String,
        expected: String,
    },

    /// A column of the identifier row is blank.
    #[error("column {column} of the identifier row is blank")]
    MissingColumnId { column: usize },

    /// Two columns share the same identifier.
    #[error("duplicate column identifier '{0}'")]
    DuplicateColumnId(String),

    /// Two rows share the same identifier.
    ///
    /// `line` is `None` for datasets built in memory.
    #[error("duplicate row identifier '{id}' at row {row}{}", at_line(.line))]
    DuplicateRowId {
        id: String,
        row: usize,
        line: Option<u64>,
    },

    /// A row has no identifier.
    #[error("row {row}{} has no identifier", at_line(.line))]
    MissingRowId { row: usize, line: Option<u64> },

    /// A value does not match the data type of its column.
    #[error("value '{value}' at row {row}, column {column} is not {expected}")]
    ValueType {
        row: usize,
        column: usize,
        value: String,
        expected: DataType,
    },

    /// A row does not carry one value per column.
    #[error("row {row} has {actual} values, expected {expected}")]
    ValueCount {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// No data row followed the header rows.
    #[error("the data has no values")]
    NoValues,

    /// A line could not be decoded to UTF-8.
    #[error("line {line} is not valid UTF-8")]
    InvalidEncoding { line: u64 },

    /// A value cannot be written so that it reads back unchanged.
    #[error("cannot write '{value}' at row {row}: {reason}")]
    UnwritableValue {
        row: usize,
        value: String,
        reason: &'static str,
    },
}

impl DatasetError {
    /// Returns true for errors caused by API misuse rather than file content.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            DatasetError::FileNotFound { .. }
                | DatasetError::FileExists { .. }
                | DatasetError::UnsupportedFileType { .. }
                | DatasetError::InvalidArgument(_)
                | DatasetError::ColumnOutOfRange { .. }
                | DatasetError::NoCurrentRow
        )
    }
}

fn at_line(line: &Option<u64>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
