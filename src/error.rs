//! Error types for ACH record encoding, parsing and file assembly.

use thiserror::Error;

/// Result type alias for ACH operations
pub type Result<T> = std::result::Result<T, AchError>;

/// A failure resolving a single field value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Required field received no value and its definition has no default
    #[error("field {field} requires a value and there is no default in its definition")]
    EmptyRequired { field: &'static str },

    /// Value (after any correction) failed its field type's validation
    #[error("passed-in value \"{value}\" mismatches {expected}")]
    ValueMismatch { value: String, expected: String },
}

/// Errors that can occur while building, parsing or rendering ACH files.
#[derive(Error, Debug)]
pub enum AchError {
    /// Field widths of a schema do not add up to its record width
    #[error("field definitions for {schema} would result in an invalid record size of {actual} (valid record size is {expected})")]
    SchemaSize {
        schema: &'static str,
        actual: usize,
        expected: usize,
    },

    /// Caller supplied names that the schema does not define
    #[error("{schema} record received unknown fields: {}", .names.join(", "))]
    UnknownFields {
        schema: &'static str,
        names: Vec<String>,
    },

    /// A single field failed to resolve
    #[error("field {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: FieldError,
    },

    /// Every field failure encountered while building one record
    #[error("encountered {} errors generating fields for {schema}; failed fields: {}", .failures.len(), describe_failures(.failures))]
    AggregateField {
        schema: &'static str,
        failures: Vec<(&'static str, FieldError)>,
    },

    /// A record of one type was handed to a slot expecting another
    #[error("expected a {expected} record (type code {expected_code}), found type code {found}")]
    WrongRecordType {
        expected: &'static str,
        expected_code: char,
        found: char,
    },

    /// A transaction was added before any batch exists
    #[error("must add a batch before adding transaction entries")]
    NoBatchForTransaction,

    /// Batch index out of range
    #[error("batch index {index} out of range for {len} batches")]
    BatchIndex { index: usize, len: usize },

    /// Leading character of a line is not a known record type code
    #[error("unknown record type code '{code}'")]
    UnknownRecordType { code: char },

    /// Physical line width differs from its record width
    #[error("line has {actual} characters, expected {expected}")]
    LineWidth { expected: usize, actual: usize },

    /// Record appears where the file structure does not allow it
    #[error("unexpected {found} record {context}")]
    UnexpectedRecord {
        found: &'static str,
        context: &'static str,
    },

    /// Input contained no records
    #[error("ACH file contains no records")]
    EmptyFile,

    /// Input ended without a file control record
    #[error("ACH file has no file control record")]
    MissingFileControl,

    /// A computed control value does not fit its field
    #[error("computed {field} value {value} does not fit in {width} digits")]
    ControlOverflow {
        field: &'static str,
        value: u64,
        width: usize,
    },

    /// A numeric field could not be read as an integer
    #[error("field {field} holds non-numeric value \"{value}\"")]
    InvalidNumber { field: String, value: String },

    /// A dollar amount could not be converted to cents
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),

    /// Parse failure annotated with its physical line number
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<AchError>,
    },

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing command-line argument
    #[error("Missing argument. Usage: nacha-ach <check|json|entries> <file.ach>")]
    MissingArgument,

    /// Unrecognized command-line subcommand
    #[error("Unknown command \"{0}\". Usage: nacha-ach <check|json|entries> <file.ach>")]
    UnknownCommand(String),
}

impl AchError {
    /// Wraps this error with the physical line it came from.
    pub fn at_line(self, line: usize) -> Self {
        AchError::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// Field names carried by an aggregate failure; empty for other variants.
    pub fn failed_fields(&self) -> Vec<&'static str> {
        match self {
            AchError::AggregateField { failures, .. } => {
                failures.iter().map(|(name, _)| *name).collect()
            }
            AchError::Field { field, .. } => vec![*field],
            AchError::AtLine { source, .. } => source.failed_fields(),
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failures: &[(&'static str, FieldError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{} ({})", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}
