use thiserror::Error;

/// Why a single report file was left out of the consolidated ledger.
///
/// None of these stop the batch: the pipeline records the file as skipped and
/// moves on to the next one.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file name '{0}' needs a specifier followed by a period token")]
    UnparseableFilename(String),
    #[error("period token '{0}' is not a valid M-YYYY month")]
    InvalidPeriod(String),
    #[error("no revenue column mapping for specifier '{0}'")]
    UnrecognizedSpecifier(String),
    #[error("column '{0}' not found after trying header offsets 0 and 1")]
    SchemaMismatch(&'static str),
    #[error("revenue column '{0}' is missing")]
    MissingRevenueColumn(&'static str),
    #[error("non-numeric value '{value}' in column '{column}' on data row {row}")]
    MalformedValue {
        column: &'static str,
        value: String,
        row: usize,
    },
    #[error("sum of column '{column}' overflows at data row {row}")]
    Overflow {
        column: &'static str,
        row: usize,
    },
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}
