use data_contracts::ContractError;
use std::path::PathBuf;
use thiserror::Error;

pub type SegmentationResult<T> = Result<T, SegmentationError>;

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no `timestamp` column")]
    MissingTimestampColumn { path: PathBuf },
    #[error("{path} row {row}: unparseable timestamp {value:?}")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error("{path} row {row}, column {column:?}: not a number {value:?}")]
    Value {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("{path} row {row}: expected {expected} fields, found {found}")]
    RowWidth {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path} contains no data rows")]
    Empty { path: PathBuf },
    #[error("sample length must be at least 1")]
    ZeroSampleLength,
    #[error("invalid manifest record: {0}")]
    Contract(#[from] ContractError),
}
