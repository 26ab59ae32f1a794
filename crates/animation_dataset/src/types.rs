//! Core types and error definitions for animation_dataset.

use data_contracts::ContractError;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
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
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema error at {path}: {source}")]
    Contract {
        path: PathBuf,
        #[source]
        source: ContractError,
    },
    #[error("{path} row {row}, column {column}: not a number {value:?}")]
    Value {
        path: PathBuf,
        row: usize,
        column: usize,
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
    EmptySample { path: PathBuf },
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("channel count mismatch for {group}: expected {expected}, found {found}")]
    ChannelMismatch {
        group: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("samples in a batch differ in shape: {0}")]
    ShapeMismatch(String),
}

/// One snippet: shared timeline plus row-major channel buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub times: Vec<f32>,
    /// Row-major `[frames, human_channels]`.
    pub human_input: Vec<f32>,
    pub human_channels: usize,
    /// Row-major `[frames, animation_channels]`.
    pub animation: Vec<f32>,
    pub animation_channels: usize,
}

impl TrajectorySample {
    pub fn frames(&self) -> usize {
        self.times.len()
    }

    pub fn human_points(&self) -> Vec<(f32, f32)> {
        xy_points(&self.human_input, self.human_channels)
    }

    pub fn animation_points(&self) -> Vec<(f32, f32)> {
        xy_points(&self.animation, self.animation_channels)
    }
}

/// First two channels of a row-major buffer as (x, y); single-channel data maps to (x, 0).
pub fn xy_points(values: &[f32], channels: usize) -> Vec<(f32, f32)> {
    if channels == 0 {
        return Vec::new();
    }
    values
        .chunks(channels)
        .map(|row| (row[0], row.get(1).copied().unwrap_or(0.0)))
        .collect()
}
