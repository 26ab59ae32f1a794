//! Shared data contracts for raw recordings, trajectory snippets, and the dataset manifest.

pub mod manifest;
pub mod snippet;

pub use manifest::{SnippetRecord, MANIFEST_FILE, SAMPLES_SUBDIR};
pub use snippet::{
    ContractError, SnippetColumns, ANIMATION_PREFIX, DEFAULT_SAMPLE_LENGTH, HUMAN_INPUT_PREFIX,
    TIMESTAMP_COLUMN, TIME_COLUMN,
};
