//! Raw-recording segmentation.
//!
//! Long recordings (`*.txt` CSV files with a `timestamp` column) are cut into
//! fixed-length snippets under `<dataset_dir>/samples/`, and every snippet is
//! listed in `<dataset_dir>/dataset_info.csv`.

pub mod recording;
pub mod segment;
pub mod types;

pub use recording::{format_timestamp, parse_timestamp, Recording};
pub use segment::{
    effect_name_from_file, segment_directory, segment_recording, write_length_histogram,
    write_manifest, write_snippet, SegmentOptions, SegmentationSummary, Snippet,
    LENGTH_HISTOGRAM_FILE,
};
pub use types::{SegmentationError, SegmentationResult};
