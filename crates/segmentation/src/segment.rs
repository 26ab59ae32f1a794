use data_contracts::{SnippetRecord, MANIFEST_FILE, SAMPLES_SUBDIR, TIME_COLUMN};
use std::fs;
use std::path::{Path, PathBuf};

use crate::recording::{format_timestamp, Recording};
use crate::types::{SegmentationError, SegmentationResult};

const RAW_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Directory scanned for `*.txt` recordings.
    pub raw_dir: PathBuf,
    /// Output root; snippets land in `samples/`, the manifest at the root.
    pub dataset_dir: PathBuf,
    pub sample_length: usize,
}

/// One complete, fixed-length slice of a recording.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub record: SnippetRecord,
    /// Recording columns followed by `time_s`.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentationSummary {
    pub files: usize,
    pub records: Vec<SnippetRecord>,
    /// Frame count of every recording processed, in processing order.
    pub recording_lengths: Vec<usize>,
}

impl SegmentationSummary {
    pub fn snippets(&self) -> usize {
        self.records.len()
    }
}

/// `"rec.bounce_01.txt"` and `"bounce_01.txt"` both yield `"bounce"`.
pub fn effect_name_from_file(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let tail = match stem.split_once('.') {
        Some((_, rest)) => rest,
        None => stem,
    };
    tail.split('_').next().unwrap_or(tail).to_string()
}

/// Cut `recording` into chunks of `sample_length` rows, numbered from 1.
///
/// A trailing partial chunk is dropped but still consumes a number.
pub fn segment_recording(
    recording: &Recording,
    effect_name: &str,
    sample_length: usize,
) -> SegmentationResult<Vec<Snippet>> {
    if sample_length == 0 {
        return Err(SegmentationError::ZeroSampleLength);
    }
    let start_timestamp = format_timestamp(&recording.start);
    let mut columns = recording.columns.clone();
    columns.push(TIME_COLUMN.to_string());

    let mut snippets = Vec::new();
    let row_chunks = recording.rows.chunks(sample_length);
    let time_chunks = recording.time_s.chunks(sample_length);
    for (idx, (rows, times)) in row_chunks.zip(time_chunks).enumerate() {
        if rows.len() < sample_length {
            continue;
        }
        let record = SnippetRecord::new(effect_name, start_timestamp.clone(), idx as u32 + 1);
        record.validate()?;
        let rows = rows
            .iter()
            .zip(times)
            .map(|(values, t)| {
                let mut row = values.clone();
                row.push(*t as f32);
                row
            })
            .collect();
        snippets.push(Snippet {
            record,
            columns: columns.clone(),
            rows,
        });
    }
    Ok(snippets)
}

pub fn write_snippet(samples_dir: &Path, snippet: &Snippet) -> SegmentationResult<PathBuf> {
    let path = samples_dir.join(snippet.record.file_name());
    let csv_err = |source: csv::Error| SegmentationError::Csv {
        path: path.clone(),
        source,
    };
    let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
    writer.write_record(&snippet.columns).map_err(csv_err)?;
    for row in &snippet.rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SegmentationError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Manifest columns: `sample_index,effect_name,start_timestamp,snippet_number`.
pub fn write_manifest(path: &Path, records: &[SnippetRecord]) -> SegmentationResult<()> {
    let csv_err = |source: csv::Error| SegmentationError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([
            "sample_index",
            "effect_name",
            "start_timestamp",
            "snippet_number",
        ])
        .map_err(csv_err)?;
    for (idx, rec) in records.iter().enumerate() {
        writer
            .write_record([
                idx.to_string(),
                rec.effect_name.clone(),
                rec.start_timestamp.clone(),
                rec.snippet_number.to_string(),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SegmentationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn list_recordings(raw_dir: &Path) -> SegmentationResult<Vec<PathBuf>> {
    let io_err = |source| SegmentationError::Io {
        path: raw_dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(raw_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some(RAW_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Segment every recording under `opts.raw_dir` and write snippets plus the manifest.
pub fn segment_directory(opts: &SegmentOptions) -> SegmentationResult<SegmentationSummary> {
    if opts.sample_length == 0 {
        return Err(SegmentationError::ZeroSampleLength);
    }
    let samples_dir = opts.dataset_dir.join(SAMPLES_SUBDIR);
    fs::create_dir_all(&samples_dir).map_err(|source| SegmentationError::Io {
        path: samples_dir.clone(),
        source,
    })?;

    let mut summary = SegmentationSummary::default();
    for path in list_recordings(&opts.raw_dir)? {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let effect_name = effect_name_from_file(file_name);
        let recording = Recording::from_path(&path)?;
        let snippets = segment_recording(&recording, &effect_name, opts.sample_length)?;
        tracing::debug!(
            file = %path.display(),
            frames = recording.len(),
            snippets = snippets.len(),
            "segmented recording"
        );
        for snippet in &snippets {
            write_snippet(&samples_dir, snippet)?;
        }
        summary.files += 1;
        summary.recording_lengths.push(recording.len());
        summary
            .records
            .extend(snippets.into_iter().map(|s| s.record));
    }

    write_manifest(&opts.dataset_dir.join(MANIFEST_FILE), &summary.records)?;
    Ok(summary)
}

pub const LENGTH_HISTOGRAM_FILE: &str = "sample_lengths.png";

/// Render the recording-length histogram into `figures_dir`.
///
/// Snippets and manifest are already on disk by now, so failures only warn.
pub fn write_length_histogram(
    summary: &SegmentationSummary,
    figures_dir: &Path,
) -> Option<PathBuf> {
    if summary.recording_lengths.is_empty() {
        tracing::warn!("no recordings were segmented; skipping histogram");
        return None;
    }
    if let Err(err) = fs::create_dir_all(figures_dir) {
        tracing::warn!(
            "skipping histogram: cannot create {}: {err}",
            figures_dir.display()
        );
        return None;
    }
    let out = figures_dir.join(LENGTH_HISTOGRAM_FILE);
    match plots::render_length_histogram(&summary.recording_lengths, &out) {
        Ok(()) => Some(out),
        Err(err) => {
            tracing::warn!("skipping histogram: {err}");
            None
        }
    }
}
