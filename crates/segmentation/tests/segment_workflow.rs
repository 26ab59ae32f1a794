use data_contracts::SnippetRecord;
use segmentation::{
    segment_directory, segment_recording, write_length_histogram, Recording, SegmentOptions,
    SegmentationSummary, LENGTH_HISTOGRAM_FILE,
};
use std::fs;
use std::path::Path;

/// Write a recording with `frames` rows spaced 100 ms apart.
fn write_recording(dir: &Path, name: &str, frames: usize) {
    let mut body = String::from("timestamp, mouse_x, mouse_y, flower_x, flower_y\n");
    for i in 0..frames {
        let secs = i as f32 * 0.1;
        body.push_str(&format!(
            "2024-05-01 12:00:{:09.6}, {}, {}, {}, {}\n",
            secs,
            i,
            i * 2,
            i as f32 + 0.5,
            100 - i
        ));
    }
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn partial_trailing_chunk_is_dropped_but_numbered() {
    let raw = "timestamp,mouse_x,flower_x\n\
2024-05-01 12:00:00,0,0\n\
2024-05-01 12:00:01,1,1\n\
2024-05-01 12:00:02,2,2\n\
2024-05-01 12:00:03,3,3\n\
2024-05-01 12:00:04,4,4\n";
    let rec = Recording::parse(raw.as_bytes(), Path::new("rec.spin_a.txt")).unwrap();
    let snippets = segment_recording(&rec, "spin", 2).unwrap();
    assert_eq!(snippets.len(), 2);
    assert_eq!(snippets[0].record.snippet_number, 1);
    assert_eq!(snippets[1].record.snippet_number, 2);
    assert_eq!(snippets[1].rows, vec![vec![2.0, 2.0, 2.0], vec![3.0, 3.0, 3.0]]);
    assert_eq!(snippets[0].columns, vec!["mouse_x", "flower_x", "time_s"]);
}

#[test]
fn zero_sample_length_rejected() {
    let raw = "timestamp,mouse_x\n2024-05-01 12:00:00,0\n";
    let rec = Recording::parse(raw.as_bytes(), Path::new("x.txt")).unwrap();
    assert!(segment_recording(&rec, "x", 0).is_err());
}

#[test]
fn directory_segmentation_writes_snippets_and_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let dataset_dir = tmp.path().join("dataset");
    fs::create_dir_all(&raw_dir).unwrap();
    write_recording(&raw_dir, "session.bounce_01.txt", 7);
    write_recording(&raw_dir, "session.spin_02.txt", 3);
    fs::write(raw_dir.join("notes.md"), "ignored").unwrap();

    let summary = segment_directory(&SegmentOptions {
        raw_dir: raw_dir.clone(),
        dataset_dir: dataset_dir.clone(),
        sample_length: 3,
    })
    .unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.recording_lengths, vec![7, 3]);
    assert_eq!(
        summary.records,
        vec![
            SnippetRecord::new("bounce", "2024-05-01 12:00:00", 1),
            SnippetRecord::new("bounce", "2024-05-01 12:00:00", 2),
            SnippetRecord::new("spin", "2024-05-01 12:00:00", 1),
        ]
    );

    let manifest = fs::read_to_string(dataset_dir.join("dataset_info.csv")).unwrap();
    let mut lines = manifest.lines();
    assert_eq!(
        lines.next(),
        Some("sample_index,effect_name,start_timestamp,snippet_number")
    );
    assert_eq!(lines.next(), Some("0,bounce,2024-05-01 12:00:00,1"));
    assert_eq!(manifest.lines().count(), 4);

    let snippet =
        fs::read_to_string(dataset_dir.join("samples/bounce_2024-05-01 12:00:00_2.csv")).unwrap();
    let rows: Vec<&str> = snippet.lines().collect();
    assert_eq!(rows[0], "mouse_x,mouse_y,flower_x,flower_y,time_s");
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("3,6,3.5,97,"));
}

#[test]
fn length_histogram_is_written_next_to_figures() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    fs::create_dir_all(&raw_dir).unwrap();
    write_recording(&raw_dir, "a.wave_01.txt", 9);
    write_recording(&raw_dir, "b.wave_02.txt", 4);
    let summary = segment_directory(&SegmentOptions {
        raw_dir,
        dataset_dir: tmp.path().join("dataset"),
        sample_length: 3,
    })
    .unwrap();

    let figures = tmp.path().join("figures");
    let out = write_length_histogram(&summary, &figures).unwrap();
    assert_eq!(out, figures.join(LENGTH_HISTOGRAM_FILE));
    assert!(out.is_file());
    assert!(fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn histogram_failure_leaves_dataset_intact() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let dataset_dir = tmp.path().join("dataset");
    fs::create_dir_all(&raw_dir).unwrap();
    write_recording(&raw_dir, "a.wave_01.txt", 6);
    let summary = segment_directory(&SegmentOptions {
        raw_dir,
        dataset_dir: dataset_dir.clone(),
        sample_length: 3,
    })
    .unwrap();

    // A regular file where the figures directory should go.
    let blocked = tmp.path().join("figures");
    fs::write(&blocked, "not a directory").unwrap();
    assert!(write_length_histogram(&summary, &blocked).is_none());
    assert!(dataset_dir.join("dataset_info.csv").is_file());

    assert!(write_length_histogram(&SegmentationSummary::default(), tmp.path()).is_none());
}
