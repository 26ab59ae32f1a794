//! End-to-end checks: manifest + snippet files on disk -> normalized samples -> batches.

use animation_dataset::{
    random_split, AnimationDataset, BatchConfig, BatchIter, DatasetError, NormalizationStats,
};
use approx::assert_relative_eq;
use burn::data::dataset::Dataset;
use std::fs;
use std::path::{Path, PathBuf};

type B = burn_ndarray::NdArray<f32>;

/// Writes `count` snippets of `frames` rows; snippet `k` is offset by `k` in every channel.
fn synthetic_dataset(root: &Path, count: usize, frames: usize) -> anyhow::Result<(PathBuf, PathBuf)> {
    let samples = root.join("samples");
    fs::create_dir_all(&samples)?;
    let mut manifest = String::from("sample_index,effect_name,start_timestamp,snippet_number\n");
    for k in 0..count {
        manifest.push_str(&format!("{k},wave,2024-05-01 12:00:00,{}\n", k + 1));
        let mut body = String::from("mouse_x,mouse_y,flower_x,flower_y,time_s\n");
        for f in 0..frames {
            let base = (k + f) as f32;
            body.push_str(&format!(
                "{},{},{},{},{}\n",
                base,
                base * 2.0,
                base + 10.0,
                -base,
                f as f32 * 0.1
            ));
        }
        fs::write(samples.join(format!("wave_2024-05-01 12:00:00_{}.csv", k + 1)), body)?;
    }
    let manifest_path = root.join("dataset_info.csv");
    fs::write(&manifest_path, manifest)?;
    Ok((manifest_path, samples))
}

#[test]
fn open_computes_global_extrema() {
    let tmp = tempfile::tempdir().unwrap();
    let (manifest, samples) = synthetic_dataset(tmp.path(), 3, 4).unwrap();
    let ds = AnimationDataset::open(&manifest, &samples).unwrap();
    assert_eq!(ds.len(), 3);
    // base spans 0..=5 across all snippets.
    assert_eq!(ds.stats().human_min, vec![0.0, 0.0]);
    assert_eq!(ds.stats().human_max, vec![5.0, 10.0]);
    assert_eq!(ds.stats().animation_min, vec![10.0, -5.0]);
    assert_eq!(ds.stats().animation_max, vec![15.0, 0.0]);
}

#[test]
fn get_normalizes_channels_but_not_time() {
    let tmp = tempfile::tempdir().unwrap();
    let (manifest, samples) = synthetic_dataset(tmp.path(), 3, 4).unwrap();
    let ds = AnimationDataset::open(&manifest, &samples).unwrap();
    let item = ds.get(2).expect("sample 2");
    assert_eq!(item.frames(), 4);
    assert_relative_eq!(item.times[3], 0.3, epsilon = 1e-6);
    // snippet 2, frame 0: base = 2 -> 2/5 in every channel (animation y is mirrored).
    assert_relative_eq!(item.human_input[0], 0.4, epsilon = 1e-6);
    assert_relative_eq!(item.human_input[1], 0.4, epsilon = 1e-6);
    assert_relative_eq!(item.animation[0], 0.4, epsilon = 1e-6);
    assert_relative_eq!(item.animation[1], 0.6, epsilon = 1e-6);
    assert!(item
        .human_input
        .iter()
        .chain(&item.animation)
        .all(|v| (0.0..=1.0).contains(v)));
    assert!(ds.get(3).is_none());
}

#[test]
fn missing_snippet_fails_open() {
    let tmp = tempfile::tempdir().unwrap();
    let (manifest, samples) = synthetic_dataset(tmp.path(), 2, 3).unwrap();
    fs::remove_file(samples.join("wave_2024-05-01 12:00:00_2.csv")).unwrap();
    let err = AnimationDataset::open(&manifest, &samples).unwrap_err();
    assert!(matches!(err, DatasetError::Csv { .. }));
}

#[test]
fn empty_manifest_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let manifest = tmp.path().join("dataset_info.csv");
    fs::write(&manifest, "sample_index,effect_name,start_timestamp,snippet_number\n").unwrap();
    let err = AnimationDataset::open(&manifest, tmp.path()).unwrap_err();
    assert!(matches!(err, DatasetError::EmptyDataset));
}

#[test]
fn stats_round_trip_through_json() {
    let tmp = tempfile::tempdir().unwrap();
    let (manifest, samples) = synthetic_dataset(tmp.path(), 2, 3).unwrap();
    let ds = AnimationDataset::open(&manifest, &samples).unwrap();
    let path = tmp.path().join("stats.json");
    ds.stats().save_json(&path).unwrap();
    let loaded = NormalizationStats::load_json(&path).unwrap();
    assert_eq!(&loaded, ds.stats());
    let reopened = AnimationDataset::with_stats(&manifest, &samples, loaded).unwrap();
    assert_eq!(reopened.try_get(1).unwrap(), ds.try_get(1).unwrap());
}

#[test]
fn split_batches_cover_every_sample() {
    let tmp = tempfile::tempdir().unwrap();
    let (manifest, samples) = synthetic_dataset(tmp.path(), 9, 5).unwrap();
    let ds = AnimationDataset::open(&manifest, &samples).unwrap();
    let (train, test) = random_split(ds.len(), 0.8, Some(5));
    assert_eq!((train.len(), test.len()), (7, 2));

    let cfg = BatchConfig {
        batch_size: 4,
        shuffle: true,
        seed: Some(5),
    };
    let device = Default::default();
    let mut iter = BatchIter::for_epoch(&train, &cfg, 1);
    let mut sizes = Vec::new();
    while let Some(batch) = iter.next_batch::<B>(&ds, &device).unwrap() {
        assert_eq!(batch.animation.dims()[1..], [5, 2]);
        assert_eq!(batch.times.dims()[1], 5);
        sizes.push(batch.len());
    }
    assert_eq!(sizes, vec![4, 3]);
}
