//! Loading the manifest and individual snippet files.

use data_contracts::{SnippetColumns, SnippetRecord};
use std::path::Path;

use crate::types::{DatasetError, DatasetResult, TrajectorySample};

/// Read and validate every manifest row.
pub fn load_manifest(path: &Path) -> DatasetResult<Vec<SnippetRecord>> {
    let csv_err = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<SnippetRecord>() {
        let record = row.map_err(csv_err)?;
        record.validate().map_err(|source| DatasetError::Contract {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load one snippet without normalization.
pub fn load_sample(path: &Path) -> DatasetResult<TrajectorySample> {
    let csv_err = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let cols = SnippetColumns::classify(&header_names).map_err(|source| DatasetError::Contract {
        path: path.to_path_buf(),
        source,
    })?;

    let mut times = Vec::new();
    let mut human_input = Vec::new();
    let mut animation = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        if record.len() != headers.len() {
            return Err(DatasetError::RowWidth {
                path: path.to_path_buf(),
                row,
                expected: headers.len(),
                found: record.len(),
            });
        }
        let cell = |column: usize| -> DatasetResult<f32> {
            let raw = record.get(column).unwrap_or_default();
            raw.parse::<f32>().map_err(|_| DatasetError::Value {
                path: path.to_path_buf(),
                row,
                column,
                value: raw.to_string(),
            })
        };
        times.push(cell(cols.time)?);
        for &c in &cols.human_input {
            human_input.push(cell(c)?);
        }
        for &c in &cols.animation {
            animation.push(cell(c)?);
        }
    }
    if times.is_empty() {
        return Err(DatasetError::EmptySample {
            path: path.to_path_buf(),
        });
    }

    Ok(TrajectorySample {
        times,
        human_input,
        human_channels: cols.human_channels(),
        animation,
        animation_channels: cols.animation_channels(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_channel_groups_in_header_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s.csv");
        fs::write(
            &path,
            "mouse_x,mouse_y,flower_x,flower_y,time_s\n1,2,3,4,0\n5,6,7,8,0.1\n",
        )
        .unwrap();
        let sample = load_sample(&path).unwrap();
        assert_eq!(sample.frames(), 2);
        assert_eq!(sample.times, vec![0.0, 0.1]);
        assert_eq!(sample.human_input, vec![1.0, 2.0, 5.0, 6.0]);
        assert_eq!(sample.animation, vec![3.0, 4.0, 7.0, 8.0]);
        assert_eq!(sample.animation_points(), vec![(3.0, 4.0), (7.0, 8.0)]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s.csv");
        fs::write(&path, "mouse_x,flower_x,time_s\n1,2,0\n1,2\n").unwrap();
        let err = load_sample(&path).unwrap_err();
        assert!(matches!(err, DatasetError::RowWidth { row: 1, .. }));
    }

    #[test]
    fn header_only_sample_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s.csv");
        fs::write(&path, "mouse_x,flower_x,time_s\n").unwrap();
        assert!(matches!(
            load_sample(&path).unwrap_err(),
            DatasetError::EmptySample { .. }
        ));
    }
}
