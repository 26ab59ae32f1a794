use data_contracts::{ContractError, SnippetColumns, SnippetRecord};

#[test]
fn classify_splits_channel_groups_in_header_order() {
    let headers = ["mouse_x", " flower_x", "mouse_y", "flower_y", "time_s"];
    let cols = SnippetColumns::classify(&headers).unwrap();
    assert_eq!(cols.time, 4);
    assert_eq!(cols.human_input, vec![0, 2]);
    assert_eq!(cols.animation, vec![1, 3]);
    assert_eq!(cols.human_channels(), 2);
    assert_eq!(cols.animation_channels(), 2);
}

#[test]
fn classify_ignores_unrelated_columns() {
    let headers = ["time_s", "mouse_x", "pressure", "flower_x"];
    let cols = SnippetColumns::classify(&headers).unwrap();
    assert_eq!(cols.human_input, vec![1]);
    assert_eq!(cols.animation, vec![3]);
}

#[test]
fn classify_requires_time_column() {
    let err = SnippetColumns::classify(&["mouse_x", "flower_x"]).unwrap_err();
    assert_eq!(err, ContractError::MissingColumn("time_s"));
}

#[test]
fn classify_requires_both_groups() {
    let err = SnippetColumns::classify(&["time_s", "mouse_x"]).unwrap_err();
    assert_eq!(err, ContractError::EmptyChannelGroup("flower"));
}

#[test]
fn record_with_separator_in_effect_name_rejected() {
    let rec = SnippetRecord::new("big_bounce", "2024-05-01 12:00:00", 1);
    assert!(matches!(
        rec.validate(),
        Err(ContractError::Separator {
            field: "effect_name",
            ..
        })
    ));
}

#[test]
fn manifest_row_ignores_index_column() {
    let raw = "sample_index,effect_name,start_timestamp,snippet_number\n0,bounce,2024-05-01 12:00:00,2\n";
    let mut reader = csv::Reader::from_reader(raw.as_bytes());
    let rows: Vec<SnippetRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows, vec![SnippetRecord::new("bounce", "2024-05-01 12:00:00", 2)]);
    assert!(rows[0].validate().is_ok());
}
