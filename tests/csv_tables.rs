use approx::assert_relative_eq;
use camino::Utf8Path;
use covday::calendar::{build_day_sequence, build_day_sequence_with_end, StudyEnd};
use covday::tables::StudyTables;
use covday::time::fmt_epoch;
use covday::CovdayError;

mod common;

use crate::common::fixture_tables;

#[test]
fn test_load_fixture_tables() {
    let tables = fixture_tables();
    assert_eq!(tables.target_ids(), vec![1, 2]);
    assert_eq!(tables.states().len(), 4);
    assert_eq!(tables.propagations().len(), 16);
    assert!(!tables.has_eigen_features());

    assert_eq!(tables.collect_state_ids(&[1, 2]), vec![101, 102, 201, 202]);
    assert_eq!(tables.propagations_of_state(201).count(), 4);

    // unix and ISO timestamps land on the same scale
    let first = tables.propagations()[0].timestamp;
    assert_eq!(fmt_epoch(first), "2021-01-31T06:00:00");
    assert_eq!(
        fmt_epoch(tables.state(101).unwrap().epoch),
        "2021-01-30T06:00:00"
    );
}

#[test]
fn test_fixture_span_and_days() {
    let tables = fixture_tables();
    let (start, end) = tables.study_span().unwrap();
    assert_eq!(start.to_string(), "2021-01-30");
    assert_eq!(end.to_string(), "2021-02-02");

    let days = build_day_sequence(tables.states()).unwrap();
    let labels: Vec<String> = days.iter().map(|d| d.date_string()).collect();
    assert_eq!(labels, vec!["2021-01-30", "2021-01-31", "2021-02-01"]);
    assert_eq!(days[2].date_list(), [2021, 2, 1]);

    let days = build_day_sequence_with_end(tables.states(), StudyEnd::Inclusive).unwrap();
    assert_eq!(days.len(), 4);
}

#[test]
fn test_fixture_eigen_features() {
    let tables = fixture_tables().with_eigen_features();
    assert!(tables.has_eigen_features());
    for p in tables.propagations() {
        let eig = p.eigenvalues.unwrap();
        assert_relative_eq!(eig[0], p.covariance.xx, epsilon = 1e-9);
        assert_relative_eq!(eig[1], p.covariance.yy, epsilon = 1e-9);
        assert_relative_eq!(eig[2], p.covariance.zz, epsilon = 1e-9);
    }
}

#[test]
fn test_missing_file() {
    let err = StudyTables::from_csv_files(
        Utf8Path::new("tests/data/targets.csv"),
        Utf8Path::new("tests/data/no_such_states.csv"),
        Utf8Path::new("tests/data/propagations.csv"),
    )
    .unwrap_err();
    assert!(matches!(err, CovdayError::IoError(_)));
}
