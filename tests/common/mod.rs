#![allow(dead_code)]

use approx::assert_relative_eq;
use camino::Utf8Path;
use covday::covariance::CovarianceEntries;
use covday::tables::{PropagationRecord, StateRecord, StudyTables, TargetRecord};
use covday::time::{days, parse_timestamp};

/// Fixture tables of `tests/data/`: two targets, four states, four daily propagations per
/// state. Every propagation of a state carries the covariance `diag(4c, c, c/4)` with
/// `c = 1, 2, 10, 20` for states 101, 102, 201, 202.
pub fn fixture_tables() -> StudyTables {
    StudyTables::from_csv_files(
        Utf8Path::new("tests/data/targets.csv"),
        Utf8Path::new("tests/data/states.csv"),
        Utf8Path::new("tests/data/propagations.csv"),
    )
    .unwrap()
}

/// Per-state covariance scale of the fixture.
pub const FIXTURE_SCALES: [(u64, f64); 4] = [(101, 1.0), (201, 10.0), (102, 2.0), (202, 20.0)];

/// In-memory copy of the fixture, with propagations at `state epoch + k days` for every
/// `k` of `offsets`.
pub fn synthetic_tables(offsets: &[f64]) -> StudyTables {
    let states = vec![
        state(101, 1, "2021-01-30T06:00:00"),
        state(201, 2, "2021-01-30T20:00:00"),
        state(102, 1, "2021-01-31T12:00:00"),
        state(202, 2, "2021-02-02T03:00:00"),
    ];

    let propagations = states
        .iter()
        .zip(FIXTURE_SCALES)
        .flat_map(|(s, (_, c))| {
            offsets.iter().map(move |&k| PropagationRecord {
                timestamp: s.epoch + days(k),
                target_state_id: Some(s.id),
                covariance: CovarianceEntries::diagonal(4.0 * c, c, 0.25 * c),
                eigenvalues: None,
            })
        })
        .collect();

    StudyTables::new(
        vec![TargetRecord { id: 1 }, TargetRecord { id: 2 }],
        states,
        propagations,
    )
    .unwrap()
}

pub fn state(id: u64, target_id: u64, ts: &str) -> StateRecord {
    StateRecord {
        id,
        target_id,
        epoch: parse_timestamp(ts).unwrap(),
    }
}

/// Element-wise comparison of two series, `NaN` matching `NaN` only.
pub fn assert_series_eq(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "series lengths differ");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "index {i}: expected NaN, got {a}");
        } else {
            assert_relative_eq!(*a, *e, epsilon = 1e-9);
        }
    }
}
