use covday::calendar::StudyEnd;
use covday::covariance::CovarianceEntries;
use covday::day::{Channel, Horizon};
use covday::percentiles::Percentile;
use covday::propagation::PropagationJoin;
use covday::study::{AnalysisMode, Study, StudyParams};
use covday::tables::{PropagationRecord, StudyTables, TargetRecord};
use covday::time::days;
use covday::CovdayError;

mod common;

use crate::common::{assert_series_eq, fixture_tables, state, synthetic_tables};

const NAN: f64 = f64::NAN;

fn epoch_params() -> StudyParams {
    StudyParams::builder()
        .mode(AnalysisMode::EpochExact)
        .build()
        .unwrap()
}

#[test]
fn test_epoch_mode_bins_by_creation_hour() {
    let report = Study::new(epoch_params()).run(&fixture_tables()).unwrap();
    assert_eq!(report.day_count(), 3);

    // 101 at 06:00 and 201 at 20:00 on day 0, 102 at 12:00 on day 1, 202 on the end date
    for horizon in Horizon::ALL {
        let h = report.horizon(horizon).unwrap();
        assert_series_eq(
            h.series(Channel::Eig1, Percentile::P50),
            &[4.0, NAN, 40.0, NAN, 8.0, NAN, NAN, NAN, NAN],
        );
        assert_series_eq(
            h.series(Channel::Eig2, Percentile::P95),
            &[1.0, NAN, 10.0, NAN, 2.0, NAN, NAN, NAN, NAN],
        );
        assert_eq!(h.empty_buckets(), 6);
    }
}

#[test]
fn test_epoch_mode_joins_agree_on_fixture() {
    let by_state = StudyParams::builder()
        .mode(AnalysisMode::EpochExact)
        .join(PropagationJoin::StateReference)
        .build()
        .unwrap();

    let a = Study::new(epoch_params()).run(&fixture_tables()).unwrap();
    let b = Study::new(by_state).run(&fixture_tables()).unwrap();
    for (sa, sb) in a
        .sequences(Horizon::TwoDays)
        .unwrap()
        .iter()
        .zip(&b.sequences(Horizon::TwoDays).unwrap())
    {
        assert_series_eq(sa, sb);
    }
}

#[test]
fn test_epoch_mode_missing_offset_fails() {
    let tables = synthetic_tables(&[1.0, 3.0]);

    let err = Study::new(epoch_params()).run(&tables).unwrap_err();
    assert_eq!(
        err,
        CovdayError::MissingPropagation {
            state_id: 101,
            expected: "2021-02-01T06:00:00".into(),
        }
    );

    // without the 2-day horizon every lookup is satisfied
    let params = StudyParams::builder()
        .mode(AnalysisMode::EpochExact)
        .horizons([Horizon::OneDay, Horizon::ThreeDays])
        .build()
        .unwrap();
    let report = Study::new(params).run(&tables).unwrap();
    assert!(report.horizon(Horizon::TwoDays).is_none());
    assert_eq!(report.horizons()[1].horizon(), Horizon::ThreeDays);
}

#[test]
fn test_epoch_mode_global_join_ignores_state_link() {
    let a = state(1, 1, "2021-03-01T00:00:00");
    let b = state(2, 2, "2021-03-02T00:00:00");
    let prop = |s: &covday::tables::StateRecord, k: f64, c: f64| PropagationRecord {
        timestamp: s.epoch + days(k),
        target_state_id: Some(s.id),
        covariance: CovarianceEntries::diagonal(4.0 * c, c, 0.25 * c),
        eigenvalues: None,
    };
    // a's 2-day propagation shares its timestamp with b's 1-day propagation, and comes first
    let propagations = vec![
        prop(&a, 1.0, 1.0),
        prop(&a, 2.0, 1.0),
        prop(&b, 1.0, 5.0),
    ];
    let tables = StudyTables::new(
        vec![TargetRecord { id: 1 }, TargetRecord { id: 2 }],
        vec![a, b],
        propagations,
    )
    .unwrap()
    .with_eigen_features();

    let run = |join: PropagationJoin| {
        let params = StudyParams::builder()
            .mode(AnalysisMode::EpochExact)
            .join(join)
            .end(StudyEnd::Inclusive)
            .horizons([Horizon::OneDay])
            .build()
            .unwrap();
        Study::new(params).run(&tables).unwrap()
    };

    let global = run(PropagationJoin::GlobalTimestamp);
    let eig1 = global
        .horizon(Horizon::OneDay)
        .unwrap()
        .series(Channel::Eig1, Percentile::P50);
    assert_series_eq(eig1, &[4.0, NAN, NAN, 4.0, NAN, NAN]);

    let linked = run(PropagationJoin::StateReference);
    let eig1 = linked
        .horizon(Horizon::OneDay)
        .unwrap()
        .series(Channel::Eig1, Percentile::P50);
    assert_series_eq(eig1, &[4.0, NAN, NAN, 20.0, NAN, NAN]);
}
