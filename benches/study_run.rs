use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use covday::covariance::CovarianceEntries;
use covday::day::Horizon;
use covday::study::{AnalysisMode, Study, StudyParams};
use covday::tables::{PropagationRecord, StateRecord, StudyTables, TargetRecord};
use covday::time::{days, parse_timestamp};

/// Synthetic study: `n_targets` targets with one state every 6 hours over `n_days` days,
/// each state propagated every 6 hours up to 4 days ahead.
fn synthetic_tables(n_targets: u64, n_days: u64) -> StudyTables {
    let start = parse_timestamp("2021-01-01T00:00:00").unwrap();
    let targets: Vec<TargetRecord> = (0..n_targets).map(|id| TargetRecord { id }).collect();

    let mut states = Vec::new();
    let mut propagations = Vec::new();
    for t in 0..n_targets {
        for k in 0..n_days * 4 {
            let id = t * 1_000_000 + k;
            // stagger targets by one hour so windows mix several creation hours
            let epoch = start + days(k as f64 / 4.0 + t as f64 / 24.0);
            states.push(StateRecord {
                id,
                target_id: t,
                epoch,
            });
            for step in 1..=16 {
                let scale = 1.0 + step as f64 * 0.1 + t as f64;
                propagations.push(PropagationRecord {
                    timestamp: epoch + days(step as f64 / 4.0),
                    target_state_id: Some(id),
                    covariance: CovarianceEntries {
                        xx: 4.0 * scale,
                        xy: 0.1 * scale,
                        xz: 0.0,
                        yy: 2.0 * scale,
                        yz: 0.05 * scale,
                        zz: scale,
                    },
                    eigenvalues: None,
                });
            }
        }
    }

    StudyTables::new(targets, states, propagations).unwrap()
}

fn bench_eigen_features(c: &mut Criterion) {
    let tables = synthetic_tables(20, 14);
    c.bench_function("eigen_features/20_targets_14_days", |b| {
        b.iter_batched(
            || tables.clone(),
            |t| black_box(t.with_eigen_features()),
            BatchSize::LargeInput,
        )
    });
}

fn bench_reference_mode(c: &mut Criterion) {
    let tables = synthetic_tables(20, 14).with_eigen_features();
    let study = Study::new(StudyParams::default());

    c.bench_function("study_run/reference_closest", |b| {
        b.iter(|| black_box(study.run(black_box(&tables)).ok()))
    });
}

fn bench_epoch_mode(c: &mut Criterion) {
    let tables = synthetic_tables(20, 14).with_eigen_features();
    let params = StudyParams::builder()
        .mode(AnalysisMode::EpochExact)
        .horizons([Horizon::OneDay, Horizon::ThreeDays])
        .build()
        .unwrap();
    let study = Study::new(params);

    c.bench_function("study_run/epoch_exact", |b| {
        b.iter(|| black_box(study.run(black_box(&tables)).ok()))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_eigen_features, bench_reference_mode, bench_epoch_mode
);
criterion_main!(benches);
