//! # Propagation selector
//!
//! Fills the horizon channels of binned days: for every state binned into a window, one
//! propagation record is selected per horizon and its covariance features (three descending
//! eigenvalues, diagonal RMS) are appended to that window's bucket.
//!
//! Lookup strategies
//! -----------------
//! * [`ExactOffsetLookup`] – pairs with epoch binning. The expected timestamp is the
//!   **state creation epoch** plus the horizon; a propagation must exist at that timestamp
//!   (within a small tolerance), otherwise the run fails with
//!   [`CovdayError::MissingPropagation`]. The join is either global on the timestamp
//!   ([`PropagationJoin::GlobalTimestamp`]) or restricted to the propagations linked to the
//!   state ([`PropagationJoin::StateReference`]).
//! * [`ClosestMatchLookup`] – pairs with reference binning. The target timestamp is the
//!   **window reference instant** plus the horizon; among the propagations linked to the
//!   state, the one with the smallest absolute time difference wins (first in table order on
//!   ties). A state with no linked propagation at all fails with
//!   [`CovdayError::NoPropagationForState`].
//!
//! Both strategies require the eigenvalue columns
//! ([`StudyTables::with_eigen_features`]); a record without them yields
//! [`CovdayError::MissingEigenFeatures`].
//!
//! See also
//! ------------
//! * [`crate::binning`] – Produces the [`BinnedDay`] values consumed by [`populate_days`].
//! * [`crate::percentiles`] – Aggregates the resulting [`PopulatedDay`] sequence.
use std::fmt;

use hifitime::{Duration, Epoch};
use tracing::debug;

use crate::{
    constants::{StateId, DEFAULT_EXACT_MATCH_TOLERANCE_S},
    covday_errors::CovdayError,
    day::{
        BinnedDay, Horizon, HorizonSamples, PopulatedDay, PropagationFeatures, Window,
        WindowSample,
    },
    tables::{PropagationRecord, StudyTables},
    time::fmt_epoch,
};

#[cfg(feature = "progress")]
use crate::progress_bar::day_progress_bar;

/// Join used by [`ExactOffsetLookup`] to find the propagation at the expected timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationJoin {
    /// Any propagation row stamped at the expected timestamp, whatever state it belongs to.
    #[default]
    GlobalTimestamp,
    /// Only propagations linked to the state through `target_state_id`.
    StateReference,
}

impl fmt::Display for PropagationJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationJoin::GlobalTimestamp => write!(f, "global-timestamp"),
            PropagationJoin::StateReference => write!(f, "state-reference"),
        }
    }
}

/// A policy selecting the propagation record that feeds a `(state, window, horizon)` slot.
pub trait LookupStrategy {
    /// Features of the propagation selected for `state_id`.
    ///
    /// Arguments
    /// -----------------
    /// * `tables` – Source tables, with eigen-features attached.
    /// * `state_id` – State binned into the window.
    /// * `now` – Reference instant of the window.
    /// * `horizon` – Forward offset to sample.
    ///
    /// Return
    /// ----------
    /// * The covariance features of the selected record, or the join error.
    fn lookup(
        &self,
        tables: &StudyTables,
        state_id: StateId,
        now: Epoch,
        horizon: Horizon,
    ) -> Result<PropagationFeatures, CovdayError>;
}

/// Exact match at `state epoch + horizon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactOffsetLookup {
    join: PropagationJoin,
    tolerance: Duration,
}

impl ExactOffsetLookup {
    pub fn new(join: PropagationJoin, tolerance_s: f64) -> Self {
        ExactOffsetLookup {
            join,
            tolerance: Duration::from_seconds(tolerance_s),
        }
    }

    pub fn join(&self) -> PropagationJoin {
        self.join
    }
}

impl Default for ExactOffsetLookup {
    fn default() -> Self {
        Self::new(PropagationJoin::default(), DEFAULT_EXACT_MATCH_TOLERANCE_S)
    }
}

impl LookupStrategy for ExactOffsetLookup {
    fn lookup(
        &self,
        tables: &StudyTables,
        state_id: StateId,
        _now: Epoch,
        horizon: Horizon,
    ) -> Result<PropagationFeatures, CovdayError> {
        let expected = tables.state(state_id)?.epoch + horizon.offset();
        let found = match self.join {
            PropagationJoin::GlobalTimestamp => tables.propagation_at(expected, self.tolerance),
            PropagationJoin::StateReference => tables
                .propagations_of_state(state_id)
                .find(|(_, p)| (p.timestamp - expected).abs() <= self.tolerance),
        };
        let (row, record) = found.ok_or_else(|| CovdayError::MissingPropagation {
            state_id,
            expected: fmt_epoch(expected),
        })?;
        features_of(row, record)
    }
}

/// Closest match to `window reference instant + horizon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosestMatchLookup;

impl LookupStrategy for ClosestMatchLookup {
    fn lookup(
        &self,
        tables: &StudyTables,
        state_id: StateId,
        now: Epoch,
        horizon: Horizon,
    ) -> Result<PropagationFeatures, CovdayError> {
        closest_propagation(tables, state_id, now, horizon)
    }
}

/// Features of the propagation of `state_id` closest to `reference + horizon`.
///
/// Return
/// ----------
/// * The features of the record minimizing `|timestamp - (reference + horizon)|`, first in
///   table order on ties.
/// * [`CovdayError::NoPropagationForState`] if the state has no linked propagation.
pub fn closest_propagation(
    tables: &StudyTables,
    state_id: StateId,
    reference: Epoch,
    horizon: Horizon,
) -> Result<PropagationFeatures, CovdayError> {
    let target = reference + horizon.offset();
    let (row, record) = tables
        .propagations_of_state(state_id)
        .min_by_key(|(_, p)| (p.timestamp - target).abs().total_nanoseconds())
        .ok_or(CovdayError::NoPropagationForState(state_id))?;
    features_of(row, record)
}

/// Eigenvalues and diagonal RMS of a propagation row.
pub fn features_of(
    row: usize,
    record: &PropagationRecord,
) -> Result<PropagationFeatures, CovdayError> {
    let eigenvalues = record
        .eigenvalues
        .ok_or(CovdayError::MissingEigenFeatures(row))?;
    Ok(PropagationFeatures {
        eigenvalues,
        rms: record.covariance.rms(),
    })
}

fn populate_day(
    binned: BinnedDay,
    tables: &StudyTables,
    lookup: &dyn LookupStrategy,
    horizons: &[Horizon],
) -> Result<PopulatedDay, CovdayError> {
    let mut samples: HorizonSamples = Default::default();
    for &horizon in horizons {
        for window in Window::ALL {
            let now = binned.day.reference_instant(window);
            samples[horizon.index()][window.index()] = binned
                .bins
                .window(window)
                .iter()
                .map(|&state_id| {
                    Ok(WindowSample {
                        state_id,
                        features: lookup.lookup(tables, state_id, now, horizon)?,
                    })
                })
                .collect::<Result<Vec<_>, CovdayError>>()?;
        }
    }
    Ok(PopulatedDay::new(binned, samples))
}

/// Run the lookup pass over every binned day.
///
/// Horizons not listed in `horizons` stay empty (and aggregate to NaN).
///
/// Return
/// ----------
/// * One [`PopulatedDay`] per input day, same order, or the first lookup error.
pub fn populate_days(
    binned: Vec<BinnedDay>,
    tables: &StudyTables,
    lookup: &dyn LookupStrategy,
    horizons: &[Horizon],
) -> Result<Vec<PopulatedDay>, CovdayError> {
    #[cfg(feature = "progress")]
    let pb = day_progress_bar(binned.len());

    let populated = binned
        .into_iter()
        .map(|day| {
            #[cfg(feature = "progress")]
            {
                pb.set_message(day.day.date_string());
                pb.inc(1);
            }
            populate_day(day, tables, lookup, horizons)
        })
        .collect::<Result<Vec<_>, CovdayError>>();

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    let populated = populated?;
    debug!(
        days = populated.len(),
        horizons = horizons.len(),
        "propagation lookup done"
    );
    Ok(populated)
}
