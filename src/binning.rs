//! # Binning engine
//!
//! Assigns state records to the days and 8-hour windows of a study. Two policies exist side
//! by side, both behind [`BinningStrategy`]:
//!
//! * [`EpochBinning`] – a state lands in the day of its own creation epoch, and in the window
//!   of its creation hour (`hour <= 8`, `8 < hour <= 16`, `hour > 16`). Every relevant state
//!   appears at most once in the whole study.
//! * [`ReferenceBinning`] – for every window reference instant ("now") and every target, the
//!   most recent state created at or before "now" is selected, provided it is younger than
//!   the cutoff. A state may therefore feed several consecutive windows, and a target
//!   contributes **at most one** state per window.
//!
//! ## Tie-breaking
//! -----------------
//! In reference binning the candidate with the smallest non-negative gap `now - epoch` wins;
//! equal gaps keep the first candidate in table order.
//!
//! ## Missing references
//! -----------------
//! A target without any qualifying state (none before "now", or the closest one is too old)
//! simply contributes nothing to that window. This is an expected outcome, not an error.
//!
//! ## Pairing
//! -----------------
//! A binning policy must be paired with its lookup counterpart from
//! [`crate::propagation`]: epoch binning with the exact-offset lookup, reference binning
//! with the closest-match lookup. [`crate::study::AnalysisMode`] enforces the pairing.
use hifitime::{Duration, Epoch};
use tracing::{debug, trace};

use crate::{
    calendar::CalendarDate,
    constants::{StateId, TargetId},
    covday_errors::CovdayError,
    day::{BinnedDay, Day, DayBins, Window},
    tables::StudyTables,
    time::{days, gregorian_fields},
};

/// A policy assigning state ids to the windows of each day.
pub trait BinningStrategy {
    /// Bin states into every day of the sequence.
    ///
    /// Arguments
    /// -----------------
    /// * `days` – The study's day sequence, in calendar order.
    /// * `tables` – Source tables.
    ///
    /// Return
    /// ----------
    /// * One [`BinnedDay`] per input day, same order.
    /// * An error if a join key cannot be resolved.
    fn bin_days(&self, days: &[Day], tables: &StudyTables) -> Result<Vec<BinnedDay>, CovdayError>;
}

/// Bin states by their own creation epoch.
#[derive(Debug, Clone)]
pub struct EpochBinning {
    state_ids: Vec<StateId>,
}

impl EpochBinning {
    /// Bin exactly the given states (typically [`StudyTables::collect_state_ids`] of the
    /// relevant targets).
    pub fn new(state_ids: Vec<StateId>) -> Self {
        EpochBinning { state_ids }
    }

    /// Bin every state of the given targets.
    pub fn for_targets(tables: &StudyTables, target_ids: &[TargetId]) -> Self {
        Self::new(tables.collect_state_ids(target_ids))
    }

    pub fn state_ids(&self) -> &[StateId] {
        &self.state_ids
    }
}

impl BinningStrategy for EpochBinning {
    fn bin_days(&self, days: &[Day], tables: &StudyTables) -> Result<Vec<BinnedDay>, CovdayError> {
        // Resolve every id once, fail-fast on unknown states.
        let placed = self
            .state_ids
            .iter()
            .map(|&id| {
                let state = tables.state(id)?;
                let (.., hour, _, _) = gregorian_fields(state.epoch);
                Ok((id, CalendarDate::from_epoch(state.epoch), Window::from_hour(hour)))
            })
            .collect::<Result<Vec<_>, CovdayError>>()?;

        let binned: Vec<BinnedDay> = days
            .iter()
            .map(|day| {
                let mut bins = DayBins::default();
                for &(id, _, window) in placed.iter().filter(|(_, d, _)| *d == day.date()) {
                    bins.states_bin.push(id);
                    bins.windows[window.index()].push(id);
                }
                BinnedDay {
                    day: day.clone(),
                    bins,
                }
            })
            .collect();

        debug!(
            states = self.state_ids.len(),
            binned = binned.iter().map(|d| d.bins.total()).sum::<usize>(),
            "epoch binning done"
        );
        Ok(binned)
    }
}

/// Bin, per window, the closest prior state of every target.
#[derive(Debug, Clone)]
pub struct ReferenceBinning {
    target_ids: Vec<TargetId>,
    cutoff: Duration,
}

impl ReferenceBinning {
    /// Arguments
    /// -----------------
    /// * `target_ids` – Relevant targets, in the order their states are appended to windows.
    /// * `cutoff_days` – Maximum age of a selected state, in days (strict bound).
    pub fn new(target_ids: Vec<TargetId>, cutoff_days: f64) -> Self {
        ReferenceBinning {
            target_ids,
            cutoff: days(cutoff_days),
        }
    }

    pub fn cutoff(&self) -> Duration {
        self.cutoff
    }
}

impl BinningStrategy for ReferenceBinning {
    fn bin_days(&self, days: &[Day], tables: &StudyTables) -> Result<Vec<BinnedDay>, CovdayError> {
        let mut skipped = 0usize;
        let binned: Vec<BinnedDay> = days
            .iter()
            .map(|day| {
                let mut bins = DayBins::default();
                for window in Window::ALL {
                    let now = day.reference_instant(window);
                    let closest =
                        closest_states_of_targets(tables, &self.target_ids, now, self.cutoff);
                    skipped += closest.iter().filter(|c| c.is_none()).count();
                    bins.windows[window.index()].extend(closest.into_iter().flatten());
                }
                trace!(day = %day.date(), total = bins.total(), "reference binning");
                BinnedDay {
                    day: day.clone(),
                    bins,
                }
            })
            .collect();

        debug!(
            targets = self.target_ids.len(),
            windows = binned.len() * Window::ALL.len(),
            missing_references = skipped,
            "reference binning done"
        );
        Ok(binned)
    }
}

/// Most recent state of `target_id` created at or before `now`, if it is younger than
/// `cutoff`.
///
/// Return
/// ----------
/// * `Some(state_id)` of the state with the smallest non-negative gap (first in table order
///   on ties).
/// * `None` if the target has no state before `now`, or if the closest one has
///   `now - epoch >= cutoff`.
pub fn find_closest_state_of_target(
    tables: &StudyTables,
    target_id: TargetId,
    now: Epoch,
    cutoff: Duration,
) -> Option<StateId> {
    tables
        .states_of_target(target_id)
        .filter(|s| s.epoch <= now)
        .map(|s| (now - s.epoch, s.id))
        .fold(None, |best: Option<(Duration, StateId)>, cand| match best {
            Some(b) if b.0 <= cand.0 => Some(b),
            _ => Some(cand),
        })
        .filter(|(gap, _)| *gap < cutoff)
        .map(|(_, id)| id)
}

/// [`find_closest_state_of_target`] for every target, in target order.
pub fn closest_states_of_targets(
    tables: &StudyTables,
    target_ids: &[TargetId],
    now: Epoch,
    cutoff: Duration,
) -> Vec<Option<StateId>> {
    target_ids
        .iter()
        .map(|&t| find_closest_state_of_target(tables, t, now, cutoff))
        .collect()
}
