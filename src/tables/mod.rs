//! # Study tables: targets, states and propagations
//!
//! In-memory, read-only view of the three source tables of a study, with the indexes the
//! binning and lookup passes need.
//!
//! Data Model
//! -----------------
//! * [`TargetRecord`] – a tracked object.
//! * [`StateRecord`] – a state estimate of a target, stamped with its creation epoch.
//! * [`PropagationRecord`] – a forward-propagated covariance snapshot. It links to its state
//!   through `target_state_id` when the source carries that column; the epoch-based lookup
//!   can instead join on the propagation timestamp alone.
//!
//! Indexes
//! -----------------
//! [`StudyTables::new`] builds, once:
//! * `state id → row` (state ids must be unique, fail-fast otherwise),
//! * `target id → state rows` in data order,
//! * `state id → propagation rows` in data order.
//!
//! Row order is preserved everywhere; "first in data order" tie-breaks rely on it.
//!
//! Modules
//! -----------------
//! * [`csv_reader`](crate::tables::csv_reader) – CSV ingestion of the three tables.
use hifitime::{Duration, Epoch};

use crate::{
    calendar::{span_of, CalendarDate},
    constants::{Eigenvalues, FastHashMap, StateId, TargetId},
    covariance::{add_eigen_features, CovarianceEntries},
    covday_errors::CovdayError,
};

pub mod csv_reader;

/// A tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRecord {
    pub id: TargetId,
}

/// A point-in-time state estimate of a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRecord {
    pub id: StateId,
    pub target_id: TargetId,
    /// Creation epoch of the state (UTC).
    pub epoch: Epoch,
}

/// A propagated covariance snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationRecord {
    /// Epoch the covariance is propagated to (UTC).
    pub timestamp: Epoch,
    /// State the propagation starts from, when the source carries the link.
    pub target_state_id: Option<StateId>,
    pub covariance: CovarianceEntries,
    /// Descending eigenvalues of the covariance, attached by the eigen-feature preprocessor.
    pub eigenvalues: Option<Eigenvalues>,
}

/// Read-only study tables with join indexes.
#[derive(Debug, Clone, Default)]
pub struct StudyTables {
    targets: Vec<TargetRecord>,
    states: Vec<StateRecord>,
    propagations: Vec<PropagationRecord>,
    state_rows: FastHashMap<StateId, usize>,
    target_states: FastHashMap<TargetId, Vec<usize>>,
    state_propagations: FastHashMap<StateId, Vec<usize>>,
}

impl StudyTables {
    /// Index the three tables.
    ///
    /// Return
    /// ----------
    /// * The indexed tables.
    /// * [`CovdayError::DuplicateStateId`] if two state rows share an id.
    pub fn new(
        targets: Vec<TargetRecord>,
        states: Vec<StateRecord>,
        propagations: Vec<PropagationRecord>,
    ) -> Result<Self, CovdayError> {
        let mut state_rows = FastHashMap::default();
        let mut target_states: FastHashMap<TargetId, Vec<usize>> = FastHashMap::default();
        for (row, state) in states.iter().enumerate() {
            if state_rows.insert(state.id, row).is_some() {
                return Err(CovdayError::DuplicateStateId(state.id));
            }
            target_states.entry(state.target_id).or_default().push(row);
        }

        let mut state_propagations: FastHashMap<StateId, Vec<usize>> = FastHashMap::default();
        for (row, prop) in propagations.iter().enumerate() {
            if let Some(state_id) = prop.target_state_id {
                state_propagations.entry(state_id).or_default().push(row);
            }
        }

        Ok(StudyTables {
            targets,
            states,
            propagations,
            state_rows,
            target_states,
            state_propagations,
        })
    }

    /// Attach covariance eigenvalues to every propagation record.
    ///
    /// See [`add_eigen_features`]. Indexes are unaffected (rows keep their positions).
    pub fn with_eigen_features(mut self) -> Self {
        self.propagations = add_eigen_features(self.propagations);
        self
    }

    /// `true` once every propagation carries its eigenvalue columns.
    pub fn has_eigen_features(&self) -> bool {
        self.propagations.iter().all(|p| p.eigenvalues.is_some())
    }

    pub fn targets(&self) -> &[TargetRecord] {
        &self.targets
    }

    pub fn states(&self) -> &[StateRecord] {
        &self.states
    }

    pub fn propagations(&self) -> &[PropagationRecord] {
        &self.propagations
    }

    /// Ids of every target, in table order.
    pub fn target_ids(&self) -> Vec<TargetId> {
        self.targets.iter().map(|t| t.id).collect()
    }

    /// Look up a state by id.
    pub fn state(&self, id: StateId) -> Result<&StateRecord, CovdayError> {
        self.state_rows
            .get(&id)
            .map(|&row| &self.states[row])
            .ok_or(CovdayError::UnknownState(id))
    }

    /// States of a target, in data order. Empty for a target without states.
    pub fn states_of_target(&self, target_id: TargetId) -> impl Iterator<Item = &StateRecord> {
        self.target_states
            .get(&target_id)
            .into_iter()
            .flatten()
            .map(|&row| &self.states[row])
    }

    /// Every state id of the given targets: target-major, then data order.
    pub fn collect_state_ids(&self, target_ids: &[TargetId]) -> Vec<StateId> {
        target_ids
            .iter()
            .flat_map(|&t| self.states_of_target(t).map(|s| s.id))
            .collect()
    }

    /// Propagations linked to a state through `target_state_id`, with their row index, in
    /// data order.
    pub fn propagations_of_state(
        &self,
        state_id: StateId,
    ) -> impl Iterator<Item = (usize, &PropagationRecord)> {
        self.state_propagations
            .get(&state_id)
            .into_iter()
            .flatten()
            .map(|&row| (row, &self.propagations[row]))
    }

    /// First propagation (data order) whose timestamp is within `tolerance` of `timestamp`,
    /// regardless of the state it belongs to.
    pub fn propagation_at(
        &self,
        timestamp: Epoch,
        tolerance: Duration,
    ) -> Option<(usize, &PropagationRecord)> {
        self.propagations
            .iter()
            .enumerate()
            .find(|(_, p)| (p.timestamp - timestamp).abs() <= tolerance)
    }

    /// Start and end dates of the study: dates of the earliest and latest state epochs.
    pub fn study_span(&self) -> Result<(CalendarDate, CalendarDate), CovdayError> {
        span_of(&self.states)
    }
}
