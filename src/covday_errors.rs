use thiserror::Error;

use crate::constants::{StateId, TargetId};

#[derive(Error, Debug)]
pub enum CovdayError {
    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid study parameter: {0}")]
    InvalidStudyParameter(String),

    #[error("The states table is empty, the study span is undefined")]
    EmptyStateTable,

    #[error("State id {0} appears more than once in the states table")]
    DuplicateStateId(StateId),

    #[error("State not found: {0}")]
    UnknownState(StateId),

    #[error("Target not found: {0}")]
    UnknownTarget(TargetId),

    #[error("No propagation of state {state_id} at the expected timestamp {expected}")]
    MissingPropagation { state_id: StateId, expected: String },

    #[error("State {0} has no linked propagation record")]
    NoPropagationForState(StateId),

    #[error("Propagation record {0} has no eigenvalue columns; run the eigen-feature preprocessor first")]
    MissingEigenFeatures(usize),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for CovdayError {
    fn eq(&self, other: &Self) -> bool {
        use CovdayError::*;
        match (self, other) {
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (InvalidTimestamp(a), InvalidTimestamp(b)) => a == b,
            (InvalidStudyParameter(a), InvalidStudyParameter(b)) => a == b,
            (DuplicateStateId(a), DuplicateStateId(b)) => a == b,
            (UnknownState(a), UnknownState(b)) => a == b,
            (UnknownTarget(a), UnknownTarget(b)) => a == b,
            (
                MissingPropagation {
                    state_id: a,
                    expected: ea,
                },
                MissingPropagation {
                    state_id: b,
                    expected: eb,
                },
            ) => a == b && ea == eb,
            (NoPropagationForState(a), NoPropagationForState(b)) => a == b,
            (MissingEigenFeatures(a), MissingEigenFeatures(b)) => a == b,

            // Foreign errors are not comparable: equal when the variant matches
            (Csv(_), Csv(_)) => true,
            (IoError(_), IoError(_)) => true,

            (EmptyStateTable, EmptyStateTable) => true,

            _ => false,
        }
    }
}
