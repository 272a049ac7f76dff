//! # CSV Reader for Study Tables
//!
//! Deserializes the three source tables of a study from CSV (header row required) into
//! [`TargetRecord`], [`StateRecord`] and [`PropagationRecord`] values.
//!
//! ## Expected Columns
//! -----------------
//! * **targets**: `id`
//! * **states**: `id`, `target_id`, `timestamp`
//! * **propagations**: `timestamp`, `target_state_id` (optional / may be empty),
//!   `covariance_xx`, `covariance_xy`, `covariance_xz`, `covariance_yy`, `covariance_yz`,
//!   `covariance_zz`
//!
//! Extra columns are ignored. Timestamps are accepted as unix seconds or ISO-8601
//! date-times (see [`parse_timestamp`]).
//!
//! ## Error Handling
//! -----------------
//! The first malformed row aborts the read: CSV / type errors surface as
//! [`CovdayError::Csv`], unparsable timestamps as [`CovdayError::InvalidTimestamp`].
//! Eigenvalue columns are never read from disk; run
//! [`StudyTables::with_eigen_features`] after loading.
use std::{fs::File, io::Read};

use camino::Utf8Path;
use serde::Deserialize;

use crate::{
    constants::{StateId, TargetId},
    covariance::CovarianceEntries,
    covday_errors::CovdayError,
    tables::{PropagationRecord, StateRecord, StudyTables, TargetRecord},
    time::parse_timestamp,
};

#[derive(Debug, Deserialize)]
struct TargetRow {
    id: TargetId,
}

#[derive(Debug, Deserialize)]
struct StateRow {
    id: StateId,
    target_id: TargetId,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct PropagationRow {
    timestamp: String,
    #[serde(default)]
    target_state_id: Option<StateId>,
    covariance_xx: f64,
    covariance_xy: f64,
    covariance_xz: f64,
    covariance_yy: f64,
    covariance_yz: f64,
    covariance_zz: f64,
}

impl TryFrom<StateRow> for StateRecord {
    type Error = CovdayError;

    fn try_from(row: StateRow) -> Result<Self, Self::Error> {
        Ok(StateRecord {
            id: row.id,
            target_id: row.target_id,
            epoch: parse_timestamp(&row.timestamp)?,
        })
    }
}

impl TryFrom<PropagationRow> for PropagationRecord {
    type Error = CovdayError;

    fn try_from(row: PropagationRow) -> Result<Self, Self::Error> {
        Ok(PropagationRecord {
            timestamp: parse_timestamp(&row.timestamp)?,
            target_state_id: row.target_state_id,
            covariance: CovarianceEntries {
                xx: row.covariance_xx,
                xy: row.covariance_xy,
                xz: row.covariance_xz,
                yy: row.covariance_yy,
                yz: row.covariance_yz,
                zz: row.covariance_zz,
            },
            eigenvalues: None,
        })
    }
}

/// Read a targets table.
pub fn read_targets<R: Read>(reader: R) -> Result<Vec<TargetRecord>, CovdayError> {
    csv::Reader::from_reader(reader)
        .deserialize::<TargetRow>()
        .map(|row| Ok(TargetRecord { id: row?.id }))
        .collect()
}

/// Read a states table.
pub fn read_states<R: Read>(reader: R) -> Result<Vec<StateRecord>, CovdayError> {
    csv::Reader::from_reader(reader)
        .deserialize::<StateRow>()
        .map(|row| StateRecord::try_from(row?))
        .collect()
}

/// Read a propagations table (eigenvalue columns left empty).
pub fn read_propagations<R: Read>(reader: R) -> Result<Vec<PropagationRecord>, CovdayError> {
    csv::Reader::from_reader(reader)
        .deserialize::<PropagationRow>()
        .map(|row| PropagationRecord::try_from(row?))
        .collect()
}

impl StudyTables {
    /// Load and index the three tables from CSV files.
    ///
    /// Arguments
    /// -----------------
    /// * `targets` – Path of the targets table.
    /// * `states` – Path of the states table.
    /// * `propagations` – Path of the propagations table.
    ///
    /// Return
    /// ----------
    /// * Indexed tables **without** eigen-features (see [`StudyTables::with_eigen_features`]).
    /// * [`CovdayError::IoError`] if a file cannot be opened, or any read / index error.
    pub fn from_csv_files(
        targets: &Utf8Path,
        states: &Utf8Path,
        propagations: &Utf8Path,
    ) -> Result<Self, CovdayError> {
        let targets = read_targets(File::open(targets)?)?;
        let states = read_states(File::open(states)?)?;
        let propagations = read_propagations(File::open(propagations)?)?;
        StudyTables::new(targets, states, propagations)
    }
}

#[cfg(test)]
mod csv_reader_test {
    use super::*;
    use crate::time::{epoch_to_unix, gregorian_fields};

    #[test]
    fn test_read_states() {
        let data = "id,target_id,timestamp\n\
                    1,7,2021-01-30 10:00:00\n\
                    2,7,2021-01-31T17:45:10\n";
        let states = read_states(data.as_bytes()).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].target_id, 7);
        assert_eq!(gregorian_fields(states[1].epoch), (2021, 1, 31, 17, 45, 10));
    }

    #[test]
    fn test_read_propagations_with_and_without_link() {
        let data = "timestamp,target_state_id,covariance_xx,covariance_xy,covariance_xz,covariance_yy,covariance_yz,covariance_zz\n\
                    1612137600,3,1.0,0.0,0.0,2.0,0.0,3.0\n\
                    1612224000,,4.0,0.5,0.0,4.0,0.0,1.0\n";
        let props = read_propagations(data.as_bytes()).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].target_state_id, Some(3));
        assert_eq!(props[1].target_state_id, None);
        assert_eq!(epoch_to_unix(props[0].timestamp), 1_612_137_600.0);
        assert_eq!(props[1].covariance.xy, 0.5);
        assert!(props[0].eigenvalues.is_none());
    }

    #[test]
    fn test_read_targets_and_bad_timestamp() {
        let targets = read_targets("id\n4\n9\n".as_bytes()).unwrap();
        assert_eq!(targets, vec![TargetRecord { id: 4 }, TargetRecord { id: 9 }]);

        let data = "id,target_id,timestamp\n1,7,yesterday\n";
        let err = read_states(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CovdayError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_read_states_bad_id() {
        let data = "id,target_id,timestamp\nabc,7,2021-01-30T10:00:00\n";
        let err = read_states(data.as_bytes()).unwrap_err();
        assert!(matches!(err, CovdayError::Csv(_)));
    }
}
