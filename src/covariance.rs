//! # Covariance eigen-features
//!
//! Reassembles the symmetric 3×3 position covariance of a propagation from its six stored
//! entries and derives the features consumed by the lookup and aggregation passes:
//!
//! * the three eigenvalues, sorted **descending** (principal-axis variances),
//! * the RMS of the diagonal, `sqrt(xx + yy + zz)`.
//!
//! The RMS is taken from the diagonal entries, not from the eigenvalues. Both agree in exact
//! arithmetic (the trace is invariant) but the diagonal form is what the stored columns give
//! directly.
//!
//! [`add_eigen_features`] must run once over the propagation table before any lookup reads
//! the eigenvalue columns; lookups fail with
//! [`CovdayError::MissingEigenFeatures`](crate::covday_errors::CovdayError::MissingEigenFeatures)
//! otherwise.
use nalgebra::{Matrix3, SymmetricEigen};

use crate::{constants::Eigenvalues, tables::PropagationRecord};

/// The six independent entries of a symmetric 3×3 covariance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovarianceEntries {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yy: f64,
    pub yz: f64,
    pub zz: f64,
}

impl CovarianceEntries {
    /// Covariance with zero off-diagonal terms.
    pub fn diagonal(xx: f64, yy: f64, zz: f64) -> Self {
        CovarianceEntries {
            xx,
            xy: 0.0,
            xz: 0.0,
            yy,
            yz: 0.0,
            zz,
        }
    }

    /// Full symmetric matrix.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.xx, self.xy, self.xz, //
            self.xy, self.yy, self.yz, //
            self.xz, self.yz, self.zz,
        )
    }

    /// Eigenvalues of the covariance, sorted descending.
    pub fn eigenvalues(&self) -> Eigenvalues {
        let eig = SymmetricEigen::new(self.to_matrix()).eigenvalues;
        let mut values = [eig[0], eig[1], eig[2]];
        values.sort_by(|a, b| b.total_cmp(a));
        values
    }

    /// `sqrt(xx + yy + zz)`
    pub fn rms(&self) -> f64 {
        (self.xx + self.yy + self.zz).sqrt()
    }
}

/// Attach the descending eigenvalues to every propagation record.
///
/// Pure transformation: records are returned in the same order, only their `eigenvalues`
/// column is (re)computed.
pub fn add_eigen_features(propagations: Vec<PropagationRecord>) -> Vec<PropagationRecord> {
    propagations
        .into_iter()
        .map(|p| PropagationRecord {
            eigenvalues: Some(p.covariance.eigenvalues()),
            ..p
        })
        .collect()
}
