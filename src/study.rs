//! # Study configuration and end-to-end run
//!
//! This module defines [`StudyParams`] (with its validating builder) and [`Study`], which
//! chains every pass of an analysis over a set of [`StudyTables`].
//!
//! ## Pipeline
//!
//! 1. **Eigen-features**
//!    Propagations without eigenvalue columns are run through the eigen-feature
//!    preprocessor ([`StudyTables::with_eigen_features`]) on a private copy.
//!
//! 2. **Day sequence**
//!    One [`Day`](crate::day::Day) per civil date between the earliest and the latest state
//!    epoch, end date excluded unless [`StudyEnd::Inclusive`] is requested.
//!
//! 3. **Binning**
//!    States of the relevant targets are assigned to windows by the binning policy of the
//!    selected [`AnalysisMode`].
//!
//! 4. **Propagation lookup**
//!    Every binned state receives one propagation per requested horizon, through the lookup
//!    policy paired with the binning policy.
//!
//! 5. **Aggregation**
//!    Percentile series per horizon, collected in a [`StudyReport`].
//!
//! ## Modes
//!
//! | mode | binning | lookup |
//! |---|---|---|
//! | [`AnalysisMode::EpochExact`] | [`EpochBinning`] | [`ExactOffsetLookup`] |
//! | [`AnalysisMode::ReferenceClosest`] | [`ReferenceBinning`] | [`ClosestMatchLookup`] |
//!
//! A study always uses one pair; the two policies cannot be mixed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use covday::study::{AnalysisMode, Study, StudyParams};
//! use covday::tables::StudyTables;
//!
//! let tables = StudyTables::from_csv_files(
//!     Utf8Path::new("targets.csv"),
//!     Utf8Path::new("states.csv"),
//!     Utf8Path::new("propagations.csv"),
//! )
//! .unwrap();
//!
//! let params = StudyParams::builder()
//!     .mode(AnalysisMode::ReferenceClosest)
//!     .cutoff_days(5.0)
//!     .build()
//!     .unwrap();
//!
//! let report = Study::new(params).run(&tables).unwrap();
//! println!("{} days, {} buckets", report.day_count(), report.bucket_count());
//! ```
use std::borrow::Cow;
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use itertools::Itertools;
use tracing::{debug, info};

use crate::{
    binning::{BinningStrategy, EpochBinning, ReferenceBinning},
    calendar::{build_day_sequence_with_end, StudyEnd},
    constants::{TargetId, DEFAULT_CUTOFF_DAYS, DEFAULT_EXACT_MATCH_TOLERANCE_S},
    covday_errors::CovdayError,
    day::Horizon,
    percentiles::aggregate,
    propagation::{
        populate_days, ClosestMatchLookup, ExactOffsetLookup, LookupStrategy, PropagationJoin,
    },
    report::StudyReport,
    tables::StudyTables,
};

/// Binning / lookup pair used by a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Bin states by creation epoch, read propagations at `state epoch + horizon`.
    EpochExact,
    /// Bin the closest prior state of each target per window, read the propagation closest
    /// to `window start + horizon`.
    #[default]
    ReferenceClosest,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::EpochExact => write!(f, "epoch-exact"),
            AnalysisMode::ReferenceClosest => write!(f, "reference-closest"),
        }
    }
}

/// Tunable parameters of a study run.
///
/// Fields
/// -----------------
/// * `mode` – Binning / lookup pair (default [`AnalysisMode::ReferenceClosest`]).
/// * `cutoff_days` – Maximum age of a state in reference binning, days, `> 0` (default 7).
/// * `horizons` – Horizons filled and aggregated, non-empty, no duplicates (default all).
/// * `end` – Whether the last date of the span gets a day (default excluded).
/// * `join` – Join of the exact-offset lookup (default global on the timestamp).
/// * `exact_match_tolerance_s` – Tolerance of exact timestamp matches, seconds, `>= 0`.
/// * `targets` – Relevant targets; `None` uses the whole targets table.
///
/// See also
/// -----------------
/// * [`StudyParamsBuilder::build`] – Validation rules.
/// * [`Study::run`] – Consumer of these parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyParams {
    pub mode: AnalysisMode,
    pub cutoff_days: f64,
    pub horizons: Vec<Horizon>,
    pub end: StudyEnd,
    pub join: PropagationJoin,
    pub exact_match_tolerance_s: f64,
    pub targets: Option<Vec<TargetId>>,
}

impl StudyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StudyParamsBuilder {
        StudyParamsBuilder::new()
    }

    /// Binning policy of the configured mode, over `target_ids`.
    pub fn binning_strategy(
        &self,
        tables: &StudyTables,
        target_ids: &[TargetId],
    ) -> Box<dyn BinningStrategy> {
        match self.mode {
            AnalysisMode::EpochExact => Box::new(EpochBinning::for_targets(tables, target_ids)),
            AnalysisMode::ReferenceClosest => {
                Box::new(ReferenceBinning::new(target_ids.to_vec(), self.cutoff_days))
            }
        }
    }

    /// Lookup policy paired with [`StudyParams::binning_strategy`].
    pub fn lookup_strategy(&self) -> Box<dyn LookupStrategy> {
        match self.mode {
            AnalysisMode::EpochExact => Box::new(ExactOffsetLookup::new(
                self.join,
                self.exact_match_tolerance_s,
            )),
            AnalysisMode::ReferenceClosest => Box::new(ClosestMatchLookup),
        }
    }
}

impl Default for StudyParams {
    fn default() -> Self {
        StudyParams {
            mode: AnalysisMode::default(),
            cutoff_days: DEFAULT_CUTOFF_DAYS,
            horizons: Horizon::ALL.to_vec(),
            end: StudyEnd::default(),
            join: PropagationJoin::default(),
            exact_match_tolerance_s: DEFAULT_EXACT_MATCH_TOLERANCE_S,
            targets: None,
        }
    }
}

/// Builder for [`StudyParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct StudyParamsBuilder {
    params: StudyParams,
}

impl StudyParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: StudyParams::default(),
        }
    }

    pub fn mode(mut self, v: AnalysisMode) -> Self {
        self.params.mode = v;
        self
    }
    pub fn cutoff_days(mut self, v: f64) -> Self {
        self.params.cutoff_days = v;
        self
    }
    pub fn horizons(mut self, v: impl IntoIterator<Item = Horizon>) -> Self {
        self.params.horizons = v.into_iter().collect();
        self
    }
    pub fn end(mut self, v: StudyEnd) -> Self {
        self.params.end = v;
        self
    }
    pub fn join(mut self, v: PropagationJoin) -> Self {
        self.params.join = v;
        self
    }
    pub fn exact_match_tolerance_s(mut self, v: f64) -> Self {
        self.params.exact_match_tolerance_s = v;
        self
    }
    pub fn targets(mut self, v: impl IntoIterator<Item = TargetId>) -> Self {
        self.params.targets = Some(v.into_iter().collect());
        self
    }
    pub fn all_targets(mut self) -> Self {
        self.params.targets = None;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Validate and produce the [`StudyParams`].
    ///
    /// Validation rules
    /// -----------------
    /// * `cutoff_days > 0` and finite.
    /// * `exact_match_tolerance_s >= 0` and finite.
    /// * `horizons` non-empty, without duplicates.
    /// * `targets`, when set, without duplicates (an empty list is allowed and yields
    ///   all-NaN series).
    ///
    /// Return
    /// ----------
    /// * `Ok(StudyParams)`, or [`CovdayError::InvalidStudyParameter`] naming the failed rule.
    pub fn build(self) -> Result<StudyParams, CovdayError> {
        let p = &self.params;

        if !Self::gt0(p.cutoff_days) || !p.cutoff_days.is_finite() {
            return Err(CovdayError::InvalidStudyParameter(
                "cutoff_days must be a finite value > 0".into(),
            ));
        }
        if !Self::ge0(p.exact_match_tolerance_s) || !p.exact_match_tolerance_s.is_finite() {
            return Err(CovdayError::InvalidStudyParameter(
                "exact_match_tolerance_s must be a finite value >= 0".into(),
            ));
        }
        if p.horizons.is_empty() {
            return Err(CovdayError::InvalidStudyParameter(
                "horizons must not be empty".into(),
            ));
        }
        if !p.horizons.iter().all_unique() {
            return Err(CovdayError::InvalidStudyParameter(
                "horizons must not contain duplicates".into(),
            ));
        }
        if let Some(targets) = &p.targets {
            if !targets.iter().all_unique() {
                return Err(CovdayError::InvalidStudyParameter(
                    "targets must not contain duplicates".into(),
                ));
            }
        }

        Ok(self.params)
    }
}

impl fmt::Display for StudyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let horizons = self.horizons.iter().map(|h| h.days()).join(",");
        let targets = match &self.targets {
            Some(t) => t.len().to_string(),
            None => "all".to_string(),
        };
        let end = match self.end {
            StudyEnd::Exclusive => "exclusive",
            StudyEnd::Inclusive => "inclusive",
        };

        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Study Parameters")?;
            writeln!(f, "----------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!("mode                    = {}", self.mode, "Binning / lookup pair")?;
            line!(
                "cutoff_days             = {:.3} d",
                self.cutoff_days,
                "Max state age (reference mode)"
            )?;
            line!("horizons                = [{}] d", horizons, "Sampled horizons")?;
            line!("end                     = {}", end, "End date of the span")?;
            line!("join                    = {}", self.join, "Exact-offset join")?;
            line!(
                "exact_match_tolerance_s = {:.1e}",
                self.exact_match_tolerance_s,
                "Exact match tolerance"
            )?;
            line!("targets                 = {}", targets, "Relevant targets")?;
            Ok(())
        } else {
            write!(
                f,
                "StudyParams(mode={}, cutoff={:.2}d, horizons=[{}], end={}, join={}, tol={:.1e}s, targets={})",
                self.mode,
                self.cutoff_days,
                horizons,
                end,
                self.join,
                self.exact_match_tolerance_s,
                targets
            )
        }
    }
}

/// A configured study, runnable over any set of tables.
#[derive(Debug, Clone, Default)]
pub struct Study {
    params: StudyParams,
}

impl Study {
    pub fn new(params: StudyParams) -> Self {
        Study { params }
    }

    pub fn params(&self) -> &StudyParams {
        &self.params
    }

    /// Relevant targets: the configured list (checked against the targets table) or every
    /// target of the table.
    pub fn target_ids(&self, tables: &StudyTables) -> Result<Vec<TargetId>, CovdayError> {
        match &self.params.targets {
            None => Ok(tables.target_ids()),
            Some(ids) => {
                if let Some(&missing) = ids
                    .iter()
                    .find(|id| !tables.targets().iter().any(|t| t.id == **id))
                {
                    return Err(CovdayError::UnknownTarget(missing));
                }
                Ok(ids.clone())
            }
        }
    }

    /// Run every pass of the study.
    ///
    /// Arguments
    /// -----------------
    /// * `tables` – Source tables. Eigen-features are computed on a copy when missing.
    ///
    /// Return
    /// ----------
    /// * A [`StudyReport`] with `days × 3` values in every series.
    /// * The first error of any pass: unknown target, empty state table, unresolved join.
    pub fn run(&self, tables: &StudyTables) -> Result<StudyReport, CovdayError> {
        let params = &self.params;
        info!(params = %params, "starting study");

        let tables = if tables.has_eigen_features() {
            Cow::Borrowed(tables)
        } else {
            debug!(
                propagations = tables.propagations().len(),
                "computing eigen-features"
            );
            Cow::Owned(tables.clone().with_eigen_features())
        };

        let target_ids = self.target_ids(&tables)?;
        let days = build_day_sequence_with_end(tables.states(), params.end)?;
        info!(
            days = days.len(),
            targets = target_ids.len(),
            first = ?days.first().map(|d| d.date_string()),
            "day sequence built"
        );

        let binned = params
            .binning_strategy(&tables, &target_ids)
            .bin_days(&days, &tables)?;
        let lookup = params.lookup_strategy();
        let populated = populate_days(binned, &tables, &*lookup, &params.horizons)?;
        let percentiles = aggregate(&populated, &params.horizons);

        let report = StudyReport::new(&days, percentiles);
        info!(
            buckets = report.bucket_count(),
            horizons = report.horizons().len(),
            "study done"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod study_test {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = StudyParams::default();
        assert_eq!(p.mode, AnalysisMode::ReferenceClosest);
        assert_eq!(p.cutoff_days, 7.0);
        assert_eq!(p.horizons, Horizon::ALL.to_vec());
        assert_eq!(p.end, StudyEnd::Exclusive);
        assert_eq!(p.join, PropagationJoin::GlobalTimestamp);
        assert_eq!(p.exact_match_tolerance_s, 1e-3);
        assert!(p.targets.is_none());
        assert_eq!(StudyParams::builder().build().unwrap(), p);
    }

    #[test]
    fn test_builder_validation() {
        let err = StudyParams::builder().cutoff_days(0.0).build().unwrap_err();
        assert!(matches!(err, CovdayError::InvalidStudyParameter(_)));
        assert!(StudyParams::builder().cutoff_days(f64::NAN).build().is_err());
        assert!(StudyParams::builder()
            .exact_match_tolerance_s(-1.0)
            .build()
            .is_err());
        assert!(StudyParams::builder().horizons([]).build().is_err());
        assert!(StudyParams::builder()
            .horizons([Horizon::OneDay, Horizon::OneDay])
            .build()
            .is_err());
        assert!(StudyParams::builder().targets([1, 2, 1]).build().is_err());

        let p = StudyParams::builder()
            .mode(AnalysisMode::EpochExact)
            .exact_match_tolerance_s(0.0)
            .horizons([Horizon::ThreeDays, Horizon::OneDay])
            .targets([4, 2])
            .end(StudyEnd::Inclusive)
            .join(PropagationJoin::StateReference)
            .build()
            .unwrap();
        assert_eq!(p.horizons, vec![Horizon::ThreeDays, Horizon::OneDay]);
        assert_eq!(p.targets, Some(vec![4, 2]));
    }

    #[test]
    fn test_display() {
        let p = StudyParams::default();
        assert_eq!(
            p.to_string(),
            "StudyParams(mode=reference-closest, cutoff=7.00d, horizons=[1,2,3], end=exclusive, join=global-timestamp, tol=1.0e-3s, targets=all)"
        );
        let pretty = format!("{p:#}");
        assert!(pretty.starts_with("Study Parameters\n"));
        assert!(pretty.contains("cutoff_days             = 7.000 d"));
    }

    #[test]
    fn test_unknown_target() {
        let tables = StudyTables::default();
        let study = Study::new(StudyParams::builder().targets([3]).build().unwrap());
        assert_eq!(
            study.target_ids(&tables).unwrap_err(),
            CovdayError::UnknownTarget(3)
        );
        assert_eq!(
            Study::default().run(&tables).unwrap_err(),
            CovdayError::EmptyStateTable
        );
    }
}
