//! # covday
//!
//! Day-binned percentile summaries of orbital covariance propagations.
//!
//! Given the state estimates of a set of tracked targets and the forward-propagated
//! covariance snapshots of those states, `covday` splits the study span into calendar days,
//! each cut into three 8-hour windows, assigns states to windows, samples the propagated
//! uncertainty 1, 2 and 3 days ahead, and reduces every `(day, window)` bucket to its
//! 10/25/50/75/95 percentiles.
//!
//! ## Modules
//!
//! - [`calendar`] – leap years, day rollover, day sequence of a study.
//! - [`day`] – windows, horizons, channels and the per-day pass outputs.
//! - [`tables`] – in-memory targets / states / propagations, CSV ingestion.
//! - [`covariance`] – eigenvalues and RMS of the 3×3 covariance.
//! - [`binning`] – epoch-based and reference-based binning policies.
//! - [`propagation`] – exact-offset and closest-match propagation lookups.
//! - [`percentiles`] – percentile aggregation with NaN for empty buckets.
//! - [`report`] – labels, plot axes and tabular rendering of the series.
//! - [`study`] – parameters and the end-to-end run.
//!
//! ## Features
//!
//! - `progress` – progress bar over the propagation-lookup pass (`indicatif`).
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (run boundaries at `info`, per-pass counts at `debug`,
//! skipped targets and empty buckets at `trace`) and never installs a subscriber.
pub mod binning;
pub mod calendar;
pub mod constants;
pub mod covariance;
pub mod covday_errors;
pub mod day;
pub mod percentiles;
pub mod propagation;
pub mod report;
pub mod study;
pub mod tables;
pub mod time;

#[cfg(feature = "progress")]
mod progress_bar;

pub use crate::covday_errors::CovdayError;
pub use crate::day::{Channel, Horizon, Window};
pub use crate::percentiles::Percentile;
pub use crate::report::StudyReport;
pub use crate::study::{AnalysisMode, Study, StudyParams};
pub use crate::tables::StudyTables;
