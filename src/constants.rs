//! # Constants and type definitions for covday
//!
//! This module centralizes the **time constants**, **window layout**, and **common type
//! definitions** shared by the calendar, binning, lookup and aggregation stages.
//!
//! ## Overview
//!
//! - Day / window / horizon layout of a study
//! - Default tuning values (cutoff horizon, exact-match tolerance)
//! - Identifier aliases for targets and states
//! - The fast hash map used by table indexes

use ahash::RandomState;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Time layout
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a civil day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of reference windows a calendar day is split into
pub const WINDOWS_PER_DAY: usize = 3;

/// Length of one window in hours
pub const WINDOW_HOURS: u8 = 8;

/// Number of propagation horizons (1, 2 and 3 days ahead)
pub const HORIZON_COUNT: usize = 3;

/// Number of percentile statistics emitted per bucket
pub const PERCENTILE_COUNT: usize = 5;

/// Number of feature channels (three eigenvalues and the RMS)
pub const CHANNEL_COUNT: usize = 4;

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Maximum age (days) of a state relative to a window reference instant
pub const DEFAULT_CUTOFF_DAYS: f64 = 7.0;

/// Tolerance (seconds) used when two timestamps must match exactly
pub const DEFAULT_EXACT_MATCH_TOLERANCE_S: f64 = 1e-3;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Identifier of a tracked object
pub type TargetId = u64;

/// Identifier of a state estimate
pub type StateId = u64;

/// Three covariance eigenvalues, sorted in descending order
pub type Eigenvalues = [f64; 3];

/// Hash map with the `ahash` hasher, used for table indexes.
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
