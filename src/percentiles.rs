//! # Percentile aggregator
//!
//! Collapses the per-window feature values of a populated day sequence into percentile
//! series: for every horizon, every channel (`eig1`, `eig2`, `eig3`, `rms`) and every
//! percentile (10/25/50/75/95), one value per `(day, window)` bucket.
//!
//! ## Ordering
//! -----------------
//! Buckets are enumerated day-major then window-minor, so the value of day `d` and window
//! `w` sits at index `d * 3 + w` (see [`flat_index`](crate::day::flat_index)). Every series
//! of a study has length `days × 3`.
//!
//! ## Percentile definition
//! -----------------
//! Linear interpolation between order statistics: the `p`-th percentile of `n` sorted values
//! is read at the fractional rank `p / 100 × (n - 1)`. A single value is its own
//! percentile for every `p`.
//!
//! ## Empty buckets
//! -----------------
//! A bucket without any contributing state yields `NaN` for all five percentiles. This is an
//! expected outcome (windows before the first state, targets with stale states), not an
//! error. A bucket holding a `NaN` value, whatever its sign, is reported the same way.
use std::fmt;

use itertools::iproduct;
use tracing::{debug, trace};

use crate::{
    constants::{CHANNEL_COUNT, PERCENTILE_COUNT},
    day::{Channel, Horizon, PopulatedDay, Window},
};

/// One of the five reported percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Percentile {
    P10,
    P25,
    P50,
    P75,
    P95,
}

impl Percentile {
    pub const ALL: [Percentile; PERCENTILE_COUNT] = [
        Percentile::P10,
        Percentile::P25,
        Percentile::P50,
        Percentile::P75,
        Percentile::P95,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Percentile rank in `[0, 100]`.
    pub fn rank(self) -> f64 {
        match self {
            Percentile::P10 => 10.0,
            Percentile::P25 => 25.0,
            Percentile::P50 => 50.0,
            Percentile::P75 => 75.0,
            Percentile::P95 => 95.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Percentile::P10 => "p10",
            Percentile::P25 => "p25",
            Percentile::P50 => "p50",
            Percentile::P75 => "p75",
            Percentile::P95 => "p95",
        }
    }
}

/// `p`-th percentile (`p` in `[0, 100]`) of values sorted ascending, linear interpolation.
///
/// Returns `NaN` on an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// The five percentiles of one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileSummary {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl PercentileSummary {
    /// All five percentiles set to `NaN` (empty bucket).
    pub const EMPTY: PercentileSummary = PercentileSummary {
        p10: f64::NAN,
        p25: f64::NAN,
        p50: f64::NAN,
        p75: f64::NAN,
        p95: f64::NAN,
    };

    /// Summarize unsorted values. [`PercentileSummary::EMPTY`] when `values` is empty
    /// or holds a `NaN` of either sign.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        if values.iter().any(|v| v.is_nan()) {
            trace!(n = values.len(), "NaN in bucket, all percentiles set to NaN");
            return Self::EMPTY;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        PercentileSummary {
            p10: percentile(&sorted, Percentile::P10.rank()),
            p25: percentile(&sorted, Percentile::P25.rank()),
            p50: percentile(&sorted, Percentile::P50.rank()),
            p75: percentile(&sorted, Percentile::P75.rank()),
            p95: percentile(&sorted, Percentile::P95.rank()),
        }
    }

    pub fn get(&self, p: Percentile) -> f64 {
        match p {
            Percentile::P10 => self.p10,
            Percentile::P25 => self.p25,
            Percentile::P50 => self.p50,
            Percentile::P75 => self.p75,
            Percentile::P95 => self.p95,
        }
    }

    pub fn is_empty(&self) -> bool {
        Percentile::ALL.iter().all(|p| self.get(*p).is_nan())
    }
}

impl fmt::Display for PercentileSummary {
    /// Compact by default; multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Percentile summary")?;
            writeln!(f, "------------------")?;
            writeln!(f, "p10 : {}", self.p10)?;
            writeln!(f, "p25 : {}", self.p25)?;
            writeln!(f, "p50 : {}", self.p50)?;
            writeln!(f, "p75 : {}", self.p75)?;
            write!(f, "p95 : {}", self.p95)
        } else {
            write!(
                f,
                "p10={}, p25={}, p50={}, p75={}, p95={}",
                self.p10, self.p25, self.p50, self.p75, self.p95
            )
        }
    }
}

/// Percentile series of one channel: one flat series per percentile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSeries {
    series: [Vec<f64>; PERCENTILE_COUNT],
}

impl ChannelSeries {
    fn with_capacity(buckets: usize) -> Self {
        ChannelSeries {
            series: std::array::from_fn(|_| Vec::with_capacity(buckets)),
        }
    }

    fn push(&mut self, summary: PercentileSummary) {
        for p in Percentile::ALL {
            self.series[p.index()].push(summary.get(p));
        }
    }

    /// Flat series of one percentile, indexed by `day_index * 3 + window_index`.
    pub fn series(&self, p: Percentile) -> &[f64] {
        &self.series[p.index()]
    }

    /// Summary of a single bucket.
    pub fn bucket(&self, flat_index: usize) -> Option<PercentileSummary> {
        let at = |p: Percentile| self.series[p.index()].get(flat_index).copied();
        Some(PercentileSummary {
            p10: at(Percentile::P10)?,
            p25: at(Percentile::P25)?,
            p50: at(Percentile::P50)?,
            p75: at(Percentile::P75)?,
            p95: at(Percentile::P95)?,
        })
    }

    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All percentile series of one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonPercentiles {
    horizon: Horizon,
    channels: [ChannelSeries; CHANNEL_COUNT],
    empty_buckets: usize,
}

impl HorizonPercentiles {
    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn channel(&self, channel: Channel) -> &ChannelSeries {
        &self.channels[channel as usize]
    }

    /// Flat series of one `(channel, percentile)` pair.
    pub fn series(&self, channel: Channel, p: Percentile) -> &[f64] {
        self.channel(channel).series(p)
    }

    /// Number of `(day, window)` buckets, i.e. the length of every series.
    pub fn bucket_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Buckets without any contributing state (all-NaN).
    pub fn empty_buckets(&self) -> usize {
        self.empty_buckets
    }

    /// The twenty series, channel-major then percentile-minor:
    /// `eig1 p10, eig1 p25, ..., eig1 p95, eig2 p10, ..., rms p95`.
    pub fn sequences(&self) -> Vec<&[f64]> {
        iproduct!(Channel::ALL, Percentile::ALL)
            .map(|(c, p)| self.series(c, p))
            .collect()
    }

    /// Owned variant of [`HorizonPercentiles::sequences`].
    pub fn into_sequences(self) -> Vec<Vec<f64>> {
        self.channels
            .into_iter()
            .flat_map(|c| c.series.into_iter())
            .collect()
    }
}

/// Aggregate one horizon over a populated day sequence.
pub fn aggregate_horizon(days: &[PopulatedDay], horizon: Horizon) -> HorizonPercentiles {
    let buckets = days.len() * Window::ALL.len();
    let mut channels: [ChannelSeries; CHANNEL_COUNT] =
        std::array::from_fn(|_| ChannelSeries::with_capacity(buckets));
    let mut empty_buckets = 0;

    for (day, window) in iproduct!(days, Window::ALL) {
        if day.samples(horizon, window).is_empty() {
            trace!(date = %day.day.date(), ?window, ?horizon, "empty bucket");
            empty_buckets += 1;
        }
        for channel in Channel::ALL {
            let values = day.channel_values(horizon, channel, window);
            channels[channel as usize].push(PercentileSummary::from_values(&values));
        }
    }

    HorizonPercentiles {
        horizon,
        channels,
        empty_buckets,
    }
}

/// Aggregate every requested horizon, in the given order.
pub fn aggregate(days: &[PopulatedDay], horizons: &[Horizon]) -> Vec<HorizonPercentiles> {
    let result: Vec<HorizonPercentiles> = horizons
        .iter()
        .map(|&h| aggregate_horizon(days, h))
        .collect();
    debug!(
        horizons = result.len(),
        buckets = days.len() * Window::ALL.len(),
        empty = result.iter().map(|h| h.empty_buckets).sum::<usize>(),
        "percentile aggregation done"
    );
    result
}
