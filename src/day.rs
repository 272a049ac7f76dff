//! # Day model
//!
//! Per-day partition of a study and the structures produced by the successive passes of a
//! run. A run never mutates a shared aggregate: every pass consumes the output of the
//! previous one and returns a new, more populated structure.
//!
//! ```text
//! Day ──(binning)──▶ BinnedDay ──(propagation lookup)──▶ PopulatedDay ──(aggregation)──▶ percentiles
//! ```
//!
//! ## Windows, horizons, channels
//! -----------------
//! * [`Window`] – one of the three 8-hour slices of a day. Its reference instant ("now") is
//!   the window start: 00:00, 08:00 or 16:00 UTC.
//! * [`Horizon`] – forward offset at which uncertainty is sampled (1, 2 or 3 days).
//! * [`Channel`] – feature extracted from a propagation: the three covariance eigenvalues
//!   (descending) and the RMS of the covariance diagonal.
//!
//! ## Flat ordering
//! -----------------
//! Series produced from a day sequence are day-major, window-minor: the bucket of day `d`
//! and window `w` sits at [`flat_index`]`(d, w) = d * 3 + w`.
use hifitime::{Duration, Epoch};

use crate::{
    calendar::CalendarDate,
    constants::{StateId, HORIZON_COUNT, WINDOWS_PER_DAY, WINDOW_HOURS},
    time::days,
};

/// Index of the `(day_index, window)` bucket in a flat day-major series.
pub fn flat_index(day_index: usize, window: Window) -> usize {
    day_index * WINDOWS_PER_DAY + window.index()
}

/// One of the three 8-hour windows of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {
    /// 00:00 – 08:00
    Early,
    /// 08:00 – 16:00
    Mid,
    /// 16:00 – 24:00
    Late,
}

impl Window {
    pub const ALL: [Window; WINDOWS_PER_DAY] = [Window::Early, Window::Mid, Window::Late];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Hour (UTC) at which the window starts, also its reference instant.
    pub fn start_hour(self) -> u8 {
        self.index() as u8 * WINDOW_HOURS
    }

    /// Window of a state created at `hour` (epoch-based binning).
    ///
    /// The boundaries are inclusive on the integer hour: `hour <= 8` is [`Window::Early`],
    /// `8 < hour <= 16` is [`Window::Mid`], anything later is [`Window::Late`].
    pub fn from_hour(hour: u8) -> Window {
        if hour <= WINDOW_HOURS {
            Window::Early
        } else if hour <= 2 * WINDOW_HOURS {
            Window::Mid
        } else {
            Window::Late
        }
    }
}

/// Forward propagation horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Horizon {
    OneDay,
    TwoDays,
    ThreeDays,
}

impl Horizon {
    pub const ALL: [Horizon; HORIZON_COUNT] =
        [Horizon::OneDay, Horizon::TwoDays, Horizon::ThreeDays];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Number of days ahead.
    pub fn days(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Horizon as a duration (`days × 86400 s`).
    pub fn offset(self) -> Duration {
        days(f64::from(self.days()))
    }
}

/// Feature channel extracted from a propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Eig1,
    Eig2,
    Eig3,
    Rms,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Eig1, Channel::Eig2, Channel::Eig3, Channel::Rms];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Eig1 => "eig1",
            Channel::Eig2 => "eig2",
            Channel::Eig3 => "eig3",
            Channel::Rms => "rms",
        }
    }
}

/// Features of one selected propagation record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationFeatures {
    /// Covariance eigenvalues, descending.
    pub eigenvalues: [f64; 3],
    /// `sqrt(xx + yy + zz)` of the covariance diagonal.
    pub rms: f64,
}

impl PropagationFeatures {
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Eig1 => self.eigenvalues[0],
            Channel::Eig2 => self.eigenvalues[1],
            Channel::Eig3 => self.eigenvalues[2],
            Channel::Rms => self.rms,
        }
    }
}

/// One calendar day of a study and its three window reference instants.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    date: CalendarDate,
    now: [Epoch; WINDOWS_PER_DAY],
}

impl Day {
    pub fn new(date: CalendarDate) -> Self {
        let now = Window::ALL.map(|w| date.at_hour(w.start_hour()));
        Day { date, now }
    }

    pub fn date(&self) -> CalendarDate {
        self.date
    }

    /// Reference instant ("now") of a window: midnight, 08:00 or 16:00.
    pub fn reference_instant(&self, window: Window) -> Epoch {
        self.now[window.index()]
    }

    /// `[year, month, day]`
    pub fn date_list(&self) -> [i32; 3] {
        [
            self.date.year,
            i32::from(self.date.month),
            i32::from(self.date.day),
        ]
    }

    /// Zero-padded `YYYY-MM-DD` label.
    pub fn date_string(&self) -> String {
        self.date.to_string()
    }
}

/// State ids assigned to a day by a binning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBins {
    /// Every state created on this day (epoch-based binning only, not read by aggregation).
    pub states_bin: Vec<StateId>,
    /// State ids per window, in assignment order.
    pub windows: [Vec<StateId>; WINDOWS_PER_DAY],
}

impl DayBins {
    pub fn window(&self, window: Window) -> &[StateId] {
        &self.windows[window.index()]
    }

    pub fn total(&self) -> usize {
        self.windows.iter().map(Vec::len).sum()
    }
}

/// A day after the binning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedDay {
    pub day: Day,
    pub bins: DayBins,
}

/// One contribution to a window bucket: the state and the features of its selected
/// propagation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSample {
    pub state_id: StateId,
    pub features: PropagationFeatures,
}

/// Samples of one day, indexed by horizon then window.
pub type HorizonSamples = [[Vec<WindowSample>; WINDOWS_PER_DAY]; HORIZON_COUNT];

/// A day after the propagation-lookup pass. Read-only from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedDay {
    pub day: Day,
    pub bins: DayBins,
    samples: HorizonSamples,
}

impl PopulatedDay {
    pub fn new(binned: BinnedDay, samples: HorizonSamples) -> Self {
        PopulatedDay {
            day: binned.day,
            bins: binned.bins,
            samples,
        }
    }

    /// Samples of a `(horizon, window)` bucket, in contribution order.
    pub fn samples(&self, horizon: Horizon, window: Window) -> &[WindowSample] {
        &self.samples[horizon.index()][window.index()]
    }

    /// Values of one channel for a `(horizon, window)` bucket, parallel to [`Self::samples`].
    pub fn channel_values(&self, horizon: Horizon, channel: Channel, window: Window) -> Vec<f64> {
        self.samples(horizon, window)
            .iter()
            .map(|s| s.features.channel(channel))
            .collect()
    }
}
