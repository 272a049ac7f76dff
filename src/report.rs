//! # Study report
//!
//! Final, read-only output of a study run: the date labels of the day sequence and the
//! percentile series of every aggregated horizon, ready to be plotted or exported.
//!
//! ## Overview
//!
//! - [`xtick_labels`] – one `YYYY-MM-DD` label per study day (major ticks of a plot).
//! - [`plot_axes`] – bucket positions `0..n` and tick positions `0..=n` for a series of
//!   length `n`.
//! - [`StudyReport`] – labels plus one [`HorizonPercentiles`] per horizon, with the flat
//!   twenty-sequence export (`eig1 p10..p95, eig2 .., eig3 .., rms ..`).
//! - [`ChannelTable`] – display adaptor rendering one `(horizon, channel)` pair as a
//!   [`comfy-table`] table, one row per `(day, window)` bucket.
//!
//! ## Quick example
//!
//! ```rust,ignore
//! let report = Study::new(params).run(&tables)?;
//! println!("{}", report.table(Horizon::OneDay, Channel::Rms).unwrap().with_precision(3));
//! ```
//!
//! [`comfy-table`]: https://crates.io/crates/comfy-table
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::{
    constants::WINDOWS_PER_DAY,
    day::{Channel, Day, Horizon, Window},
    percentiles::{HorizonPercentiles, Percentile},
};

/// `YYYY-MM-DD` label of every day, in sequence order.
pub fn xtick_labels(days: &[Day]) -> Vec<String> {
    days.iter().map(Day::date_string).collect()
}

/// Plot positions of a percentile series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotAxes {
    /// Bucket positions, `0..n`.
    pub xs: Vec<usize>,
    /// Tick positions, `0..=n`.
    pub ticks: Vec<usize>,
}

/// Axes for a series of `n` buckets.
pub fn plot_axes(n: usize) -> PlotAxes {
    PlotAxes {
        xs: (0..n).collect(),
        ticks: (0..=n).collect(),
    }
}

/// Labels and percentile series of a completed study.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyReport {
    labels: Vec<String>,
    horizons: Vec<HorizonPercentiles>,
}

impl StudyReport {
    pub fn new(days: &[Day], horizons: Vec<HorizonPercentiles>) -> Self {
        StudyReport {
            labels: xtick_labels(days),
            horizons,
        }
    }

    /// Date labels, one per day.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn day_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of `(day, window)` buckets, the length of every series.
    pub fn bucket_count(&self) -> usize {
        self.labels.len() * WINDOWS_PER_DAY
    }

    /// Aggregated horizons, in the order they were requested.
    pub fn horizons(&self) -> &[HorizonPercentiles] {
        &self.horizons
    }

    pub fn horizon(&self, horizon: Horizon) -> Option<&HorizonPercentiles> {
        self.horizons.iter().find(|h| h.horizon() == horizon)
    }

    /// The twenty series of a horizon, channel-major then percentile-minor.
    pub fn sequences(&self, horizon: Horizon) -> Option<Vec<&[f64]>> {
        self.horizon(horizon).map(HorizonPercentiles::sequences)
    }

    /// Axes matching the series of this report.
    pub fn plot_axes(&self) -> PlotAxes {
        plot_axes(self.bucket_count())
    }

    /// Label of a flat bucket index: `"YYYY-MM-DD HH:00"` with the window start hour.
    pub fn bucket_label(&self, flat_index: usize) -> Option<String> {
        let date = self.labels.get(flat_index / WINDOWS_PER_DAY)?;
        let window = Window::ALL[flat_index % WINDOWS_PER_DAY];
        Some(format!("{date} {:02}:00", window.start_hour()))
    }

    /// Table view of one `(horizon, channel)` pair, `None` if the horizon was not aggregated.
    pub fn table(&self, horizon: Horizon, channel: Channel) -> Option<ChannelTable<'_>> {
        Some(ChannelTable {
            report: self,
            percentiles: self.horizon(horizon)?,
            channel,
            precision: 6,
        })
    }
}

/// Display adaptor for one `(horizon, channel)` pair of a [`StudyReport`].
///
/// Borrows the report; empty buckets render as `NaN`.
pub struct ChannelTable<'a> {
    report: &'a StudyReport,
    percentiles: &'a HorizonPercentiles,
    channel: Channel,
    precision: usize,
}

impl ChannelTable<'_> {
    /// Number of fractional digits of the percentile columns (default 6).
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn render(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let mut header = vec![Cell::new("#"), Cell::new("Date"), Cell::new("Window")];
        header.extend(
            Percentile::ALL
                .iter()
                .map(|p| Cell::new(format!("{} {}", self.channel.label(), p.label()))),
        );
        table.set_header(header);

        let series = self.percentiles.channel(self.channel);
        for i in 0..series.len() {
            let Some(summary) = series.bucket(i) else {
                continue;
            };
            let date = self
                .report
                .labels
                .get(i / WINDOWS_PER_DAY)
                .map(String::as_str)
                .unwrap_or("");
            let window = Window::ALL[i % WINDOWS_PER_DAY];

            let mut row = vec![
                Cell::new(i).set_alignment(CellAlignment::Right),
                Cell::new(date),
                Cell::new(format!("{:02}:00", window.start_hour())),
            ];
            row.extend(Percentile::ALL.iter().map(|p| {
                Cell::new(format!("{:.*}", self.precision, summary.get(*p)))
                    .set_alignment(CellAlignment::Right)
            }));
            table.add_row(Row::from(row));
        }
        table
    }
}

impl fmt::Display for ChannelTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} | horizon {} day(s)",
            self.channel.label(),
            self.percentiles.horizon().days()
        )?;
        write!(f, "{}", self.render())
    }
}
