//! Progress UI for the propagation-lookup pass (feature `progress`).
//!
//! The lookup pass scans the propagation table once per binned state and horizon, which is
//! the slow part of a study run. With the `progress` feature enabled,
//! [`populate_days`](crate::propagation::populate_days) advances a bar by one step per
//! study day and shows the date being processed.
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Bar over `total` study days.
pub(crate) fn day_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new((total as u64).max(1));
    let style = ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} days ({percent:>3}%) | ETA {eta_precise} | {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}
