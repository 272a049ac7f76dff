//! # Calendar engine
//!
//! Gregorian calendar arithmetic used to lay out a study as a sequence of civil days.
//!
//! ## Overview
//! -----------------
//! * [`is_leap_year`] / [`days_in_month`] – proleptic Gregorian rules.
//! * [`next_day`] and [`CalendarDate::next`] – day-after arithmetic with month and year rollover.
//! * [`build_day_sequence`] – one [`Day`] per civil date from the earliest to the latest
//!   state epoch of a table.
//!
//! ## Day-sequence termination
//! -----------------
//! The walk from the start date stops when the **full date** (year, month, day) equals the
//! end date. Matching on the day-of-month alone would stop early on multi-month studies
//! whenever the end day-of-month recurs before the end month. By default the end date itself
//! is **excluded** ([`StudyEnd::Exclusive`]); use [`StudyEnd::Inclusive`] to keep it.
//!
//! ## See also
//! ------------
//! * [`crate::day::Day`] – Per-day partition built from each date.
//! * [`crate::tables::StudyTables::study_span`] – Start / end dates of a table.
use std::fmt;

use hifitime::Epoch;

use crate::{covday_errors::CovdayError, day::Day, tables::StateRecord, time::gregorian_fields};

/// Gregorian leap-year rule: divisible by 4, except centuries not divisible by 400.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-based) of `year`.
///
/// Returns `None` when `month` is outside `1..=12`.
pub fn days_in_month(year: i32, month: u8) -> Option<u8> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if is_leap_year(year) => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Return the calendar date following `(year, month, day)`.
///
/// Rolls over month lengths (28/29/30/31) and the year boundary on December 31.
///
/// Return
/// ----------
/// * `Ok((year, month, day))` of the next date.
/// * [`CovdayError::InvalidDate`] if the input is not a valid Gregorian date.
pub fn next_day(year: i32, month: u8, day: u8) -> Result<(i32, u8, u8), CovdayError> {
    let next = CalendarDate::new(year, month, day)?.next();
    Ok((next.year, next.month, next.day))
}

/// A validated civil date (proleptic Gregorian, UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    /// Build a date, checking the month range and the month length.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, CovdayError> {
        match days_in_month(year, month) {
            Some(len) if (1..=len).contains(&day) => Ok(CalendarDate { year, month, day }),
            _ => Err(CovdayError::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02}"
            ))),
        }
    }

    /// Date part of an epoch (UTC), time-of-day discarded.
    pub fn from_epoch(epoch: Epoch) -> Self {
        let (year, month, day, ..) = gregorian_fields(epoch);
        CalendarDate { year, month, day }
    }

    /// The following civil date.
    pub fn next(&self) -> Self {
        // `self` is validated at construction, the month length is always known.
        let len = days_in_month(self.year, self.month).unwrap_or(31);
        if self.day < len {
            CalendarDate {
                day: self.day + 1,
                ..*self
            }
        } else if self.month < 12 {
            CalendarDate {
                year: self.year,
                month: self.month + 1,
                day: 1,
            }
        } else {
            CalendarDate {
                year: self.year + 1,
                month: 1,
                day: 1,
            }
        }
    }

    /// Epoch (UTC) of this date at `hour:00:00`.
    pub fn at_hour(&self, hour: u8) -> Epoch {
        Epoch::from_gregorian_utc_hms(self.year, self.month, self.day, hour, 0, 0)
    }
}

impl fmt::Display for CalendarDate {
    /// Zero-padded `YYYY-MM-DD`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Whether the last date of a study span is part of the day sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyEnd {
    /// Stop before the end date (the end date gets no [`Day`]).
    #[default]
    Exclusive,
    /// Emit a [`Day`] for the end date as well.
    Inclusive,
}

/// Build the ordered day sequence of a study from its states, end date excluded.
///
/// Equivalent to [`build_day_sequence_with_end`] with [`StudyEnd::Exclusive`].
pub fn build_day_sequence(states: &[StateRecord]) -> Result<Vec<Day>, CovdayError> {
    build_day_sequence_with_end(states, StudyEnd::Exclusive)
}

/// Build the ordered day sequence of a study from its states.
///
/// The start date is the date of the earliest state epoch, the end date the date of the
/// latest one (time-of-day ignored). The walk applies [`CalendarDate::next`] from the start
/// and stops on full-date equality with the end date.
///
/// Arguments
/// -----------------
/// * `states` – State records of the study, in any order.
/// * `end` – Whether the end date itself produces a [`Day`].
///
/// Return
/// ----------
/// * Days in strictly increasing calendar order, without gaps or duplicates.
/// * [`CovdayError::EmptyStateTable`] if `states` is empty.
pub fn build_day_sequence_with_end(
    states: &[StateRecord],
    end: StudyEnd,
) -> Result<Vec<Day>, CovdayError> {
    let (start, last) = span_of(states)?;
    Ok(walk_days(start, last, end))
}

pub(crate) fn span_of(states: &[StateRecord]) -> Result<(CalendarDate, CalendarDate), CovdayError> {
    let mut epochs = states.iter().map(|s| s.epoch);
    let seed = epochs.next().ok_or(CovdayError::EmptyStateTable)?;
    let (first, last) = epochs.fold((seed, seed), |(lo, hi), e| {
        (if e < lo { e } else { lo }, if e > hi { e } else { hi })
    });
    Ok((CalendarDate::from_epoch(first), CalendarDate::from_epoch(last)))
}

pub(crate) fn walk_days(start: CalendarDate, last: CalendarDate, end: StudyEnd) -> Vec<Day> {
    let mut days = Vec::new();
    let mut date = start;
    while date != last {
        days.push(Day::new(date));
        date = date.next();
    }
    if end == StudyEnd::Inclusive {
        days.push(Day::new(last));
    }
    days
}
