//! Year-over-year alignment by nearest day of year.

use crate::model::{AlignedPair, SceneStat};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

const DAYS_IN_CYCLE: u32 = 365;
const MONTH_STARTS: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Position of a date on a 365-day month/day cycle, ignoring the year.
/// Feb 29 lands on the same day as Mar 1.
pub fn cycle_day(date: NaiveDate) -> u32 {
    MONTH_STARTS[date.month0() as usize] + date.day()
}

/// Shortest distance between two dates on the month/day cycle, so that
/// Dec 30 and Jan 2 are 3 days apart.
pub fn day_offset(a: NaiveDate, b: NaiveDate) -> u32 {
    let diff = cycle_day(a).abs_diff(cycle_day(b)) % DAYS_IN_CYCLE;
    diff.min(DAYS_IN_CYCLE - diff)
}

/// Nearest reference scene within `tolerance_days`; ties go to the earliest date.
pub fn nearest_reference<'a>(
    date: NaiveDate,
    reference: &'a [SceneStat],
    tolerance_days: u32,
) -> Option<(&'a SceneStat, u32)> {
    let mut best: Option<(&SceneStat, u32)> = None;
    for candidate in reference {
        let offset = day_offset(date, candidate.sensing_date);
        if offset > tolerance_days {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, best_offset)) => {
                offset < best_offset
                    || (offset == best_offset && candidate.sensing_date < current.sensing_date)
            }
        };
        if better {
            best = Some((candidate, offset));
        }
    }
    best
}

/// Pairs every current-period scene with its nearest reference scene.
///
/// The output has one entry per current scene, in input order. A reference
/// scene may be matched by more than one current scene.
pub fn align(current: &[SceneStat], reference: &[SceneStat], tolerance_days: u32) -> Vec<AlignedPair> {
    let pairs: Vec<AlignedPair> = current
        .iter()
        .map(|scene| match nearest_reference(scene.sensing_date, reference, tolerance_days) {
            Some((matched, offset)) => AlignedPair {
                current: scene.clone(),
                reference: Some(matched.clone()),
                day_offset: Some(offset),
            },
            None => AlignedPair {
                current: scene.clone(),
                reference: None,
                day_offset: None,
            },
        })
        .collect();

    let unmatched = pairs.iter().filter(|p| p.reference.is_none()).count();
    if unmatched > 0 {
        debug!(
            "{} of {} scenes have no reference within {} days",
            unmatched,
            pairs.len(),
            tolerance_days
        );
    }
    pairs
}
