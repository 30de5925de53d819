use hifitime::{Duration, Epoch, TimeScale};

use crate::constants::{HALF_DAY, MIN_REFERENCE_WEEK, SECONDS_PER_DAY, WEEK_ROLLOVER};

/// Current GPS week, never earlier than week 1560 (2009-12-01)
pub fn current_week() -> u32 {
    Epoch::now()
        .map(|now| now.to_time_scale(TimeScale::GPST).to_time_of_week().0)
        .unwrap_or(MIN_REFERENCE_WEEK)
        .max(MIN_REFERENCE_WEEK)
}

/// Resolves a truncated GPS week against a reference week.
///
/// The result is congruent to `week` modulo 1024 and is the rollover closest to
/// `reference`, at most 512 weeks away from it. Applying it twice yields the
/// same week.
pub fn adjust_week(week: u16, reference: u32) -> u32 {
    let week = week as i64;
    let reference = reference as i64;
    let rollovers = (reference - week + WEEK_ROLLOVER / 2).div_euclid(WEEK_ROLLOVER);
    let adjusted = week + rollovers * WEEK_ROLLOVER;
    match adjusted {
        a if a < 0 => a.rem_euclid(WEEK_ROLLOVER) as u32,
        a if a > u32::MAX as i64 => (a - WEEK_ROLLOVER) as u32,
        a => a as u32,
    }
}

/// GPS time from a week number and seconds into that week, `None` unless `tow` is finite
pub fn gpst(week: u32, tow: f64) -> Option<Epoch> {
    tow.is_finite()
        .then(|| Epoch::from_time_of_week(week, 0, TimeScale::GPST) + Duration::from_seconds(tow))
}

/// GPS week and seconds of week of an epoch
pub fn to_gpst(epoch: Epoch) -> (u32, f64) {
    let (week, nanos) = epoch.to_time_scale(TimeScale::GPST).to_time_of_week();
    (week, nanos as f64 * 1e-9)
}

/// Places a UTC time of day on the day of `reference` closest to it.
///
/// The time of day is moved to the previous or next day when it is more than
/// half a day away from the time of day of `reference`. The result is expressed
/// in GPS time, `None` unless `tod` is finite.
pub fn adjust_day(reference: Epoch, tod: f64) -> Option<Epoch> {
    if !tod.is_finite() {
        return None;
    }
    let (year, month, day, hh, mm, ss, nanos) = reference.to_gregorian_utc();
    let tod_ref = hh as f64 * 3600.0 + mm as f64 * 60.0 + ss as f64 + nanos as f64 * 1e-9;
    let tod = if tod < tod_ref - HALF_DAY {
        tod + SECONDS_PER_DAY
    } else if tod > tod_ref + HALF_DAY {
        tod - SECONDS_PER_DAY
    } else {
        tod
    };
    let midnight = Epoch::from_gregorian_utc_at_midnight(year, month, day);
    Some((midnight + Duration::from_seconds(tod)).to_time_scale(TimeScale::GPST))
}

/// Signed difference `a - b` in seconds
pub fn seconds_between(a: Epoch, b: Epoch) -> f64 {
    (a - b).to_seconds()
}
