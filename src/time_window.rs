use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};

use crate::config::ReplanConfig;

/// The working-window boundaries for one calendar date, in UTC, per the
/// configured fixed offset. Weekday exceptions (holidays) are not computed
/// here; those are expected to be surfaced by the availability data
/// source instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Build the working window for `date` under `config`'s time zone and
/// working hours. Returns `None` if `date` is a non-working day (weekend).
pub fn working_window_for(config: &ReplanConfig, date: NaiveDate) -> Option<WorkingWindow> {
    if !is_working_day(date) {
        return None;
    }
    let tz: FixedOffset = config.time_zone();
    let start = tz
        .from_local_datetime(&date.and_time(config.working_window_start.0))
        .single()?
        .with_timezone(&Utc);
    let end = tz
        .from_local_datetime(&date.and_time(config.working_window_end.0))
        .single()?
        .with_timezone(&Utc);
    Some(WorkingWindow { start, end })
}

/// Clamp `now` into today's working window, or report that the technician
/// is effectively unavailable (non-working day, or the result would be the
/// window's own end).
pub fn clamp_to_window(now: DateTime<Utc>, window: WorkingWindow) -> DateTime<Utc> {
    if now < window.start {
        window.start
    } else if now > window.end {
        window.end
    } else {
        now
    }
}
