// libs/booking-cell/src/services/schedule.rs
use chrono::{NaiveTime, Weekday};

use crate::models::AvailabilityWindow;

/// Weekday index convention used across the workspace: 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(weekday: Weekday) -> i16 {
    weekday.num_days_from_sunday() as i16
}

/// Does the time-of-day interval `[slot_start, slot_end)` on `weekday` fall
/// inside some active working window, clear of its lunch break?
///
/// Boundaries are half-open throughout: a slot may end exactly where the
/// window ends, end exactly where lunch starts, or start exactly where lunch
/// ends. Admission by any single window is enough.
pub fn is_within_schedule(
    windows: &[AvailabilityWindow],
    weekday: Weekday,
    slot_start: NaiveTime,
    slot_end: NaiveTime,
) -> bool {
    // A slot whose end wraps past midnight cannot fit a same-day window.
    if slot_end <= slot_start {
        return false;
    }

    let day = weekday_index(weekday);
    windows
        .iter()
        .filter(|window| window.active && window.day_of_week == day)
        .any(|window| window_admits(window, slot_start, slot_end))
}

fn window_admits(window: &AvailabilityWindow, slot_start: NaiveTime, slot_end: NaiveTime) -> bool {
    if slot_start < window.start_time || slot_end > window.end_time {
        return false;
    }

    match (window.lunch_start, window.lunch_end) {
        (Some(lunch_start), Some(lunch_end)) => {
            slot_end <= lunch_start || slot_start >= lunch_end
        }
        _ => true,
    }
}
