//! Pre-flight checks that run before any provider call.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use respondo_core::WorkingHours;
use tracing::warn;

/// Whether `now` falls inside the agent's configured attendance window.
///
/// Disabled working hours always pass. The window for each day is
/// half-open: a message at exactly the end time is out of hours. A day
/// with no configured window means the agent does not attend that day.
pub fn within_working_hours(hours: &WorkingHours, now: DateTime<Utc>) -> bool {
    if !hours.enabled {
        return true;
    }

    let tz: Tz = match hours.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone = %hours.timezone, "invalid timezone in working hours, skipping check");
            return true;
        }
    };

    let local = now.with_timezone(&tz);
    let weekday = local.format("%A").to_string().to_lowercase();

    let Some(window) = hours.days.get(&weekday) else {
        return false;
    };

    // Zero-padded HH:MM strings compare correctly as text.
    let time = local.format("%H:%M").to_string();
    window.start <= time && time < window.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use respondo_core::DayWindow;
    use std::collections::HashMap;

    fn hours(enabled: bool, timezone: &str, days: &[(&str, &str, &str)]) -> WorkingHours {
        WorkingHours {
            enabled,
            timezone: timezone.to_string(),
            days: days
                .iter()
                .map(|(day, start, end)| {
                    (
                        day.to_string(),
                        DayWindow {
                            start: start.to_string(),
                            end: end.to_string(),
                        },
                    )
                })
                .collect::<HashMap<_, _>>(),
        }
    }

    // 2026-03-02 is a Monday.
    fn monday_utc(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn disabled_hours_always_pass() {
        let h = hours(false, "America/Sao_Paulo", &[]);
        assert!(within_working_hours(&h, monday_utc(3, 0)));
    }

    #[test]
    fn inside_window_passes() {
        let h = hours(true, "America/Sao_Paulo", &[("monday", "09:00", "18:00")]);
        // 13:00 UTC is 10:00 in São Paulo.
        assert!(within_working_hours(&h, monday_utc(13, 0)));
    }

    #[test]
    fn end_of_window_is_out_of_hours() {
        let h = hours(true, "America/Sao_Paulo", &[("monday", "09:00", "18:00")]);
        // 21:00 UTC is exactly 18:00 in São Paulo.
        assert!(!within_working_hours(&h, monday_utc(21, 0)));
    }

    #[test]
    fn start_of_window_is_in_hours() {
        let h = hours(true, "America/Sao_Paulo", &[("monday", "09:00", "18:00")]);
        assert!(within_working_hours(&h, monday_utc(12, 0)));
    }

    #[test]
    fn unconfigured_day_is_out_of_hours() {
        let h = hours(true, "America/Sao_Paulo", &[("tuesday", "09:00", "18:00")]);
        assert!(!within_working_hours(&h, monday_utc(13, 0)));
    }

    #[test]
    fn timezone_shifts_the_weekday() {
        // 2026-03-02 01:00 UTC is still Sunday 22:00 in São Paulo.
        let h = hours(true, "America/Sao_Paulo", &[("sunday", "20:00", "23:00")]);
        assert!(within_working_hours(&h, monday_utc(1, 0)));
    }

    #[test]
    fn invalid_timezone_skips_the_check() {
        let h = hours(true, "Mars/Olympus", &[]);
        assert!(within_working_hours(&h, monday_utc(3, 0)));
    }
}
