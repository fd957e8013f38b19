//! Working-hours windows ("HH:MM-HH:MM")

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

const CLOCK_FORMAT: &str = "%H:%M";

/// Reason a time window string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    #[error("expected 'HH:MM-HH:MM', got {0} part(s)")]
    PartCount(usize),

    #[error("'{0}' is not a HH:MM clock time")]
    ClockTime(String),
}

/// A clock interval during which a recipient can be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Strict overlap: windows that only touch at one instant do not overlap
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

impl FromStr for TimeWindow {
    type Err = TimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(TimeWindowError::PartCount(parts.len()));
        }

        // Bounds are exact "HH:MM": "08:00 - 12:00" is malformed
        let parse = |part: &str| {
            if part.chars().any(char::is_whitespace) {
                return Err(TimeWindowError::ClockTime(part.to_string()));
            }
            NaiveTime::parse_from_str(part, CLOCK_FORMAT)
                .map_err(|_| TimeWindowError::ClockTime(part.to_string()))
        };

        Ok(Self {
            start: parse(parts[0])?,
            end: parse(parts[1])?,
        })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(CLOCK_FORMAT),
            self.end.format(CLOCK_FORMAT)
        )
    }
}

/// Whether two raw windows overlap. Any unparsable window never overlaps.
pub fn overlaps(w1: &str, w2: &str) -> bool {
    match (w1.parse::<TimeWindow>(), w2.parse::<TimeWindow>()) {
        (Ok(a), Ok(b)) => a.overlaps(&b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_windows() {
        assert!(overlaps("09:00-12:00", "11:00-13:00"));
        assert!(overlaps("11:00-13:00", "09:00-12:00"));
    }

    #[test]
    fn test_touching_windows_do_not_overlap() {
        assert!(!overlaps("09:00-10:00", "10:00-11:00"));
    }

    #[test]
    fn test_contained_window_overlaps() {
        assert!(overlaps("08:00-18:00", "12:30-13:00"));
    }

    #[test]
    fn test_disjoint_windows() {
        assert!(!overlaps("08:00-09:00", "14:00-16:00"));
    }

    #[test]
    fn test_malformed_window_never_overlaps() {
        assert!(!overlaps("bad", "09:00-10:00"));
        assert!(!overlaps("09:00-10:00", "9h-10h"));
        assert!(!overlaps("09:00-10:00-11:00", "09:00-10:00"));
        assert!(!overlaps("", ""));
    }

    #[test]
    fn test_parse_reports_part_count() {
        assert_eq!(
            "08:00".parse::<TimeWindow>(),
            Err(TimeWindowError::PartCount(1))
        );
    }

    #[test]
    fn test_parse_reports_bad_clock_time() {
        assert_eq!(
            "08:00-25:00".parse::<TimeWindow>(),
            Err(TimeWindowError::ClockTime("25:00".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_spaces_around_times() {
        assert_eq!(
            "08:00 - 12:00".parse::<TimeWindow>(),
            Err(TimeWindowError::ClockTime("08:00 ".to_string()))
        );
        assert!(!overlaps("08:00 - 12:00", "11:00-13:00"));
        assert!(!overlaps("11:00-13:00", "08:00-12:00 "));
    }

    #[test]
    fn test_parse_round_trips_display() {
        let window: TimeWindow = "08:00-12:00".parse().unwrap();
        assert_eq!(window.to_string(), "08:00-12:00");
    }
}
