use crate::core::normalize::{is_always_open, parse_hour};
use crate::models::CellValue;

/// Decide whether a facility is open at `current_hour` (0-23)
///
/// Rules, applied in order:
/// 1. `24/7` in either field means open
/// 2. an unparsable opening or closing time means open
/// 3. identical opening and closing hours mean open
/// 4. a same-day window is open for `opening <= hour < closing`
/// 5. an overnight window is open from `opening` until midnight and from
///    midnight until `closing`
///
/// Ambiguous schedules never exclude a facility.
pub fn is_open_now(opening: &CellValue, closing: &CellValue, current_hour: u8) -> bool {
    if is_always_open(opening) || is_always_open(closing) {
        return true;
    }

    let (open_h, close_h) = match (parse_hour(opening), parse_hour(closing)) {
        (Some(o), Some(c)) => (o, c),
        _ => return true,
    };

    if open_h == close_h {
        return true;
    }

    if open_h < close_h {
        open_h <= current_hour && current_hour < close_h
    } else {
        current_hour >= open_h || current_hour < close_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(opening: &str, closing: &str, hour: u8) -> bool {
        is_open_now(&CellValue::from(opening), &CellValue::from(closing), hour)
    }

    #[test]
    fn test_always_open_marker() {
        assert!(open("24/7", "24/7", 3));
        assert!(open("24/7", "", 3));
        assert!(open("7:00 AM", "Open 24/7", 23));
    }

    #[test]
    fn test_same_day_window() {
        assert!(!open("7:00 AM", "10:00 PM", 23));
        assert!(!open("7:00 AM", "10:00 PM", 6));
        assert!(open("7:00 AM", "10:00 PM", 7));
        assert!(open("7:00 AM", "10:00 PM", 21));
        assert!(!open("7:00 AM", "10:00 PM", 22));
    }

    #[test]
    fn test_overnight_window() {
        assert!(open("8:00 PM", "4:00 AM", 1));
        assert!(open("8:00 PM", "4:00 AM", 20));
        assert!(!open("8:00 PM", "4:00 AM", 4));
        assert!(!open("8:00 PM", "4:00 AM", 12));
    }

    #[test]
    fn test_unknown_schedule_defaults_open() {
        assert!(open("garbage", "also garbage", 12));
        assert!(open("7:00 AM", "N/A", 2));
        assert!(is_open_now(&CellValue::Empty, &CellValue::Empty, 0));
        assert!(is_open_now(&CellValue::Number(0.25), &CellValue::from("5:00 PM"), 23));
    }

    #[test]
    fn test_equal_hours_always_open() {
        assert!(open("6:00 AM", "6:30 AM", 15));
        assert!(open("12:00 AM", "12:00 AM", 13));
    }
}
