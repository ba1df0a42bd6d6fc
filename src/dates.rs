use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const ISO_DATE: &str = "%Y-%m-%d";

/// ISO-8601 week number. Weeks start on Monday and week 1 holds the first Thursday of the year.
pub fn iso_week_number(date: &NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Monday that starts the ISO week containing `date`.
pub fn monday_of(date: &NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    date.checked_sub_signed(Duration::days(offset)).unwrap_or(NaiveDate::MIN)
}

/// Saturates at the last representable date.
pub fn sunday_of(monday: &NaiveDate) -> NaiveDate {
    monday.checked_add_signed(Duration::days(6)).unwrap_or(NaiveDate::MAX)
}

/// Exactly `dddd-dd-dd`. chrono's `%Y` alone also takes signed and extended years.
fn is_plain_date(buf: &str) -> bool {
    let bytes = buf.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn parse_plain_date(buf: &str) -> Option<NaiveDate> {
    if !is_plain_date(buf) {
        return None;
    }
    NaiveDate::parse_from_str(buf, ISO_DATE).ok()
}

/// Parses `YYYY-MM-DD`. Full timestamps are accepted too, only their date part is kept.
pub fn parse_iso_date(buf: &str) -> Result<NaiveDate, String> {
    let buf = buf.trim();
    if let Some(date) = parse_plain_date(buf) {
        return Ok(date);
    }

    // 2025-01-06T10:00:00Z or 2025-01-06 10:00:00
    if buf.len() > 10 && buf.is_char_boundary(10) {
        let (date_part, rest) = buf.split_at(10);
        if rest.starts_with('T') || rest.starts_with(' ') {
            if let Some(date) = parse_plain_date(date_part) {
                return Ok(date);
            }
        }
    }

    Err(format!("Unable to parse date {}", buf))
}

/// Parses the timestamps found in metadata blocks: RFC 3339, `YYYY-MM-DD HH:MM:SS` or a plain date.
pub fn parse_timestamp(buf: &str) -> Result<NaiveDateTime, String> {
    let buf = buf.trim();
    if !buf.is_char_boundary(10) || !is_plain_date(&buf[..10]) {
        return Err(format!("Unable to parse timestamp {}", buf));
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(buf) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(buf, fmt) {
            return Ok(dt);
        }
    }
    match NaiveDate::parse_from_str(buf, ISO_DATE) {
        Ok(date) => Ok(NaiveDateTime::new(date, NaiveTime::MIN)),
        Err(_) => Err(format!("Unable to parse timestamp {}", buf)),
    }
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

/// `Jan 6, 2025`. Unparsable input is returned untouched.
pub fn format_display_date(date_str: &str) -> String {
    match parse_iso_date(date_str) {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => date_str.to_string(),
    }
}

/// `6 January 2025 to 12 January 2025`. Unparsable input is returned untouched.
pub fn format_date_range(start: &str, end: &str) -> String {
    match (parse_iso_date(start), parse_iso_date(end)) {
        (Ok(start), Ok(end)) => format!("{} to {}", start.format("%-d %B %Y"), end.format("%-d %B %Y")),
        _ => format!("{} to {}", start, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_week_number() {
        assert_eq!(iso_week_number(&ymd(2025, 1, 6)), 2);
        assert_eq!(iso_week_number(&ymd(2024, 12, 30)), 1);
        assert_eq!(iso_week_number(&ymd(2021, 1, 3)), 53);
        assert_eq!(iso_week_number(&ymd(2026, 1, 1)), 1);
    }

    #[test]
    fn test_monday_and_sunday() {
        assert_eq!(monday_of(&ymd(2025, 1, 6)), ymd(2025, 1, 6));
        assert_eq!(monday_of(&ymd(2025, 1, 9)), ymd(2025, 1, 6));
        assert_eq!(monday_of(&ymd(2025, 1, 12)), ymd(2025, 1, 6));
        assert_eq!(monday_of(&ymd(2025, 1, 1)), ymd(2024, 12, 30));
        assert_eq!(sunday_of(&ymd(2024, 12, 30)), ymd(2025, 1, 5));
    }

    #[test]
    fn test_week_number_stable_under_monday_of() {
        let mut date = ymd(2019, 12, 20);
        let last = ymd(2027, 1, 10);
        while date <= last {
            assert_eq!(iso_week_number(&monday_of(&date)), iso_week_number(&date), "date={}", date);
            date += Duration::days(1);
        }
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2025-01-06"), Ok(ymd(2025, 1, 6)));
        assert_eq!(parse_iso_date(" 2025-01-06 "), Ok(ymd(2025, 1, 6)));
        assert_eq!(parse_iso_date("2025-01-06T12:30:00Z"), Ok(ymd(2025, 1, 6)));
        assert!(parse_iso_date("not-a-date").is_err());
        assert!(parse_iso_date("2025-02-30").is_err());
        assert!(parse_iso_date("").is_err());
        assert!(parse_iso_date("+262142-12-31").is_err());
        assert!(parse_iso_date("-0001-01-01").is_err());
        assert!(parse_iso_date("25-01-06").is_err());
        assert!(parse_iso_date("2025-1-6").is_err());
    }

    #[test]
    fn test_week_bounds_saturate() {
        assert_eq!(sunday_of(&NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(monday_of(&NaiveDate::MIN), NaiveDate::MIN);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2025-01-06T10:15:00Z").unwrap();
        assert_eq!(ts.to_string(), "2025-01-06 10:15:00");
        let ts = parse_timestamp("2025-01-06 10:15:00").unwrap();
        assert_eq!(ts.to_string(), "2025-01-06 10:15:00");
        let ts = parse_timestamp("2025-01-06").unwrap();
        assert_eq!(ts.to_string(), "2025-01-06 00:00:00");
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("+262142-12-31T00:00:00Z").is_err());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_display_date("2025-01-06"), "Jan 6, 2025");
        assert_eq!(format_display_date("garbage"), "garbage");
        assert_eq!(format_date_range("2025-01-06", "2025-01-12"), "6 January 2025 to 12 January 2025");
        assert_eq!(format_date_range("2025-01-06", "soon"), "2025-01-06 to soon");
        assert_eq!(format_iso_date(&ymd(2025, 3, 3)), "2025-03-03");
    }
}
