use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::post::{Post, Slug};

/// Authoring convention violations. Never blocks normalization or assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    StartNotMonday { slug: Slug, start: NaiveDate },
    EndNotSunday { slug: Slug, end: NaiveDate },
    SpanNotSixDays { slug: Slug, days: i64 },
    /// Line 3 of a positional file must be blank, its text was dropped
    SeparatorNotBlank { slug: Slug },
    Overlap { previous: Slug, current: Slug },
    Gap { previous: Slug, current: Slug, days: i64 },
    DuplicateSlug { slug: Slug, path: String },
}

impl Display for ValidationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::StartNotMonday { slug, start } =>
                write!(f, "{}: start date {} is a {}, expected Monday", slug, start, start.weekday()),
            ValidationWarning::EndNotSunday { slug, end } =>
                write!(f, "{}: end date {} is a {}, expected Sunday", slug, end, end.weekday()),
            ValidationWarning::SpanNotSixDays { slug, days } =>
                write!(f, "{}: week spans {} days, expected 6", slug, days),
            ValidationWarning::SeparatorNotBlank { slug } =>
                write!(f, "{}: line 4 should be blank, its text is ignored", slug),
            ValidationWarning::Overlap { previous, current } =>
                write!(f, "{} starts before {} ends", current, previous),
            ValidationWarning::Gap { previous, current, days } =>
                write!(f, "{} day(s) missing between {} and {}", days, previous, current),
            ValidationWarning::DuplicateSlug { slug, path } =>
                write!(f, "{}: slug already used, skipping {}", slug, path),
        }
    }
}

pub fn check_week_span(slug: &Slug, start: &NaiveDate, end: &NaiveDate) -> Vec<ValidationWarning> {
    let mut warnings = vec![];
    if start.weekday() != Weekday::Mon {
        warnings.push(ValidationWarning::StartNotMonday { slug: slug.clone(), start: *start });
    }
    if end.weekday() != Weekday::Sun {
        warnings.push(ValidationWarning::EndNotSunday { slug: slug.clone(), end: *end });
    }
    let days = (*end - *start).num_days();
    if days != 6 {
        warnings.push(ValidationWarning::SpanNotSixDays { slug: slug.clone(), days });
    }
    warnings
}

/// Overlaps and gaps between consecutive posts. `ascending` must be in chronological order.
/// Two posts starting on the same day cover the same week and are not compared.
pub fn check_sequence(ascending: &[&Post]) -> Vec<ValidationWarning> {
    let mut warnings = vec![];
    for pair in ascending.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev.start_date == curr.start_date {
            continue;
        }

        if curr.start_date <= prev.end_date {
            warnings.push(ValidationWarning::Overlap {
                previous: prev.slug.clone(),
                current: curr.slug.clone(),
            });
            continue;
        }

        let Some(expected_start) = prev.end_date.checked_add_signed(chrono::Duration::days(1)) else {
            continue;
        };
        let days = (curr.start_date - expected_start).num_days();
        if days > 0 {
            warnings.push(ValidationWarning::Gap {
                previous: prev.slug.clone(),
                current: curr.slug.clone(),
                days,
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use crate::test_data::sample_post;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_span_ok() {
        let warnings = check_week_span(&Slug::from("a"), &ymd(2025, 1, 6), &ymd(2025, 1, 12));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_week_span_violations() {
        let warnings = check_week_span(&Slug::from("a"), &ymd(2025, 1, 7), &ymd(2025, 1, 14));
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].to_string(), "a: start date 2025-01-07 is a Tue, expected Monday");
        assert_eq!(warnings[2], ValidationWarning::SpanNotSixDays { slug: Slug::from("a"), days: 7 });
    }

    #[test]
    fn test_sequence() {
        let first = sample_post("first", ymd(2025, 1, 6), ymd(2025, 1, 12));
        let second = sample_post("second", ymd(2025, 1, 13), ymd(2025, 1, 19));
        let same_week = sample_post("same-week", ymd(2025, 1, 13), ymd(2025, 1, 19));
        let overlapping = sample_post("overlapping", ymd(2025, 1, 18), ymd(2025, 1, 24));
        let after_gap = sample_post("after-gap", ymd(2025, 2, 3), ymd(2025, 2, 9));

        assert!(check_sequence(&[&first, &second, &same_week]).is_empty());

        let warnings = check_sequence(&[&first, &second, &overlapping, &after_gap]);
        assert_eq!(warnings, vec![
            ValidationWarning::Overlap { previous: Slug::from("second"), current: Slug::from("overlapping") },
            ValidationWarning::Gap { previous: Slug::from("overlapping"), current: Slug::from("after-gap"), days: 9 },
        ]);
    }
}
