#![cfg(test)]

use chrono::{NaiveDate, NaiveTime};

use crate::dates::iso_week_number;
use crate::post::{Post, Slug};

pub const POSITIONAL_POST: &str = "My Title
2025-01-06,2025-01-12
A summary

Body line one
Body line two";

pub const POSITIONAL_NO_SUMMARY: &str = "Second week
2025-01-13

Line 3 stays blank.
This week I rewrote the parser, moved the journal to plain text files and finally stopped fighting the editor. The rest of the time went into reading and long walks by the river.
";

pub const STRUCTURED_POST: &str = "---
title: Settling in
week: 52
startDate: 2024-12-23
endDate: 2024-12-29
summary: The first one.
slug: settling-in
---
First week of the journal.

More text.
";

pub const STRUCTURED_POST_TOML: &str = "+++
title = \"Toml week\"
startDate = 2025-01-13
createdAt = 2025-01-13T08:00:00Z
+++
Body from toml.
";

pub fn sample_post(slug: &str, start: NaiveDate, end: NaiveDate) -> Post {
    let timestamp = start.and_time(NaiveTime::MIN);
    Post {
        slug: Slug::from(slug),
        title: format!("Title of {}", slug),
        week_number: iso_week_number(&start),
        date: start,
        start_date: start,
        end_date: end,
        summary: format!("Summary of {}", slug),
        content: format!("Content of {}", slug),
        reading_time: "1 min read".to_string(),
        created_at: timestamp,
        updated_at: timestamp,
        path: format!("content/weeks/{}-{}.txt", start, slug),
    }
}
