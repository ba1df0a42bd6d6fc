use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Slug(value.to_string())
    }
}

/// One weekly post, rebuilt from its stored file on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub slug: Slug,
    pub title: String,
    pub week_number: u32,
    pub date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: String,
    pub content: String,
    pub reading_time: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Store path the post was read from
    pub path: String,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "slug={}, week={}, start={}, end={}\ntitle={}\nsummary={}\ncontent:\n{}",
               self.slug,
               self.week_number,
               self.start_date,
               self.end_date,
               self.title,
               self.summary,
               self.content
        )
    }
}
