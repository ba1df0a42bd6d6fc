use std::fmt;

use chrono::NaiveDate;
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, MapAccess, Visitor};
use serde::Deserialize;

/// Calendar date in `weekly.toml`, written bare (`2024-12-23`) or quoted.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TomlDate(pub NaiveDate);

struct TomlDateVisitor;

impl<'de> Visitor<'de> for TomlDateVisitor {
    type Value = TomlDate;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a date such as 2024-12-23")
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<TomlDate, E> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(TomlDate)
            .map_err(|e| E::custom(format!("invalid date {}: {}", text, e)))
    }

    // Bare TOML dates arrive as a single entry map
    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<TomlDate, A::Error> {
        let value = toml::value::Datetime::deserialize(MapAccessDeserializer::new(map))?;
        if value.time.is_some() {
            return Err(de::Error::custom(format!("expected a date without time, found {}", value)));
        }
        self.visit_str(&value.to_string())
    }
}

impl<'de> Deserialize<'de> for TomlDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(TomlDateVisitor)
    }
}
