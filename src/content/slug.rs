use lazy_static::lazy_static;
use regex::Regex;

use crate::post::Slug;

lazy_static! {
    // Longest prefix first: `2025-01-06,2025-01-12-` would otherwise never match
    static ref DATE_PREFIXES: [Regex; 2] = [
        Regex::new(r"^\d{4}-\d{2}-\d{2},\d{4}-\d{2}-\d{2}-(?P<slug>.+)$").unwrap(),
        Regex::new(r"^\d{4}-\d{2}-\d{2}-(?P<slug>.+)$").unwrap(),
    ];
    static ref NON_ALPHANUMERIC_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref VALID_SLUG: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// `2025-01-06-my-week.txt` -> `my-week`. Names without a date prefix are slugified whole.
pub fn slug_from_file_name(file_name: &str) -> Slug {
    let stem = strip_extension(file_name);
    for prefix in DATE_PREFIXES.iter() {
        if let Some(slug) = prefix.captures(stem).and_then(|cap| cap.name("slug")) {
            return Slug(slug.as_str().to_string());
        }
    }
    Slug(slugify(stem))
}

/// Lowercase ASCII with every run of other characters collapsed into one hyphen.
pub fn slugify(text: &str) -> String {
    let ascii = unidecode::unidecode(text).to_lowercase();
    NON_ALPHANUMERIC_RUN.replace_all(&ascii, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    VALID_SLUG.is_match(slug)
}
