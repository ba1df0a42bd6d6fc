pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;
pub const DEFAULT_SUMMARY_LENGTH: usize = 150;
const ELLIPSIS: &str = "...";

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Human readable estimate, `3 min read`. Partial minutes round up.
pub fn reading_time(text: &str, words_per_minute: u32) -> String {
    let words = word_count(text) as u32;
    let wpm = words_per_minute.max(1);
    let minutes = words.div_ceil(wpm);
    format!("{} min read", minutes)
}

/// First `max_chars` characters of the body with whitespace collapsed, plus an ellipsis when cut.
pub fn derive_summary(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// `my-first-week` -> `My First Week`
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
