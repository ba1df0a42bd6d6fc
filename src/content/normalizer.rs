use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::content::parsing_utils::{parse_date_field, parse_front_matter, parse_positional};
use crate::content::raw_document::{DocumentFormat, RawDocument};
use crate::content::slug::slug_from_file_name;
use crate::dates::{iso_week_number, monday_of, parse_iso_date, parse_timestamp, sunday_of};
use crate::error::BlogError;
use crate::post::{Post, Slug};
use crate::text_utils::{derive_summary, reading_time, DEFAULT_SUMMARY_LENGTH, DEFAULT_WORDS_PER_MINUTE};
use crate::validation::{check_week_span, ValidationWarning};

pub const UNTITLED: &str = "Untitled Post";

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Start date of positional posts with an empty date line
    pub today: NaiveDate,
    pub words_per_minute: u32,
    pub summary_length: usize,
}

impl NormalizeOptions {
    pub fn new(today: NaiveDate) -> Self {
        NormalizeOptions {
            today,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            summary_length: DEFAULT_SUMMARY_LENGTH,
        }
    }
}

#[derive(Debug)]
pub struct Normalized {
    pub post: Post,
    pub warnings: Vec<ValidationWarning>,
}

/// What a document states about itself. Absent fields are filled by `resolve_fields`.
#[derive(Debug, Default)]
struct DeclaredFields {
    slug: Option<String>,
    title: Option<String>,
    week: Option<u32>,
    date: Option<NaiveDate>,
    summary: Option<String>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

struct Body {
    start_date: NaiveDate,
    end_date: NaiveDate,
    content: String,
}

pub fn normalize(doc: &RawDocument, options: &NormalizeOptions) -> Result<Normalized, BlogError> {
    let file_slug = slug_from_file_name(doc.file_name());
    let malformed = |slug: &str, reason: String| BlogError::MalformedPost {
        path: doc.path.clone(),
        reason: format!("{} (slug={})", reason, slug),
    };

    let mut warnings = vec![];
    let (declared, body) = match doc.format {
        DocumentFormat::Positional => {
            let fields = parse_positional(&doc.raw_content);
            let (start_date, end_date) = parse_date_field(fields.date_field, options.today)
                .map_err(|e| malformed(file_slug.as_str(), e))?;
            if !fields.separator.is_empty() {
                warnings.push(ValidationWarning::SeparatorNotBlank { slug: file_slug.clone() });
            }

            let declared = DeclaredFields {
                title: non_empty(fields.title),
                summary: non_empty(fields.summary),
                ..Default::default()
            };
            (declared, Body { start_date, end_date, content: fields.content })
        }
        DocumentFormat::Structured => {
            let (meta, content) = parse_front_matter(&doc.raw_content)
                .map_err(|e| malformed(file_slug.as_str(), e))?;
            let slug = meta.slug.as_deref().and_then(non_empty).unwrap_or(file_slug.as_str().to_string());

            let start_str = meta.start_date.as_deref().or(meta.date.as_deref())
                .ok_or_else(|| malformed(slug.as_str(), "Missing startDate".to_string()))?;
            let start_date = parse_iso_date(start_str).map_err(|e| malformed(slug.as_str(), e))?;
            let end_date = match meta.end_date.as_deref() {
                Some(end) => parse_iso_date(end).map_err(|e| malformed(slug.as_str(), e))?,
                None => sunday_of(&monday_of(&start_date)),
            };
            let date = match meta.date.as_deref() {
                Some(date) => Some(parse_iso_date(date).map_err(|e| malformed(slug.as_str(), e))?),
                None => None,
            };

            let declared = DeclaredFields {
                slug: Some(slug),
                title: meta.title.as_deref().and_then(non_empty),
                week: meta.week,
                date,
                summary: meta.summary.as_deref().and_then(non_empty),
                created_at: meta.created_at.as_deref().and_then(|t| parse_timestamp(t).ok()),
                updated_at: meta.updated_at.as_deref().and_then(|t| parse_timestamp(t).ok()),
            };
            (declared, Body { start_date, end_date, content: content.to_string() })
        }
    };

    let post = resolve_fields(declared, body, file_slug, doc, options);
    if post.slug.as_str().is_empty() {
        return Err(malformed("", "File name yields an empty slug".to_string()));
    }
    warnings.extend(check_week_span(&post.slug, &post.start_date, &post.end_date));

    Ok(Normalized { post, warnings })
}

/// Field precedence, first present value wins:
///   slug        declared, file name
///   title       declared, "Untitled Post"
///   week        declared, ISO week of the start Monday
///   date        declared, start date
///   summary     declared, truncated body
///   created_at  declared, store creation time, store modification time, start date
///   updated_at  declared, store modification time, created_at
fn resolve_fields(declared: DeclaredFields, body: Body, file_slug: Slug, doc: &RawDocument, options: &NormalizeOptions) -> Post {
    let Body { start_date, end_date, content } = body;

    let slug = declared.slug.map(Slug).unwrap_or(file_slug);
    let title = declared.title.unwrap_or_else(|| UNTITLED.to_string());
    let week_number = declared.week.unwrap_or_else(|| iso_week_number(&monday_of(&start_date)));
    let date = declared.date.unwrap_or(start_date);
    let summary = declared.summary.unwrap_or_else(|| derive_summary(&content, options.summary_length));
    let created_at = declared.created_at
        .or(doc.times.created)
        .or(doc.times.modified)
        .unwrap_or_else(|| start_date.and_time(NaiveTime::MIN));
    let updated_at = declared.updated_at
        .or(doc.times.modified)
        .unwrap_or(created_at);

    Post {
        slug,
        title,
        week_number,
        date,
        start_date,
        end_date,
        summary,
        reading_time: reading_time(&content, options.words_per_minute),
        content,
        created_at,
        updated_at,
        path: doc.path.clone(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
