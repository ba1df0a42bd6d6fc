use chrono::{Datelike, NaiveDate};

use crate::content::parsing_utils::{parse_date_field, parse_positional, DATE_LINE, TITLE_LINE};
use crate::content::slug::is_valid_slug;
use crate::dates::format_iso_date;
use crate::error::BlogError;
use crate::post_list::PostList;
use crate::store::{join_path, ContentStore, StoreError, Version};
use crate::text_utils::title_from_slug;

pub const TEMPLATE_FILE: &str = "_template.txt";

/// Raw text of a stored post as the editor needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSource {
    pub path: String,
    pub content: String,
    pub version: Version,
}

/// Writes posts to the store. The path of an existing slug is always found by listing the store again.
pub struct PostGateway<'a> {
    pub store: &'a dyn ContentStore,
    pub root_dir: &'a str,
}

impl PostGateway<'_> {
    fn post_list(&self) -> PostList {
        PostList { store: self.store, root_dir: self.root_dir }
    }

    /// `{root}/{yyyy}/{start}-{slug}.txt`
    pub fn post_path(&self, slug: &str, start: &NaiveDate) -> String {
        let year_dir = join_path(self.root_dir, &format!("{:04}", start.year()));
        join_path(&year_dir, &format!("{}-{}.txt", format_iso_date(start), slug))
    }

    pub async fn create(&self, slug: &str, text: &str, today: NaiveDate) -> Result<Version, BlogError> {
        if !is_valid_slug(slug) {
            return Err(BlogError::InvalidSlug(slug.to_string()));
        }

        let fields = parse_positional(text);
        let (start, _) = parse_date_field(fields.date_field, today)
            .map_err(|reason| BlogError::MalformedPost { path: slug.to_string(), reason })?;

        let existing = self.post_list().resolve(slug).await
            .map_err(|e| BlogError::from_store(e, slug))?;
        if existing.is_some() {
            return Err(BlogError::DuplicateSlug(slug.to_string()));
        }

        let path = self.post_path(slug, &start);
        self.store.write_file(&path, text.as_bytes(), None, &format!("Create post: {}", slug)).await
            .map_err(|e| BlogError::from_store(e, slug))
    }

    pub async fn update(&self, slug: &str, text: &str, expected: &Version) -> Result<Version, BlogError> {
        let location = self.post_list().resolve(slug).await
            .map_err(|e| BlogError::from_store(e, slug))?
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

        let message = format!("Update post: {}", slug);
        self.store.write_file(&location.entry.path, text.as_bytes(), Some(expected), &message).await
            .map_err(|e| BlogError::from_store(e, slug))
    }

    pub async fn delete(&self, slug: &str, expected: &Version) -> Result<(), BlogError> {
        let location = self.post_list().resolve(slug).await
            .map_err(|e| BlogError::from_store(e, slug))?
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

        let message = format!("Delete post: {}", slug);
        self.store.delete_file(&location.entry.path, expected, &message).await
            .map_err(|e| BlogError::from_store(e, slug))
    }

    pub async fn source(&self, slug: &str) -> Result<PostSource, BlogError> {
        let location = self.post_list().resolve(slug).await
            .map_err(|e| BlogError::from_store(e, slug))?
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

        let stored = self.store.read_file(&location.entry.path).await
            .map_err(|e| BlogError::from_store(e, slug))?;

        Ok(PostSource {
            path: location.entry.path,
            content: String::from_utf8_lossy(&stored.bytes).to_string(),
            version: stored.version,
        })
    }

    /// Template for new posts, `{root}/_template.txt` or a built-in one.
    pub async fn template(&self, today: NaiveDate) -> Result<String, BlogError> {
        let path = join_path(self.root_dir, TEMPLATE_FILE);
        match self.store.read_file(&path).await {
            Ok(stored) => Ok(String::from_utf8_lossy(&stored.bytes).to_string()),
            Err(StoreError::NotFound(_)) => Ok(default_template(today)),
            Err(e) => Err(BlogError::from_store(e, TEMPLATE_FILE)),
        }
    }
}

pub fn default_template(today: NaiveDate) -> String {
    format!("Untitled Post\n{}\nA brief summary of this post.\n\nYour content goes here...", format_iso_date(&today))
}

/// Title line becomes the title cased slug, date line becomes `today`.
pub fn fill_template(template: &str, slug: &str, today: NaiveDate) -> String {
    let mut lines: Vec<String> = template.split('\n').map(|l| l.to_string()).collect();
    while lines.len() <= DATE_LINE {
        lines.push(String::new());
    }
    lines[TITLE_LINE] = title_from_slug(slug);
    lines[DATE_LINE] = format_iso_date(&today);
    lines.join("\n")
}
