use chrono::NaiveDateTime;

use crate::store::{base_name, StoredFile, Version};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DocumentFormat {
    /// Meaning assigned by line position, `.txt`
    Positional,
    /// Front matter block followed by the body, `.mdx` or `.md`
    Structured,
}

/// Timestamps the store knows about a file, used when the document itself carries none.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FileTimes {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

pub struct RawDocument {
    pub path: String,
    pub format: DocumentFormat,
    pub raw_content: String,
    pub version: Version,
    pub times: FileTimes,
}

impl RawDocument {
    pub fn from_stored(path: &str, stored: StoredFile) -> Result<RawDocument, String> {
        let format = match Self::guess_format(path) {
            None => return Err(format!("Could not guess the format of the file {}", path)),
            Some(format) => format,
        };

        let raw_content = match String::from_utf8(stored.bytes) {
            Ok(s) => s,
            Err(e) => return Err(format!("File {} is not valid UTF-8: {}", path, e)),
        };

        Ok(RawDocument {
            path: path.to_string(),
            format,
            raw_content,
            version: stored.version,
            times: FileTimes {
                created: stored.created,
                modified: stored.modified,
            },
        })
    }

    pub fn guess_format(path: &str) -> Option<DocumentFormat> {
        match base_name(path) {
            x if x.ends_with(".txt") => Some(DocumentFormat::Positional),
            x if x.ends_with(".mdx") || x.ends_with(".md") => Some(DocumentFormat::Structured),
            _ => None,
        }
    }

    pub fn file_name(&self) -> &str {
        base_name(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_format() {
        assert_eq!(RawDocument::guess_format("content/weeks/2025/2025-01-06-a.txt"), Some(DocumentFormat::Positional));
        assert_eq!(RawDocument::guess_format("content/weeks/a.mdx"), Some(DocumentFormat::Structured));
        assert_eq!(RawDocument::guess_format("content/weeks/a.md"), Some(DocumentFormat::Structured));
        assert_eq!(RawDocument::guess_format("content/weeks/image.png"), None);
    }

    #[test]
    fn test_from_stored() {
        let stored = StoredFile {
            bytes: b"Title\n2025-01-06".to_vec(),
            version: Version("v1".to_string()),
            created: None,
            modified: None,
        };
        let doc = RawDocument::from_stored("content/weeks/2025/2025-01-06-a.txt", stored).unwrap();
        assert_eq!(doc.format, DocumentFormat::Positional);
        assert_eq!(doc.file_name(), "2025-01-06-a.txt");
        assert_eq!(doc.raw_content, "Title\n2025-01-06");

        let stored = StoredFile {
            bytes: vec![0xff, 0xfe],
            version: Version("v1".to_string()),
            created: None,
            modified: None,
        };
        assert!(RawDocument::from_stored("a.txt", stored).is_err());
    }
}
