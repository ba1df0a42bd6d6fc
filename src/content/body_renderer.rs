use std::io;
use std::io::ErrorKind;

use markdown::Options;

/// Turns a post body into HTML. Swappable so pages do not depend on one markup flavour.
pub trait BodyRenderer: Send + Sync {
    fn render(&self, body: &str) -> io::Result<String>;
}

/// GitHub flavoured markdown. Plain text bodies come out as paragraphs.
pub struct MarkdownRenderer {}

impl BodyRenderer for MarkdownRenderer {
    fn render(&self, body: &str) -> io::Result<String> {
        match markdown::to_html_with_options(body, &Options::gfm()) {
            Ok(x) => Ok(x),
            Err(e) => Err(io::Error::new(ErrorKind::InvalidInput, e.reason.as_str())),
        }
    }
}
