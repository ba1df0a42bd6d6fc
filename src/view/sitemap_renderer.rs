use std::io::Cursor;

use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::dates::format_iso_date;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Only the home page is listed, week pages are reached through it.
pub fn render_sitemap(site_url: &str, last_modified: Option<NaiveDate>) -> quick_xml::Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset))?;

    writer.write_event(Event::Start(BytesStart::new("url")))?;
    push_text(&mut writer, "loc", &format!("{}/", site_url.trim_end_matches('/')))?;
    if let Some(date) = last_modified {
        push_text(&mut writer, "lastmod", &format_iso_date(&date))?;
    }
    push_text(&mut writer, "changefreq", "weekly")?;
    push_text(&mut writer, "priority", "1.0")?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    Ok(writer.into_inner().into_inner())
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
