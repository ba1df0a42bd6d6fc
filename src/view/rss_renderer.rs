use std::io::Cursor;

use chrono::{NaiveTime, TimeZone, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::post::Post;

pub struct RssChannel<'a> {
    pub ch_title: &'a str,
    pub ch_link: &'a str,
    pub ch_desc: &'a str,
    pub ch_lang: Option<&'a str>,
}

impl<'a> RssChannel<'a> {
    /// `posts` newest first, as listed on the home page.
    pub fn render(&self, posts: &[Post]) -> quick_xml::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        let decl = Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None));
        writer.write_event(decl)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;

        writer.write_event(Event::Start(BytesStart::new("channel")))?;
        push_text(&mut writer, "title", self.ch_title)?;
        push_text(&mut writer, "link", self.ch_link)?;
        push_text(&mut writer, "description", self.ch_desc)?;
        if let Some(lang) = self.ch_lang {
            push_text(&mut writer, "language", lang)?;
        }

        for post in posts {
            writer.write_event(Event::Start(BytesStart::new("item")))?;

            // <title>Week 2: My Title</title>
            let title = format!("Week {}: {}", post.week_number, post.title);
            push_text(&mut writer, "title", &title)?;

            let link = week_link(self.ch_link, post.slug.as_str());
            push_text(&mut writer, "link", link.as_str())?;

            let mut guid_elem = BytesStart::new("guid");
            guid_elem.push_attribute(("isPermaLink", "true"));
            writer.write_event(Event::Start(guid_elem))?;
            writer.write_event(Event::Text(BytesText::new(link.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            push_cdata(&mut writer, "description", post.summary.as_str())?;

            // <pubDate>Mon, 6 Jan 2025 00:00:00 +0000</pubDate>
            let dt = Utc.from_utc_datetime(&post.date.and_time(NaiveTime::MIN));
            push_text(&mut writer, "pubDate", &dt.to_rfc2822())?;

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(writer.into_inner().into_inner())
    }
}

/// `{site}/week/{slug}`
pub fn week_link(base_url: &str, slug: &str) -> String {
    format!("{}/week/{}", base_url.trim_end_matches('/'), slug)
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_cdata(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if text.contains("]]>") {
        let new_text = text.replace("]]>", "]] >");
        writer.write_event(Event::CData(BytesCData::new(&new_text)))?;
    } else {
        writer.write_event(Event::CData(BytesCData::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str;

    use chrono::NaiveDate;

    use crate::test_data::sample_post;

    use super::*;

    #[test]
    fn render_xml() {
        let mut first = sample_post("my-title", NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
        first.title = "My Title".to_string();
        first.summary = "A summary ]]> with cdata end".to_string();
        let second = sample_post("older", NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(), NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());

        let rss = RssChannel {
            ch_title: "my feed",
            ch_link: "https://example.com/",
            ch_desc: "Weekly notes",
            ch_lang: Some("en"),
        };
        let xml = rss.render(&[first, second]).unwrap();
        assert_eq!(str::from_utf8(&xml).unwrap(), EXPECTED);
    }

    #[test]
    fn test_week_link() {
        assert_eq!(week_link("https://example.com", "a"), "https://example.com/week/a");
        assert_eq!(week_link("https://example.com/", "a"), "https://example.com/week/a");
    }

    const EXPECTED: &str = r##"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>my feed</title><link>https://example.com/</link><description>Weekly notes</description><language>en</language><item><title>Week 2: My Title</title><link>https://example.com/week/my-title</link><guid isPermaLink="true">https://example.com/week/my-title</guid><description><![CDATA[A summary ]] > with cdata end]]></description><pubDate>Mon, 6 Jan 2025 00:00:00 +0000</pubDate></item><item><title>Week 1: Title of older</title><link>https://example.com/week/older</link><guid isPermaLink="true">https://example.com/week/older</guid><description><![CDATA[Summary of older]]></description><pubDate>Mon, 30 Dec 2024 00:00:00 +0000</pubDate></item></channel></rss>"##;
}
