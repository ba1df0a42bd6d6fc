use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::dates::{format_date_range, format_display_date, format_iso_date};
use crate::post::Post;
use crate::post_cache::Adjacent;

#[derive(ramhorns::Content)]
struct NavLink {
    link: String,
    title: String,
    week: u32,
}

impl NavLink {
    fn from(post: &Post) -> NavLink {
        NavLink {
            link: format!("/week/{}", post.slug),
            title: post.title.clone(),
            week: post.week_number,
        }
    }
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    week: u32,
    date_range: String,
    date: String,
    reading_time: &'a str,
    post_title: &'a str,
    summary: &'a str,
    post_content: &'a str,
    has_previous: bool,
    previous: Vec<NavLink>,
    has_next: bool,
    next: Vec<NavLink>,
}

/// Single week page with links to its chronological neighbours.
pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing week template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    /// `rendered_body` is already HTML and is inserted unescaped.
    pub fn render(&self, post: &Post, rendered_body: &str, adjacent: &Adjacent) -> String {
        let previous: Vec<NavLink> = adjacent.previous.iter().map(NavLink::from).collect();
        let next: Vec<NavLink> = adjacent.next.iter().map(NavLink::from).collect();

        self.template.render(&ViewItem {
            week: post.week_number,
            date_range: format_date_range(&format_iso_date(&post.start_date), &format_iso_date(&post.end_date)),
            date: format_display_date(&format_iso_date(&post.date)),
            reading_time: post.reading_time.as_str(),
            post_title: post.title.as_str(),
            summary: post.summary.as_str(),
            post_content: rendered_body,
            has_previous: !previous.is_empty(),
            previous,
            has_next: !next.is_empty(),
            next,
        })
    }
}
