use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::dates::{format_date_range, format_display_date, format_iso_date};
use crate::post::Post;

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    post_list: Vec<PostItem<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
    has_posts: bool,
    has_error: bool,
    error: &'a str,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    week: u32,
    date_range: String,
    date: String,
    link: String,
    title: &'a str,
    summary: &'a str,
    reading_time: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
}

/// Home page: one page of weeks, newest first.
pub struct ListRenderer<'a> {
    pub template: Template<'a>,
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str) -> io::Result<ListRenderer> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing list template: {}", e)));
            }
        };

        Ok(ListRenderer {
            template,
        })
    }

    /// `error` is shown as a banner above whatever posts could be listed.
    pub fn render(&self, posts: &[Post], cur_page: u32, page_count: u32, error: Option<&str>) -> String {
        let post_list: Vec<PostItem> = posts.iter()
            .map(|post| {
                let start = format_iso_date(&post.start_date);
                let end = format_iso_date(&post.end_date);
                PostItem {
                    week: post.week_number,
                    date_range: format_date_range(&start, &end),
                    date: format_display_date(&format_iso_date(&post.date)),
                    link: format!("/week/{}", post.slug),
                    title: post.title.as_str(),
                    summary: post.summary.as_str(),
                    reading_time: post.reading_time.as_str(),
                }
            })
            .collect();

        let page_list: Vec<ViewPagination> = (1..=page_count)
            .map(|number| ViewPagination { current: number == cur_page, number })
            .collect();

        self.template.render(&ListPage {
            has_posts: !post_list.is_empty(),
            post_list,
            show_pagination: page_count > 1,
            page_list,
            has_error: error.is_some(),
            error: error.unwrap_or(""),
        })
    }
}
