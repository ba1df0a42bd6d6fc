use serde::Deserialize;

/// Query parameters understood by the week list, `/?page=2`.
#[derive(Deserialize, Default, PartialEq, Debug)]
pub struct ListQuery {
    page: Option<String>,
}

impl ListQuery {
    /// Unparseable query strings behave like an empty one.
    pub fn parse(query: Option<&str>) -> ListQuery {
        query
            .and_then(|q| serde_urlencoded::from_str::<ListQuery>(q).ok())
            .unwrap_or_default()
    }

    /// Requested page, 1 when missing or not a positive number.
    pub fn page(&self) -> u32 {
        self.page.as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page() {
        assert_eq!(ListQuery::parse(Some("page=3")).page(), 3);
        assert_eq!(ListQuery::parse(Some("sort=old&page=2")).page(), 2);
        assert_eq!(ListQuery::parse(Some("page=0")).page(), 1);
        assert_eq!(ListQuery::parse(Some("page=-4")).page(), 1);
        assert_eq!(ListQuery::parse(Some("page=two")).page(), 1);
        assert_eq!(ListQuery::parse(None).page(), 1);
    }

    #[test]
    fn test_parse_odd_queries() {
        assert_eq!(ListQuery::parse(Some("")), ListQuery::default());
        assert_eq!(ListQuery::parse(Some("page")), ListQuery { page: Some(String::new()) });
        assert_eq!(ListQuery::parse(Some("page=%32")).page(), 2);
    }
}
