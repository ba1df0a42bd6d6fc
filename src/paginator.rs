/// Splits the newest-first week list into fixed size pages, numbered from 1.
pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: usize,
}

impl<'a, T> Paginator<'a, T> {
    /// A `page_size` of 0 is treated as 1.
    pub fn new(items: &'a [T], page_size: u32) -> Self {
        Paginator {
            items,
            page_size: page_size.max(1) as usize,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.items.len().div_ceil(self.page_size) as u32
    }

    /// Out of range pages fall back to the first one.
    pub fn clamp(&self, page: u32) -> u32 {
        if page == 0 || page > self.page_count() { 1 } else { page }
    }

    /// `None` for page 0 and pages past the end. An empty list has no pages.
    pub fn get_page(&self, page: u32) -> Option<&'a [T]> {
        if page == 0 || page > self.page_count() {
            return None;
        }
        let start = (page as usize - 1) * self.page_size;
        let end = (start + self.page_size).min(self.items.len());
        Some(&self.items[start..end])
    }
}
