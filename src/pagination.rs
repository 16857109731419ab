// pagination.rs

pub const DEFAULT_ROWS_PER_PAGE: usize = 4;

/// `max(1, ceil(count / rows_per_page))`
pub fn total_pages(item_count: usize, rows_per_page: usize) -> usize {
    item_count.div_ceil(rows_per_page.max(1)).max(1)
}

/// Current page position over a list whose length changes underneath it.
/// `current_page` stays within `1..=total_pages` as long as `clamp` runs after
/// every change to the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    rows_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl Pagination {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        total_pages(item_count, self.rows_per_page)
    }

    pub fn is_first(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last(&self, item_count: usize) -> bool {
        self.current_page >= self.total_pages(item_count)
    }

    /// Pulls the page back inside the range after the list shrank.
    pub fn clamp(&mut self, item_count: usize) {
        let total = self.total_pages(item_count);
        self.current_page = self.current_page.clamp(1, total);
    }

    pub fn previous(&mut self) {
        if !self.is_first() {
            self.current_page -= 1;
        }
    }

    pub fn next(&mut self, item_count: usize) {
        if !self.is_last(item_count) {
            self.current_page += 1;
        }
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, 4), 1);
        assert_eq!(total_pages(4, 4), 1);
        assert_eq!(total_pages(5, 4), 2);
        assert_eq!(total_pages(9, 4), 3);
    }

    #[test]
    fn zero_rows_per_page_is_treated_as_one() {
        let p = Pagination::new(0);
        assert_eq!(p.rows_per_page(), 1);
        assert_eq!(total_pages(3, 0), 3);
    }

    #[test]
    fn navigation_stops_at_both_ends() {
        let mut p = Pagination::new(4);
        p.previous();
        assert_eq!(p.current_page(), 1);
        p.next(9);
        p.next(9);
        p.next(9);
        assert_eq!(p.current_page(), 3);
        assert!(p.is_last(9));
        p.previous();
        assert_eq!(p.current_page(), 2);
    }

    #[test]
    fn clamp_follows_shrinking_list() {
        let mut p = Pagination::new(4);
        p.next(12);
        p.next(12);
        assert_eq!(p.current_page(), 3);
        p.clamp(5);
        assert_eq!(p.current_page(), 2);
        p.clamp(0);
        assert_eq!(p.current_page(), 1);
    }
}
