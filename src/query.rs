// query.rs
//
// search -> visibility -> due-date sort -> page slice. Nothing here mutates the
// collection; `derive_view` is re-run after every change to items or query.

use crate::item::Item;
use crate::pagination::Pagination;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub search_term: String,
    pub sort_by_due_date: bool,
    pub show_completed: bool,
}

pub fn matches_search(item: &Item, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let q = term.to_lowercase();
    item.title.to_lowercase().contains(&q) || item.description.to_lowercase().contains(&q)
}

pub fn search<'a>(items: impl IntoIterator<Item = &'a Item>, term: &str) -> Vec<&'a Item> {
    items.into_iter().filter(|i| matches_search(i, term)).collect()
}

pub fn filter_visibility<'a>(items: Vec<&'a Item>, show_completed: bool) -> Vec<&'a Item> {
    if show_completed {
        items
    } else {
        items.into_iter().filter(|i| !i.is_done).collect()
    }
}

/// Stable ascending sort by due date; items without a date go last in their
/// original relative order.
pub fn sort_by_due_date(items: &mut [&Item]) {
    items.sort_by_key(|i| (i.date.is_none(), i.date));
}

pub fn page_slice<T>(items: &[T], page: usize, rows_per_page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(rows_per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(rows_per_page).min(items.len());
    &items[start..end]
}

/// Stages 1-3: everything that matches the query, in display order.
pub fn run_query<'a>(items: &'a [Item], query: &Query) -> Vec<&'a Item> {
    let mut out = filter_visibility(search(items, &query.search_term), query.show_completed);
    if query.sort_by_due_date {
        sort_by_due_date(&mut out);
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View<'a> {
    pub page: Vec<&'a Item>,
    pub filtered_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Runs the full pipeline and clamps `pagination` to the filtered length.
pub fn derive_view<'a>(items: &'a [Item], query: &Query, pagination: &mut Pagination) -> View<'a> {
    let filtered = run_query(items, query);
    pagination.clamp(filtered.len());
    let page = page_slice(&filtered, pagination.current_page(), pagination.rows_per_page()).to_vec();
    View {
        page,
        filtered_count: filtered.len(),
        current_page: pagination.current_page(),
        total_pages: pagination.total_pages(filtered.len()),
    }
}
