// app.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::due::{format_for_input, parse_due_date};
use crate::error::ValidationError;
use crate::item::{Draft, Item};
use crate::list::{ListManager, Notice, Outcome, Request};
use crate::pagination::Pagination;
use crate::query::{self, Query, View};
use crate::store::ItemStore;
use crate::worker::Dispatcher;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    EditingTitle,
    EditingDescription,
    EditingDueDate,
    Searching,
}

/// The add/edit form. `editing` holds the id being edited, `None` for a new item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    pub editing: Option<i64>,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub error: Option<String>,
    /// The stored date of the item being edited.
    original_date: Option<DateTime<Utc>>,
}

impl Form {
    fn for_item(item: &Item) -> Self {
        Self {
            editing: Some(item.id),
            title: item.title.clone(),
            description: item.description.clone(),
            due_date: item.date.map(format_for_input).unwrap_or_default(),
            error: None,
            original_date: item.date,
        }
    }

    /// Validates every field; the first problem wins.
    fn to_draft(&self) -> Result<Draft, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        // An untouched date on an edit is kept as stored, even when it has passed.
        let date = match self.original_date {
            Some(d) if self.due_date.trim() == format_for_input(d) => d,
            _ => parse_due_date(&self.due_date)?,
        };
        Draft::new(self.title.trim(), self.description.trim(), Some(date))
    }
}

pub struct App {
    manager: ListManager,
    dispatcher: Dispatcher,
    pub query: Query,
    pagination: Pagination,
    pub input_mode: InputMode,
    pub form: Form,
    /// Row index within the current page.
    pub selected: usize,
    pub status: Option<Notice>,
}

impl App {
    pub fn new(store: Arc<dyn ItemStore>, rows_per_page: usize) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&store)),
            manager: ListManager::new(store),
            query: Query::default(),
            pagination: Pagination::new(rows_per_page),
            input_mode: InputMode::Normal,
            form: Form::default(),
            selected: 0,
            status: None,
        }
    }

    pub fn manager(&self) -> &ListManager {
        &self.manager
    }

    pub fn items(&self) -> &[Item] {
        self.manager.items()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn is_loading(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// The page the user currently sees. Pagination is already clamped by
    /// `recompute`, so deriving from a copy gives the same page.
    pub fn view(&self) -> View<'_> {
        let mut pagination = self.pagination;
        query::derive_view(self.manager.items(), &self.query, &mut pagination)
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.view().page.get(self.selected).copied()
    }

    /// Re-derives the view after any change and pulls page and selection back in range.
    fn recompute(&mut self) {
        let page_len = query::derive_view(self.manager.items(), &self.query, &mut self.pagination)
            .page
            .len();
        self.selected = self.selected.min(page_len.saturating_sub(1));
    }

    fn submit(&mut self, request: Request) {
        self.dispatcher.submit(request);
    }

    fn apply(&mut self, outcome: Outcome) {
        if self.manager.is_stale(&outcome) {
            debug!("fetched list is out of date, fetching again");
            self.refresh();
            return;
        }
        let notice = self.manager.apply(outcome);
        debug!(?notice, "applied outcome");
        self.status = Some(notice);
        self.recompute();
    }

    /// Applies whatever responses have arrived; called every event-loop tick.
    pub fn drain_outcomes(&mut self) {
        for outcome in self.dispatcher.drain() {
            self.apply(outcome);
        }
    }

    /// Waits for every in-flight request and applies the results.
    pub fn settle(&mut self) {
        // Applying can queue a refetch, so keep going until nothing is out.
        while self.dispatcher.is_busy() {
            for outcome in self.dispatcher.settle() {
                self.apply(outcome);
            }
        }
    }

    pub fn refresh(&mut self) {
        let req = self.manager.prepare_refresh();
        self.submit(req);
    }

    pub fn generate_sample(&mut self) {
        let req = self.manager.prepare_sample();
        self.submit(req);
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id) else {
            return;
        };
        self.toggle_done(id);
    }

    pub fn toggle_done(&mut self, id: i64) {
        if let Some(req) = self.manager.prepare_toggle(id) {
            self.submit(req);
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id) else {
            return;
        };
        let req = self.manager.prepare_remove(id);
        self.submit(req);
    }

    // --- query and paging ---

    pub fn set_search_term<S: Into<String>>(&mut self, term: S) {
        self.query.search_term = term.into();
        self.pagination.reset();
        self.selected = 0;
        self.recompute();
    }

    pub fn push_search_char(&mut self, c: char) {
        let mut term = self.query.search_term.clone();
        term.push(c);
        self.set_search_term(term);
    }

    pub fn pop_search_char(&mut self) {
        let mut term = self.query.search_term.clone();
        term.pop();
        self.set_search_term(term);
    }

    pub fn toggle_show_completed(&mut self) {
        self.query.show_completed = !self.query.show_completed;
        self.pagination.reset();
        self.selected = 0;
        self.recompute();
    }

    pub fn toggle_sort_by_due_date(&mut self) {
        self.query.sort_by_due_date = !self.query.sort_by_due_date;
        self.pagination.reset();
        self.selected = 0;
        self.recompute();
    }

    pub fn next_page(&mut self) {
        let count = query::run_query(self.manager.items(), &self.query).len();
        let before = self.pagination.current_page();
        self.pagination.next(count);
        if self.pagination.current_page() != before {
            self.selected = 0;
        }
        self.recompute();
    }

    pub fn previous_page(&mut self) {
        let before = self.pagination.current_page();
        self.pagination.previous();
        if self.pagination.current_page() != before {
            self.selected = 0;
        }
        self.recompute();
    }

    pub fn select_next(&mut self) {
        let len = self.view().page.len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    // --- form ---

    pub fn begin_add(&mut self) {
        self.form = Form::default();
        self.input_mode = InputMode::EditingTitle;
    }

    pub fn begin_edit_selected(&mut self) {
        let Some(form) = self.selected_item().map(Form::for_item) else {
            return;
        };
        self.form = form;
        self.input_mode = InputMode::EditingTitle;
    }

    pub fn cancel_form(&mut self) {
        self.form = Form::default();
        self.input_mode = InputMode::Normal;
    }

    /// Enter on a form field: move to the next field, or submit from the last one.
    pub fn advance_form(&mut self) {
        self.input_mode = match self.input_mode {
            InputMode::EditingTitle => InputMode::EditingDescription,
            InputMode::EditingDescription => InputMode::EditingDueDate,
            InputMode::EditingDueDate => {
                self.submit_form();
                return;
            }
            other => other,
        };
    }

    pub fn form_field_mut(&mut self) -> Option<&mut String> {
        match self.input_mode {
            InputMode::EditingTitle => Some(&mut self.form.title),
            InputMode::EditingDescription => Some(&mut self.form.description),
            InputMode::EditingDueDate => Some(&mut self.form.due_date),
            _ => None,
        }
    }

    /// Validation failures stay on the form and nothing is sent.
    pub fn submit_form(&mut self) {
        let draft = match self.form.to_draft() {
            Ok(d) => d,
            Err(e) => {
                self.form.error = Some(e.to_string());
                return;
            }
        };

        let request = match self.form.editing {
            None => Some(self.manager.prepare_create(draft)),
            Some(id) => self.manager.list().get(id).map(|existing| {
                let item = Item {
                    title: draft.title().to_string(),
                    description: draft.description().to_string(),
                    date: Some(draft.date()),
                    ..existing.clone()
                };
                self.manager.prepare_edit(id, item)
            }),
        };

        match request {
            Some(req) => {
                self.submit(req);
                self.cancel_form();
            }
            None => {
                self.form.error = Some("This item no longer exists.".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item(id: i64, title: &str, is_done: bool) -> Item {
        Item {
            id,
            title: title.into(),
            description: format!("{} description", title),
            date: None,
            is_done,
        }
    }

    fn app_with(items: Vec<Item>, rows: usize) -> App {
        let mut app = App::new(Arc::new(MemoryStore::with_items(items)), rows);
        app.refresh();
        app.settle();
        app
    }

    fn fill_form(app: &mut App, title: &str, description: &str, due: &str) {
        app.begin_add();
        app.form.title = title.into();
        app.form.description = description.into();
        app.form.due_date = due.into();
        app.input_mode = InputMode::EditingDueDate;
    }

    #[test]
    fn invalid_form_never_reaches_the_store() {
        let mut app = app_with(vec![], 4);
        fill_form(&mut app, "", "desc", "2099-01-01");
        app.advance_form();
        assert_eq!(app.form.error.as_deref(), Some("Title must be at least 1 character long"));
        assert!(!app.is_loading());
        assert_eq!(app.input_mode, InputMode::EditingDueDate);

        app.form.title = "t".into();
        app.form.due_date.clear();
        app.submit_form();
        assert_eq!(app.form.error.as_deref(), Some("Please enter a due date"));
        assert!(!app.is_loading());
    }

    #[test]
    fn submitted_form_creates_item() {
        let mut app = app_with(vec![], 4);
        fill_form(&mut app, "Buy milk", "2%", "2099-06-01");
        app.advance_form();
        assert_eq!(app.input_mode, InputMode::Normal);
        app.settle();
        assert_eq!(app.items().len(), 1);
        assert_eq!(app.items()[0].id, 1);
        assert!(!app.status.as_ref().unwrap().is_failure());
    }

    #[test]
    fn edit_keeps_id_and_done_flag() {
        let mut app = app_with(vec![item(1, "A", false)], 4);
        app.query.show_completed = true;
        app.toggle_done(1);
        app.settle();
        app.begin_edit_selected();
        assert_eq!(app.form.editing, Some(1));
        app.form.title = "A2".into();
        app.form.due_date = "2099-01-01".into();
        app.submit_form();
        app.settle();
        let edited = &app.items()[0];
        assert_eq!(edited.id, 1);
        assert_eq!(edited.title, "A2");
        assert!(edited.is_done);
    }

    #[test]
    fn query_changes_reset_page() {
        let items = (1..=9).map(|i| item(i, &format!("task {}", i), false)).collect();
        let mut app = app_with(items, 4);
        app.next_page();
        app.next_page();
        assert_eq!(app.current_page(), 3);
        app.toggle_sort_by_due_date();
        assert_eq!(app.current_page(), 1);

        app.next_page();
        app.toggle_show_completed();
        assert_eq!(app.current_page(), 1);

        app.next_page();
        app.push_search_char('t');
        assert_eq!(app.current_page(), 1);
    }

    #[test]
    fn deleting_last_item_on_page_clamps() {
        let items = (1..=5).map(|i| item(i, "t", false)).collect();
        let mut app = app_with(items, 4);
        app.next_page();
        assert_eq!(app.current_page(), 2);
        app.delete_selected();
        app.settle();
        assert_eq!(app.items().len(), 4);
        assert_eq!(app.current_page(), 1);
        assert_eq!(app.view().total_pages, 1);
    }

    #[test]
    fn completing_hides_item_and_clamps_selection() {
        let mut app = app_with(vec![item(1, "A", false), item(2, "B", false)], 4);
        app.select_next();
        assert_eq!(app.selected, 1);
        app.toggle_selected();
        app.settle();
        assert_eq!(app.view().page.len(), 1);
        assert_eq!(app.selected, 0);
        assert_eq!(app.manager().completed_count(), 1);
    }

    #[test]
    fn overdue_item_can_be_renamed_without_touching_its_date() {
        let overdue = chrono::TimeZone::with_ymd_and_hms(&Utc, 2020, 1, 1, 0, 0, 0).unwrap();
        let mut app = app_with(vec![Item { date: Some(overdue), ..item(1, "A", false) }], 4);
        app.begin_edit_selected();
        app.form.title = "A renamed".into();
        app.submit_form();
        assert_eq!(app.form.error, None);
        assert_eq!(app.input_mode, InputMode::Normal);
        app.settle();

        assert_eq!(app.items()[0].title, "A renamed");
        assert_eq!(app.items()[0].date, Some(overdue));
    }

    #[test]
    fn changing_an_overdue_date_still_rejects_the_past() {
        let overdue = chrono::TimeZone::with_ymd_and_hms(&Utc, 2020, 1, 1, 0, 0, 0).unwrap();
        let mut app = app_with(vec![Item { date: Some(overdue), ..item(1, "A", false) }], 4);
        app.begin_edit_selected();
        app.form.due_date = "2020-01-02".into();
        app.submit_form();
        assert_eq!(app.form.error.as_deref(), Some("Due date cannot be in the past"));
        app.settle();
        assert_eq!(app.items()[0].date, Some(overdue));
    }

    #[test]
    fn stale_fetch_is_replaced_by_a_fresh_one() {
        let mut app = app_with(vec![item(1, "A", false), item(2, "B", false)], 4);
        let store = app.manager.store();
        let fetch = app.manager.prepare_refresh().execute(store.as_ref());

        assert!(!app.manager.remove(1).is_failure());
        app.apply(fetch);
        assert!(app.is_loading());
        app.settle();

        assert_eq!(app.items(), store.fetch_all().unwrap().as_slice());
        assert_eq!(app.items().iter().map(|i| i.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn page_navigation_stops_at_edges() {
        let items = (1..=5).map(|i| item(i, "t", false)).collect();
        let mut app = app_with(items, 4);
        app.previous_page();
        assert_eq!(app.current_page(), 1);
        app.next_page();
        app.next_page();
        assert_eq!(app.current_page(), 2);
    }
}
