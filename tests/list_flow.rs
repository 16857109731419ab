//! End-to-end flows through `App` and `ListManager` against the in-memory store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use taskdeck::app::App;
use taskdeck::error::StoreError;
use taskdeck::item::{Draft, Item, RawDate, normalize_date};
use taskdeck::list::{ListManager, Notice};
use taskdeck::store::{ItemStore, MemoryStore};

fn item(id: i64, title: &str, date: Option<&str>, is_done: bool) -> Item {
    Item {
        id,
        title: title.to_string(),
        description: String::new(),
        date: date.and_then(|d| normalize_date(RawDate::Text(d.to_string()))),
        is_done,
    }
}

fn ids(items: &[&Item]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}

#[test]
fn completed_items_are_hidden_by_default() {
    let store = Arc::new(MemoryStore::with_items(vec![
        item(1, "A", None, false),
        item(2, "B", Some("2030-01-01"), true),
    ]));
    let mut app = App::new(store, 4);
    app.refresh();
    app.settle();

    assert_eq!(ids(&app.view().page), vec![1]);

    app.toggle_show_completed();
    assert_eq!(ids(&app.view().page), vec![1, 2]);
}

#[test]
fn sorted_view_puts_undated_items_last_across_pages() {
    let store = Arc::new(MemoryStore::with_items(vec![
        item(1, "none-1", None, false),
        item(2, "june", Some("2030-06-01"), false),
        item(3, "none-2", None, false),
        item(4, "jan", Some("2030-01-01"), false),
        item(5, "march", Some("2030-03-01"), false),
    ]));
    let mut app = App::new(store, 4);
    app.refresh();
    app.settle();

    app.toggle_sort_by_due_date();
    assert_eq!(ids(&app.view().page), vec![4, 5, 2, 1]);
    app.next_page();
    assert_eq!(ids(&app.view().page), vec![3]);
    assert_eq!(app.view().total_pages, 2);
}

#[test]
fn search_narrows_and_resets_paging() {
    let items = (1..=10)
        .map(|i| item(i, &format!("{} {}", if i % 2 == 0 { "Even" } else { "Odd" }, i), None, false))
        .collect();
    let mut app = App::new(Arc::new(MemoryStore::with_items(items)), 4);
    app.refresh();
    app.settle();

    app.next_page();
    app.next_page();
    assert_eq!(app.current_page(), 3);

    app.set_search_term("EVEN");
    assert_eq!(app.current_page(), 1);
    assert_eq!(app.view().filtered_count, 5);
    assert_eq!(ids(&app.view().page), vec![2, 4, 6, 8]);

    app.set_search_term("");
    assert_eq!(app.view().filtered_count, 10);
}

#[test]
fn create_toggle_delete_round() {
    let store = Arc::new(MemoryStore::new());
    let mut mgr = ListManager::new(store.clone());

    let due = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
    mgr.create(Draft::new("Buy milk", "2%", Some(due)).unwrap());
    let created = mgr.items()[0].clone();
    assert_eq!(created.id, 1);
    assert!(!created.is_done);

    mgr.toggle_done(1).unwrap();
    let toggled = mgr.items()[0].clone();
    assert_eq!(toggled, Item { is_done: true, ..created });

    assert_eq!(mgr.remove(1), Notice::success("Item has been deleted."));
    assert!(mgr.items().is_empty());
    assert!(store.fetch_all().unwrap().is_empty());

    // The counter keeps going after a delete.
    mgr.create(Draft::new("Again", "x", Some(due)).unwrap());
    assert_eq!(mgr.items()[0].id, 2);
}

#[test]
fn edit_of_unknown_id_reports_and_keeps_state() {
    let store = Arc::new(MemoryStore::with_items(vec![item(1, "A", None, false)]));
    let mut mgr = ListManager::new(store);
    mgr.refresh();
    let before = mgr.list().clone();

    let notice = mgr.edit(99, item(99, "ghost", None, false));
    assert!(notice.is_failure());
    assert_eq!(mgr.list(), &before);
}

#[test]
fn transport_failure_keeps_visible_page() {
    let store = Arc::new(MemoryStore::with_items(vec![
        item(1, "A", None, false),
        item(2, "B", None, false),
    ]));
    let mut app = App::new(store.clone(), 4);
    app.refresh();
    app.settle();
    let before: Vec<Item> = app.view().page.into_iter().cloned().collect();

    store.fail_next(StoreError::Transport("connection reset".into()));
    app.delete_selected();
    app.settle();

    let after: Vec<Item> = app.view().page.into_iter().cloned().collect();
    assert_eq!(before, after);
    let status = app.status.clone().unwrap();
    assert!(status.is_failure());
    assert_eq!(status.message, "Error deleting the item.");
}
