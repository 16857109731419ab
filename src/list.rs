// list.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::item::{Draft, Item};
#[cfg(test)]
use crate::item::{SAMPLE_DESCRIPTION, SAMPLE_TITLE};
use crate::store::ItemStore;

/// The authoritative collection, in server order. Written only through
/// `ListManager::apply`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemList {
    items: Vec<Item>,
}

impl ItemList {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    /// Appends, unless an entry with that id already arrived through a refetch.
    fn insert(&mut self, item: Item) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    /// Replaces in place; returns false when the id is gone.
    fn replace(&mut self, item: Item) -> bool {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    Edit,
    Toggle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateKind {
    User,
    Sample,
}

/// One store call, prepared from the current local state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// `epoch` is the manager's mutation count when the fetch was prepared.
    FetchAll { epoch: u64 },
    Create { draft: Draft, kind: CreateKind },
    Update { id: i64, item: Item, kind: UpdateKind },
    Remove { id: i64 },
}

/// What came back for one `Request`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Fetched {
        epoch: u64,
        result: StoreResult<Vec<Item>>,
    },
    Created {
        kind: CreateKind,
        title: String,
        result: StoreResult<Item>,
    },
    Updated {
        id: i64,
        kind: UpdateKind,
        title: String,
        result: StoreResult<Item>,
    },
    Removed {
        id: i64,
        result: StoreResult<()>,
    },
}

impl Request {
    pub fn execute(self, store: &dyn ItemStore) -> Outcome {
        match self {
            Request::FetchAll { epoch } => Outcome::Fetched {
                epoch,
                result: store.fetch_all(),
            },
            Request::Create { draft, kind } => Outcome::Created {
                kind,
                title: draft.title().to_string(),
                result: store.create(&draft),
            },
            Request::Update { id, item, kind } => Outcome::Updated {
                id,
                kind,
                title: item.title.clone(),
                result: store.update(id, &item),
            },
            Request::Remove { id } => Outcome::Removed {
                id,
                result: store.remove(id),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// User-visible message produced by applying an outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.level == NoticeLevel::Failure
    }
}

fn failure_notice(err: &StoreError, generic: &str) -> Notice {
    match err {
        StoreError::NotFound { id } => Notice::failure(format!("Item {} no longer exists.", id)),
        _ => Notice::failure(generic),
    }
}

/// Owns the item list and keeps it converged with the store.
pub struct ListManager {
    store: Arc<dyn ItemStore>,
    list: ItemList,
    /// Successful mutations applied so far. A fetch prepared at an older
    /// epoch may predate one of them and is not trusted.
    epoch: u64,
}

impl ListManager {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            list: ItemList::default(),
            epoch: 0,
        }
    }

    pub fn store(&self) -> Arc<dyn ItemStore> {
        Arc::clone(&self.store)
    }

    pub fn list(&self) -> &ItemList {
        &self.list
    }

    pub fn items(&self) -> &[Item] {
        self.list.items()
    }

    pub fn completed_count(&self) -> usize {
        self.list.items().iter().filter(|i| i.is_done).count()
    }

    pub fn prepare_refresh(&self) -> Request {
        Request::FetchAll { epoch: self.epoch }
    }

    /// True for a fetched list that a mutation applied since has outdated.
    /// The caller should fetch again instead of applying it.
    pub fn is_stale(&self, outcome: &Outcome) -> bool {
        matches!(outcome, Outcome::Fetched { epoch, result: Ok(_) } if *epoch != self.epoch)
    }

    pub fn prepare_create(&self, draft: Draft) -> Request {
        Request::Create {
            draft,
            kind: CreateKind::User,
        }
    }

    pub fn prepare_sample(&self) -> Request {
        Request::Create {
            draft: Draft::sample(Utc::now()),
            kind: CreateKind::Sample,
        }
    }

    pub fn prepare_edit(&self, id: i64, item: Item) -> Request {
        Request::Update {
            id,
            item: Item { id, ..item },
            kind: UpdateKind::Edit,
        }
    }

    /// `None` when the id is not in the local list; nothing is sent then.
    pub fn prepare_toggle(&self, id: i64) -> Option<Request> {
        let current = self.list.get(id)?;
        Some(Request::Update {
            id,
            item: Item {
                is_done: !current.is_done,
                ..current.clone()
            },
            kind: UpdateKind::Toggle,
        })
    }

    pub fn prepare_remove(&self, id: i64) -> Request {
        Request::Remove { id }
    }

    /// Merges one outcome into the list. Failures never touch the list; a
    /// success replaces exactly the entry the server answered for.
    pub fn apply(&mut self, outcome: Outcome) -> Notice {
        match outcome {
            Outcome::Fetched { epoch, result: Ok(_) } if epoch != self.epoch => {
                info!(epoch, current = self.epoch, "discarding item list fetched before a later change");
                Notice::success("Items changed while loading; list kept.")
            }
            Outcome::Fetched { result: Ok(items), .. } => {
                info!(count = items.len(), "fetched items");
                self.list.replace_all(items);
                Notice::success(format!("Loaded {} items.", self.list.len()))
            }
            Outcome::Fetched { result: Err(e), .. } => {
                warn!(error = %e, "fetching items failed");
                Notice::failure("Error loading items.")
            }
            Outcome::Created { kind, title, result } => match result {
                Ok(item) => {
                    info!(id = item.id, "item created");
                    self.list.insert(item);
                    self.epoch += 1;
                    match kind {
                        CreateKind::User => Notice::success(format!("Item \"{}\" has been created.", title)),
                        CreateKind::Sample => Notice::success("Sample Item has been added."),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "creating item failed");
                    match kind {
                        CreateKind::User => failure_notice(&e, "Error creating the item."),
                        CreateKind::Sample => failure_notice(&e, "Error adding the item."),
                    }
                }
            },
            Outcome::Updated { id, kind, title, result } => match result {
                Ok(item) => {
                    if item.id != id {
                        warn!(id, returned = item.id, "server answered for a different id");
                    }
                    let is_done = item.is_done;
                    if self.list.replace(Item { id, ..item }) {
                        self.epoch += 1;
                        info!(id, ?kind, "item updated");
                    } else {
                        info!(id, "update arrived for an item no longer listed; dropped");
                    }
                    match (kind, is_done) {
                        (UpdateKind::Edit, _) => Notice::success(format!("Item \"{}\" has been updated.", title)),
                        (UpdateKind::Toggle, true) => Notice::success(format!("Item \"{}\" marked as done.", title)),
                        (UpdateKind::Toggle, false) => Notice::success(format!("Item \"{}\" reopened.", title)),
                    }
                }
                Err(e) => {
                    warn!(id, error = %e, "updating item failed");
                    failure_notice(&e, "Error updating the item.")
                }
            },
            Outcome::Removed { id, result } => match result {
                Ok(()) => {
                    self.list.remove(id);
                    self.epoch += 1;
                    info!(id, "item deleted");
                    Notice::success("Item has been deleted.")
                }
                Err(e) => {
                    warn!(id, error = %e, "deleting item failed");
                    failure_notice(&e, "Error deleting the item.")
                }
            },
        }
    }

    fn run(&mut self, request: Request) -> Notice {
        let outcome = request.execute(self.store.as_ref());
        self.apply(outcome)
    }

    pub fn refresh(&mut self) -> Notice {
        let req = self.prepare_refresh();
        self.run(req)
    }

    pub fn create(&mut self, draft: Draft) -> Notice {
        let req = self.prepare_create(draft);
        self.run(req)
    }

    pub fn add_sample(&mut self) -> Notice {
        let req = self.prepare_sample();
        self.run(req)
    }

    pub fn edit(&mut self, id: i64, item: Item) -> Notice {
        let req = self.prepare_edit(id, item);
        self.run(req)
    }

    pub fn toggle_done(&mut self, id: i64) -> Option<Notice> {
        let req = self.prepare_toggle(id)?;
        Some(self.run(req))
    }

    pub fn remove(&mut self, id: i64) -> Notice {
        let req = self.prepare_remove(id);
        self.run(req)
    }
}
