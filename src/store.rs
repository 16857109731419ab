// store.rs

use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::item::{Draft, Item};

/// The four operations the list needs from whatever holds the items.
/// `HttpItemStore` talks to the REST service; `MemoryStore` keeps them in-process.
pub trait ItemStore: Send + Sync {
    fn fetch_all(&self) -> StoreResult<Vec<Item>>;
    fn create(&self, draft: &Draft) -> StoreResult<Item>;
    fn update(&self, id: i64, item: &Item) -> StoreResult<Item>;
    fn remove(&self, id: i64) -> StoreResult<()>;
}

#[derive(Default)]
struct MemoryInner {
    items: Vec<Item>,
    last_id: i64,
    fail_next: Option<StoreError>,
}

/// In-process store with the REST service's semantics. Ids come from a
/// counter that only moves forward, so a deleted id is never handed out again.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        let last_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        Self {
            inner: Mutex::new(MemoryInner {
                items,
                last_id,
                fail_next: None,
            }),
        }
    }

    /// Makes the next call fail with `err` without touching the stored items.
    pub fn fail_next(&self, err: StoreError) {
        self.lock().fail_next = Some(err);
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn take_failure(inner: &mut MemoryInner) -> StoreResult<()> {
    match inner.fail_next.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl ItemStore for MemoryStore {
    fn fetch_all(&self) -> StoreResult<Vec<Item>> {
        let mut inner = self.lock();
        take_failure(&mut inner)?;
        Ok(inner.items.clone())
    }

    fn create(&self, draft: &Draft) -> StoreResult<Item> {
        let mut inner = self.lock();
        take_failure(&mut inner)?;
        if draft.title().is_empty() {
            return Err(StoreError::Rejected {
                status: 400,
                message: "Title is required".to_string(),
            });
        }
        inner.last_id += 1;
        let item = Item {
            id: inner.last_id,
            title: draft.title().to_string(),
            description: draft.description().to_string(),
            date: Some(draft.date()),
            is_done: false,
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    fn update(&self, id: i64, item: &Item) -> StoreResult<Item> {
        let mut inner = self.lock();
        take_failure(&mut inner)?;
        let slot = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound { id })?;
        *slot = Item { id, ..item.clone() };
        Ok(slot.clone())
    }

    fn remove(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.lock();
        take_failure(&mut inner)?;
        let pos = inner
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(StoreError::NotFound { id })?;
        inner.items.remove(pos);
        Ok(())
    }
}
