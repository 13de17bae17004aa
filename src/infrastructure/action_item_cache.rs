use crate::domain::models::ActionItem;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_now_provider() -> NowProvider {
    Arc::new(Utc::now)
}

/// Read-through cache for action items. Holds the last fetched list with its
/// fetch time plus individually fetched items. Staleness policy lives in the
/// service; the cache only records when data arrived.
pub trait ActionItemCacheRepository: Send + Sync {
    fn put_list(&self, items: Vec<ActionItem>);
    /// Returns the cached list only when it is younger than `max_age`.
    fn fresh_list(&self, max_age: Duration) -> Option<Vec<ActionItem>>;
    fn put_item(&self, item: ActionItem);
    fn get_item(&self, id: &str) -> Option<ActionItem>;
    fn invalidate_list(&self);
    fn invalidate_item(&self, id: &str);
    fn clear(&self);
}

pub struct InMemoryActionItemCache {
    state: Mutex<CacheState>,
    now: NowProvider,
}

#[derive(Default)]
struct CacheState {
    list: Option<CachedList>,
    items: HashMap<String, ActionItem>,
}

struct CachedList {
    fetched_at: DateTime<Utc>,
    items: Vec<ActionItem>,
}

impl InMemoryActionItemCache {
    pub fn new(now: NowProvider) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            now,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for InMemoryActionItemCache {
    fn default() -> Self {
        Self::new(system_now_provider())
    }
}

impl ActionItemCacheRepository for InMemoryActionItemCache {
    fn put_list(&self, items: Vec<ActionItem>) {
        let fetched_at = (self.now)();
        let mut state = self.lock();
        for item in &items {
            state.items.insert(item.id.clone(), item.clone());
        }
        state.list = Some(CachedList { fetched_at, items });
    }

    fn fresh_list(&self, max_age: Duration) -> Option<Vec<ActionItem>> {
        let now = (self.now)();
        let state = self.lock();
        let cached = state.list.as_ref()?;
        if now.signed_duration_since(cached.fetched_at) >= max_age {
            return None;
        }
        Some(cached.items.clone())
    }

    fn put_item(&self, item: ActionItem) {
        self.lock().items.insert(item.id.clone(), item);
    }

    fn get_item(&self, id: &str) -> Option<ActionItem> {
        self.lock().items.get(id).cloned()
    }

    fn invalidate_list(&self) {
        self.lock().list = None;
    }

    fn invalidate_item(&self, id: &str) {
        self.lock().items.remove(id);
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.list = None;
        state.items.clear();
    }
}
