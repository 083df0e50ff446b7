//! Named channel and ref-cell stores (§4.8 C9): get-or-create collections
//! keyed by id, backing the PIR `channel{...}` node and any host-level code
//! that needs a ref cell visible across tasks.

use crate::channel::{AsyncChannel, ChannelType};
use crate::mutex::AsyncRefCell;
use cairs_ir::Value;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct ChannelStore {
    entries: Mutex<FxHashMap<u64, Arc<AsyncChannel>>>,
    next_id: AtomicU64,
}

impl ChannelStore {
    #[must_use]
    pub fn new() -> Self {
        ChannelStore::default()
    }

    /// Create a fresh channel and return its id alongside the handle
    /// (§4.10 `channel{...}` allocates a new channel on every reduction).
    pub fn create(&self, channel_type: ChannelType, capacity: i64) -> Result<(u64, Arc<AsyncChannel>), Value> {
        let channel = Arc::new(AsyncChannel::new(channel_type, capacity)?);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(id, channel.clone());
        Ok((id, channel))
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<Arc<AsyncChannel>> {
        self.entries.lock().get(&id).cloned()
    }

    /// Remove and close the channel (§4.8 `delete` "closes channels").
    pub fn delete(&self, id: u64) -> bool {
        match self.entries.lock().remove(&id) {
            Some(channel) => {
                channel.close();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        for channel in entries.values() {
            channel.close();
        }
        entries.clear();
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }
}

#[derive(Default)]
pub struct RefCellStore {
    entries: Mutex<FxHashMap<String, Arc<AsyncRefCell>>>,
}

impl RefCellStore {
    #[must_use]
    pub fn new() -> Self {
        RefCellStore::default()
    }

    #[must_use]
    pub fn get_or_create(&self, name: &str, initial: impl FnOnce() -> Value) -> Arc<AsyncRefCell> {
        let mut entries = self.entries.lock();
        entries.entry(name.to_string()).or_insert_with(|| Arc::new(AsyncRefCell::new(initial()))).clone()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<AsyncRefCell>> {
        self.entries.lock().get(name).cloned()
    }

    pub fn delete(&self, name: &str) -> bool {
        self.entries.lock().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_channels_get_distinct_ids() {
        let store = ChannelStore::new();
        let (a, _) = store.create(ChannelType::Spsc, 1).unwrap();
        let (b, _) = store.create(ChannelType::Spsc, 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn delete_closes_the_channel() {
        let store = ChannelStore::new();
        let (id, channel) = store.create(ChannelType::Spsc, 1).unwrap();
        assert!(store.delete(id));
        assert!(channel.is_closed());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn get_or_create_returns_the_same_cell_on_repeat_calls() {
        let store = RefCellStore::new();
        let a = store.get_or_create("counter", || Value::Int(0));
        a.write(Value::Int(5));
        let b = store.get_or_create("counter", || Value::Int(0));
        assert_eq!(b.read(), Value::Int(5));
    }
}
