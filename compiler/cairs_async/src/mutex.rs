//! `AsyncMutex` and `AsyncRefCell` (§4.8 C9): a FIFO-fair cooperative lock
//! and a mutex-guarded single-value holder, using the same ticket-queue
//! fairness discipline as [`crate::channel::AsyncChannel`].

use cairs_ir::Value;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct Inner {
    locked: bool,
    queue: VecDeque<u64>,
    next_ticket: u64,
}

pub struct AsyncMutex {
    inner: Mutex<Inner>,
    released: Condvar,
}

impl Default for AsyncMutex {
    fn default() -> Self {
        AsyncMutex::new()
    }
}

impl AsyncMutex {
    #[must_use]
    pub fn new() -> Self {
        AsyncMutex { inner: Mutex::new(Inner { locked: false, queue: VecDeque::new(), next_ticket: 0 }), released: Condvar::new() }
    }

    /// Acquire the lock, parking FIFO behind anyone already waiting.
    /// Returns a guard that releases on drop — including on an unwind out of
    /// [`AsyncMutex::with_lock`]'s closure — so there is no "forgot to
    /// release on the error path" failure mode (§4.8 `withLock` "must
    /// release on any exit path, including failure").
    #[must_use]
    pub fn lock(&self) -> AsyncMutexGuard<'_> {
        let mut inner = self.inner.lock();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.queue.push_back(ticket);
        while inner.locked || inner.queue.front() != Some(&ticket) {
            self.released.wait(&mut inner);
        }
        inner.queue.pop_front();
        inner.locked = true;
        AsyncMutexGuard { mutex: self }
    }

    pub fn with_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock();
        f()
    }

    fn release(&self) {
        let mut inner = self.inner.lock();
        inner.locked = false;
        drop(inner);
        self.released.notify_all();
    }
}

pub struct AsyncMutexGuard<'a> {
    mutex: &'a AsyncMutex,
}

impl Drop for AsyncMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

/// A mutex-guarded holder of exactly one [`Value`] (§4.8 C9). Serializes
/// `read`/`write` so `update` is an atomic read-modify-write.
pub struct AsyncRefCell {
    cell: Mutex<Value>,
}

impl AsyncRefCell {
    #[must_use]
    pub fn new(initial: Value) -> Self {
        AsyncRefCell { cell: Mutex::new(initial) }
    }

    #[must_use]
    pub fn read(&self) -> Value {
        self.cell.lock().clone()
    }

    pub fn write(&self, value: Value) {
        *self.cell.lock() = value;
    }

    /// Atomic read-modify-write: `f` runs with the cell's mutex held, so no
    /// concurrent reader can observe a torn update.
    pub fn update(&self, f: impl FnOnce(Value) -> Value) -> Value {
        let mut guard = self.cell.lock();
        let next = f(guard.clone());
        *guard = next.clone();
        next
    }

    /// The "unsafe direct accessor" the spec mentions is for diagnostics
    /// tooling, not for bypassing the lock — `unsafe` is unused here on
    /// purpose; this is just `read` under a name that signals callers should
    /// treat the snapshot as stale the instant another task writes.
    #[must_use]
    pub fn diagnostic_snapshot(&self) -> Value {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn with_lock_serializes_increments_across_threads() {
        let mutex = Arc::new(AsyncMutex::new());
        let counter = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mutex = mutex.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        mutex.with_lock(|| {
                            let v = counter.load(Ordering::Relaxed);
                            counter.store(v + 1, Ordering::Relaxed);
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 800);
    }

    #[test]
    fn ref_cell_update_is_atomic() {
        let cell = Arc::new(AsyncRefCell::new(Value::Int(0)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        cell.update(|v| match v {
                            Value::Int(n) => Value::Int(n + 1),
                            other => other,
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cell.read(), Value::Int(800));
    }
}
