//! `AsyncBarrier` (§4.9 C10): cooperative fork/join over a fixed task count.
//! Released waiters all unblock from the same `notify_all`, so "FIFO arrival
//! order" (§5) falls out of parking_lot's own condvar wakeup order within a
//! single release — there is nothing left to queue once everyone wakes at
//! once.

use cairs_ir::{ErrorCode, Value};
use parking_lot::{Condvar, Mutex};

struct Inner {
    count: u64,
    arrived: u64,
    generation: u64,
}

pub struct AsyncBarrier {
    inner: Mutex<Inner>,
    released: Condvar,
}

impl AsyncBarrier {
    pub fn new(count: u64) -> Result<Self, Value> {
        if count == 0 {
            return Err(Value::error_with(ErrorCode::DomainError, "barrier count must be positive"));
        }
        Ok(AsyncBarrier { inner: Mutex::new(Inner { count, arrived: 0, generation: 0 }), released: Condvar::new() })
    }

    /// Decrement the count; suspend until it reaches zero, then release
    /// every waiter together.
    pub fn wait(&self) {
        let mut inner = self.inner.lock();
        let my_generation = inner.generation;
        inner.arrived += 1;
        if inner.arrived == inner.count {
            inner.arrived = 0;
            inner.generation += 1;
            drop(inner);
            self.released.notify_all();
            return;
        }
        while inner.generation == my_generation {
            self.released.wait(&mut inner);
        }
    }

    pub fn reset(&self, count: u64) -> Result<(), Value> {
        if count == 0 {
            return Err(Value::error_with(ErrorCode::DomainError, "barrier count must be positive"));
        }
        let mut inner = self.inner.lock();
        inner.count = count;
        inner.arrived = 0;
        inner.generation += 1;
        drop(inner);
        self.released.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_count_is_rejected() {
        assert!(AsyncBarrier::new(0).is_err());
    }

    #[test]
    fn all_waiters_release_once_count_is_reached() {
        let barrier = Arc::new(AsyncBarrier::new(4).unwrap());
        let past = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let barrier = barrier.clone();
                let past = past.clone();
                thread::spawn(move || {
                    barrier.wait();
                    past.fetch_add(1, Ordering::SeqCst)
                })
            })
            .collect();
        let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().sum::<u64>(), 0 + 1 + 2 + 3);
    }

    #[test]
    fn reset_allows_reuse_with_a_new_count() {
        let barrier = AsyncBarrier::new(2).unwrap();
        barrier.reset(1).unwrap();
        barrier.wait(); // must not block: count is now 1
    }
}
