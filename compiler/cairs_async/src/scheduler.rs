//! The task scheduler (§4.9 C10): a default scheduler that runs every
//! spawned task eagerly on its own OS thread, and a deterministic scheduler
//! with four ordering modes for reproducible tests.
//!
//! The deterministic scheduler never spawns a real thread — every mode
//! resolves a task's closure synchronously on whichever thread drives it.
//! Re-introducing genuine OS concurrency there would bring back the very
//! nondeterminism the mode exists to avoid; "concurrently" in the
//! `breadth-first` mode means "as one batch, in queue order" rather than
//! "on separate threads" (documented as a deliberate reading, not something
//! read off the wire).

use cairs_ir::{ErrorCode, Value};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

pub type TaskId = String;
pub type TaskFn = Box<dyn FnOnce() -> Value + Send>;

thread_local! {
    static CURRENT_TASK: RefCell<Option<TaskId>> = const { RefCell::new(None) };
}

/// The scheduler interface every concurrency primitive and the PIR
/// evaluator are written against (§4.9 C10).
pub trait Scheduler: Send + Sync {
    fn spawn(&self, id: TaskId, task: TaskFn);
    fn await_task(&self, id: &str) -> Value;
    fn cancel(&self, id: &str);
    fn is_complete(&self, id: &str) -> bool;
    /// `None` means the budget has room; `Some(error)` means it is spent.
    fn check_global_steps(&self) -> Option<Value>;
    fn current_task_id(&self) -> Option<TaskId>;
    fn active_task_count(&self) -> usize;
    fn global_steps(&self) -> u64;
    fn dispose(&self);
}

fn disposed_error() -> Value {
    Value::error_with(ErrorCode::DomainError, "scheduler is disposed")
}

fn cancelled_error() -> Value {
    Value::error_with(ErrorCode::DomainError, "task was cancelled")
}

// ---------------------------------------------------------------- default --

struct TaskEntry {
    rx: crossbeam::channel::Receiver<Value>,
    cached: Mutex<Option<Value>>,
    completed: AtomicBool,
    cancelled: AtomicBool,
}

/// Cooperative, eager: `spawn` starts a real thread immediately; `await`
/// blocks on that thread's result channel, caching it so a task can be
/// re-awaited (§4.9 "Default scheduler").
pub struct DefaultScheduler {
    tasks: Mutex<FxHashMap<TaskId, Arc<TaskEntry>>>,
    global_steps: AtomicU64,
    global_max_steps: u64,
    yield_interval: u64,
    disposed: AtomicBool,
    disposed_rx: crossbeam::channel::Receiver<()>,
    disposed_tx: Mutex<Option<crossbeam::channel::Sender<()>>>,
}

impl DefaultScheduler {
    #[must_use]
    pub fn new(global_max_steps: u64, yield_interval: u64) -> Self {
        let (disposed_tx, disposed_rx) = crossbeam::channel::unbounded();
        DefaultScheduler {
            tasks: Mutex::new(FxHashMap::default()),
            global_steps: AtomicU64::new(0),
            global_max_steps,
            yield_interval,
            disposed: AtomicBool::new(false),
            disposed_rx,
            disposed_tx: Mutex::new(Some(disposed_tx)),
        }
    }
}

impl Default for DefaultScheduler {
    fn default() -> Self {
        DefaultScheduler::new(1_000_000, 100)
    }
}

impl Scheduler for DefaultScheduler {
    fn spawn(&self, id: TaskId, task: TaskFn) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let (tx, rx) = crossbeam::channel::bounded(1);
        let entry = Arc::new(TaskEntry {
            rx,
            cached: Mutex::new(None),
            completed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        });
        self.tasks.lock().insert(id.clone(), entry.clone());
        thread::spawn(move || {
            CURRENT_TASK.with(|c| *c.borrow_mut() = Some(id));
            let value = task();
            entry.completed.store(true, Ordering::SeqCst);
            let _ = tx.send(value);
        });
    }

    fn await_task(&self, id: &str) -> Value {
        if self.disposed.load(Ordering::SeqCst) {
            return disposed_error();
        }
        let Some(entry) = self.tasks.lock().get(id).cloned() else {
            return Value::error_with(ErrorCode::UnknownDefinition, format!("no such task \"{id}\""));
        };
        if entry.cancelled.load(Ordering::SeqCst) {
            return cancelled_error();
        }
        if let Some(cached) = entry.cached.lock().clone() {
            return cached;
        }

        let mut select = crossbeam::channel::Select::new();
        let task_oper = select.recv(&entry.rx);
        let disposed_oper = select.recv(&self.disposed_rx);
        let chosen = select.select();
        let value = if chosen.index() == task_oper {
            match chosen.recv(&entry.rx) {
                Ok(v) => v,
                Err(_) => Value::error_with(ErrorCode::DomainError, "task channel disconnected"),
            }
        } else {
            let _ = chosen.recv(&self.disposed_rx);
            disposed_error()
        };
        *entry.cached.lock() = Some(value.clone());
        value
    }

    fn cancel(&self, id: &str) {
        if let Some(entry) = self.tasks.lock().get(id) {
            entry.cancelled.store(true, Ordering::SeqCst);
        }
    }

    fn is_complete(&self, id: &str) -> bool {
        self.tasks.lock().get(id).is_some_and(|e| e.completed.load(Ordering::SeqCst))
    }

    fn check_global_steps(&self) -> Option<Value> {
        let n = self.global_steps.fetch_add(1, Ordering::Relaxed) + 1;
        if self.yield_interval > 0 && n % self.yield_interval == 0 {
            thread::yield_now();
        }
        if n > self.global_max_steps {
            Some(Value::error(ErrorCode::NonTermination))
        } else {
            None
        }
    }

    fn current_task_id(&self) -> Option<TaskId> {
        CURRENT_TASK.with(|c| c.borrow().clone())
    }

    fn active_task_count(&self) -> usize {
        self.tasks.lock().values().filter(|e| !e.completed.load(Ordering::SeqCst)).count()
    }

    fn global_steps(&self) -> u64 {
        self.global_steps.load(Ordering::Relaxed)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.disposed_tx.lock().take();
    }
}

// ---------------------------------------------------------- deterministic --

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeterministicMode {
    Sequential,
    Parallel,
    BreadthFirst,
    DepthFirst,
}

struct Pending {
    id: TaskId,
    task: TaskFn,
}

#[derive(Default)]
struct DetState {
    wave: VecDeque<Pending>,
    stack: Vec<Pending>,
    lazy: FxHashMap<TaskId, Pending>,
    spawn_order: Vec<TaskId>,
    results: FxHashMap<TaskId, Value>,
    cancelled: FxHashSet<TaskId>,
}

/// Deterministic, for tests (§4.9): four modes controlling *when* a
/// spawned closure actually runs, never true multi-thread concurrency.
pub struct DeterministicScheduler {
    mode: DeterministicMode,
    state: Mutex<DetState>,
    global_steps: AtomicU64,
    global_max_steps: u64,
    disposed: AtomicBool,
}

impl DeterministicScheduler {
    #[must_use]
    pub fn new(mode: DeterministicMode, global_max_steps: u64) -> Self {
        DeterministicScheduler {
            mode,
            state: Mutex::new(DetState::default()),
            global_steps: AtomicU64::new(0),
            global_max_steps,
            disposed: AtomicBool::new(false),
        }
    }

    fn run_one(&self, pending: Pending) {
        CURRENT_TASK.with(|c| *c.borrow_mut() = Some(pending.id.clone()));
        let value = (pending.task)();
        self.state.lock().results.insert(pending.id, value);
        CURRENT_TASK.with(|c| *c.borrow_mut() = None);
    }

    fn drain_until(&self, id: &str) {
        loop {
            if self.state.lock().results.contains_key(id) {
                return;
            }
            let next = {
                let mut state = self.state.lock();
                match self.mode {
                    DeterministicMode::Sequential => return, // spawn already ran it eagerly
                    DeterministicMode::Parallel => state.lazy.remove(id),
                    DeterministicMode::BreadthFirst => state.wave.pop_front(),
                    DeterministicMode::DepthFirst => state.stack.pop(),
                }
            };
            match next {
                Some(p) => self.run_one(p),
                None => return, // nothing left to run; `id` may simply not exist
            }
        }
    }
}

impl Scheduler for DeterministicScheduler {
    fn spawn(&self, id: TaskId, task: TaskFn) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.state.lock().spawn_order.push(id.clone());
        match self.mode {
            DeterministicMode::Sequential => self.run_one(Pending { id, task }),
            DeterministicMode::Parallel => {
                self.state.lock().lazy.insert(id.clone(), Pending { id, task });
            }
            DeterministicMode::BreadthFirst => self.state.lock().wave.push_back(Pending { id, task }),
            DeterministicMode::DepthFirst => {
                self.state.lock().stack.push(Pending { id, task });
                // LIFO: run the whole stack down before returning, so a
                // task's own nested spawns run before any sibling queued
                // ahead of it.
                loop {
                    let next = self.state.lock().stack.pop();
                    match next {
                        Some(p) => self.run_one(p),
                        None => break,
                    }
                }
            }
        }
    }

    fn await_task(&self, id: &str) -> Value {
        if self.disposed.load(Ordering::SeqCst) {
            return disposed_error();
        }
        if self.state.lock().cancelled.contains(id) {
            return cancelled_error();
        }
        self.drain_until(id);
        let state = self.state.lock();
        match state.results.get(id) {
            Some(v) => v.clone(),
            None => Value::error_with(ErrorCode::UnknownDefinition, format!("no such task \"{id}\"")),
        }
    }

    fn cancel(&self, id: &str) {
        self.state.lock().cancelled.insert(id.to_string());
    }

    fn is_complete(&self, id: &str) -> bool {
        self.state.lock().results.contains_key(id)
    }

    fn check_global_steps(&self) -> Option<Value> {
        let n = self.global_steps.fetch_add(1, Ordering::Relaxed) + 1;
        if n > self.global_max_steps {
            Some(Value::error(ErrorCode::NonTermination))
        } else {
            None
        }
    }

    fn current_task_id(&self) -> Option<TaskId> {
        CURRENT_TASK.with(|c| c.borrow().clone())
    }

    fn active_task_count(&self) -> usize {
        let state = self.state.lock();
        state.spawn_order.iter().filter(|id| !state.results.contains_key(id.as_str())).count()
    }

    fn global_steps(&self) -> u64 {
        self.global_steps.load(Ordering::Relaxed)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheduler_awaits_a_spawned_task() {
        let scheduler = DefaultScheduler::default();
        scheduler.spawn("t1".into(), Box::new(|| Value::Int(42)));
        assert_eq!(scheduler.await_task("t1"), Value::Int(42));
        assert!(scheduler.is_complete("t1"));
    }

    #[test]
    fn default_scheduler_supports_re_await() {
        let scheduler = DefaultScheduler::default();
        scheduler.spawn("t1".into(), Box::new(|| Value::Int(7)));
        assert_eq!(scheduler.await_task("t1"), Value::Int(7));
        assert_eq!(scheduler.await_task("t1"), Value::Int(7));
    }

    #[test]
    fn default_scheduler_cancel_makes_await_fail() {
        let scheduler = DefaultScheduler::default();
        scheduler.spawn("t1".into(), Box::new(|| Value::Int(1)));
        scheduler.cancel("t1");
        assert!(scheduler.await_task("t1").is_error());
    }

    #[test]
    fn default_scheduler_dispose_fails_awaits() {
        let scheduler = DefaultScheduler::default();
        scheduler.dispose();
        scheduler.spawn("t1".into(), Box::new(|| Value::Int(1)));
        assert!(scheduler.await_task("t1").is_error());
    }

    #[test]
    fn global_step_budget_trips() {
        let scheduler = DefaultScheduler::new(2, 100);
        assert!(scheduler.check_global_steps().is_none());
        assert!(scheduler.check_global_steps().is_none());
        assert!(scheduler.check_global_steps().is_some());
    }

    #[test]
    fn deterministic_sequential_runs_each_spawn_immediately() {
        let scheduler = DeterministicScheduler::new(DeterministicMode::Sequential, 1000);
        scheduler.spawn("a".into(), Box::new(|| Value::Int(1)));
        assert!(scheduler.is_complete("a"));
        assert_eq!(scheduler.await_task("a"), Value::Int(1));
    }

    #[test]
    fn deterministic_parallel_defers_until_awaited() {
        let scheduler = DeterministicScheduler::new(DeterministicMode::Parallel, 1000);
        scheduler.spawn("a".into(), Box::new(|| Value::Int(1)));
        assert!(!scheduler.is_complete("a"));
        assert_eq!(scheduler.await_task("a"), Value::Int(1));
        assert!(scheduler.is_complete("a"));
    }

    #[test]
    fn deterministic_breadth_first_runs_the_whole_wave_on_first_await() {
        let scheduler = DeterministicScheduler::new(DeterministicMode::BreadthFirst, 1000);
        scheduler.spawn("a".into(), Box::new(|| Value::Int(1)));
        scheduler.spawn("b".into(), Box::new(|| Value::Int(2)));
        assert_eq!(scheduler.await_task("b"), Value::Int(2));
        assert!(scheduler.is_complete("a"));
    }

    #[test]
    fn deterministic_depth_first_runs_latest_spawn_first() {
        let scheduler = DeterministicScheduler::new(DeterministicMode::DepthFirst, 1000);
        scheduler.spawn("a".into(), Box::new(|| Value::Int(1)));
        // by the time spawn("a") returns, depth-first has already run it.
        assert!(scheduler.is_complete("a"));
        assert_eq!(scheduler.await_task("a"), Value::Int(1));
    }
}
