//! The concurrent effect log (§4.8 C9): an append-only, thread-safe record
//! of every effect occurrence across every task in one PIR evaluation,
//! ordered by a single counter shared across the whole run (§5 "effect log
//! sequence numbers establish a total order across all logged effects
//! regardless of task").

use cairs_eval::EffectSink;
use cairs_ir::Value;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// One logged occurrence. `result`/`error` are filled in after the effect's
/// placeholder implementation runs, via [`ConcurrentEffectLog::append_with_result`]
/// / [`ConcurrentEffectLog::append_with_error`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoggedEffect {
    pub task_id: Option<String>,
    pub seq: u64,
    pub op: String,
    pub args: Vec<Value>,
    pub result: Option<Value>,
    pub error: Option<Value>,
}

/// Per-task and per-op occurrence counts (§4.8 `getStats`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectStats {
    pub by_task: FxHashMap<String, u64>,
    pub by_op: FxHashMap<String, u64>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<LoggedEffect>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct ConcurrentEffectLog {
    inner: Mutex<Inner>,
}

impl ConcurrentEffectLog {
    #[must_use]
    pub fn new() -> Self {
        ConcurrentEffectLog::default()
    }

    fn push(&self, task_id: Option<String>, op: String, args: Vec<Value>, result: Option<Value>, error: Option<Value>) -> u64 {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.push(LoggedEffect { task_id, seq, op, args, result, error });
        seq
    }

    pub fn append(&self, task_id: Option<&str>, op: impl Into<String>, args: Vec<Value>) -> u64 {
        self.push(task_id.map(str::to_string), op.into(), args, None, None)
    }

    pub fn append_with_result(&self, task_id: Option<&str>, op: impl Into<String>, args: Vec<Value>, result: Value) -> u64 {
        self.push(task_id.map(str::to_string), op.into(), args, Some(result), None)
    }

    pub fn append_with_error(&self, task_id: Option<&str>, op: impl Into<String>, args: Vec<Value>, error: Value) -> u64 {
        self.push(task_id.map(str::to_string), op.into(), args, None, Some(error))
    }

    /// Every entry, already insertion-ordered by `seq` since `seq` is
    /// assigned under the same lock `push` inserts under.
    #[must_use]
    pub fn get_ordered(&self) -> Vec<LoggedEffect> {
        self.inner.lock().entries.clone()
    }

    #[must_use]
    pub fn get_by_task(&self, task_id: &str) -> Vec<LoggedEffect> {
        self.inner.lock().entries.iter().filter(|e| e.task_id.as_deref() == Some(task_id)).cloned().collect()
    }

    /// Drop every entry tagged with `task_id` (§4.8, used on cancellation).
    pub fn discard_task(&self, task_id: &str) {
        self.inner.lock().entries.retain(|e| e.task_id.as_deref() != Some(task_id));
    }

    #[must_use]
    pub fn get_stats(&self) -> EffectStats {
        let inner = self.inner.lock();
        let mut stats = EffectStats::default();
        for entry in &inner.entries {
            if let Some(task_id) = &entry.task_id {
                *stats.by_task.entry(task_id.clone()).or_insert(0) += 1;
            }
            *stats.by_op.entry(entry.op.clone()).or_insert(0) += 1;
        }
        stats
    }
}

impl EffectSink for ConcurrentEffectLog {
    fn record(&self, task_id: Option<&str>, op: &str, args: &[Value]) -> u64 {
        self.append(task_id, op.to_string(), args.to_vec())
    }
}
