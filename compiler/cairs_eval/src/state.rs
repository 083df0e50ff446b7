//! Evaluator state threaded across one evaluation (§4.6 C7, §4.7 C8): the
//! effect log, the step counter, and the ref-cell side-table that backs
//! EIR's `refCell`/`deref`/`assign`.

use cairs_ir::Value;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One recorded effect occurrence: the op name, its evaluated arguments, and
/// a monotonically assigned sequence number (§4.6 `effect`, §8 "effect-log
/// sequence numbers form a strictly increasing sequence").
#[derive(Clone, Debug, PartialEq)]
pub struct EffectOccurrence {
    pub op: String,
    pub args: Vec<Value>,
    pub seq: u64,
}

/// A shared sink an [`EvalState`] can forward effect occurrences to instead
/// of (only) recording them locally. The PIR evaluator (§5 "effect log
/// sequence numbers establish a total order across all logged effects
/// regardless of task") sets one so every task's `effect{...}` reductions
/// land in one globally ordered log rather than each task's own private
/// `effects` vector. Defined here rather than in `cairs_async` so this crate
/// never needs to depend the other way around.
pub trait EffectSink: Send + Sync {
    fn record(&self, task_id: Option<&str>, op: &str, args: &[Value]) -> u64;
}

/// Caller-supplied knobs for one evaluation (§4.6 "Step budget").
#[derive(Clone, Copy, Debug)]
pub struct EvalOptions {
    pub max_steps: u64,
    pub trace: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions { max_steps: 10_000, trace: false }
    }
}

/// Mutable state carried through one evaluation. Not `Clone`: it is threaded
/// by `&mut` reference through every node reduction rather than copied.
#[derive(Debug)]
pub struct EvalState {
    pub effects: Vec<EffectOccurrence>,
    pub ref_cells: FxHashMap<String, Arc<Mutex<Value>>>,
    pub steps: u64,
    pub max_steps: u64,
    pub trace: Vec<String>,
    trace_enabled: bool,
    task_id: Option<String>,
    sink: Option<Arc<dyn EffectSink>>,
}

impl EvalState {
    #[must_use]
    pub fn new(options: &EvalOptions) -> Self {
        EvalState {
            effects: Vec::new(),
            ref_cells: FxHashMap::default(),
            steps: 0,
            max_steps: options.max_steps,
            trace: Vec::new(),
            trace_enabled: options.trace,
            task_id: None,
            sink: None,
        }
    }

    /// Route this state's effect occurrences through a shared log, tagged
    /// with `task_id`, instead of only this evaluation's local `effects`.
    #[must_use]
    pub fn with_sink(mut self, task_id: impl Into<String>, sink: Arc<dyn EffectSink>) -> Self {
        self.task_id = Some(task_id.into());
        self.sink = Some(sink);
        self
    }

    /// Count one reduction step. Returns `false` once the budget is
    /// exhausted; the caller turns that into a `NonTermination` error value.
    #[must_use]
    pub fn tick(&mut self) -> bool {
        self.steps += 1;
        self.steps <= self.max_steps
    }

    pub fn trace(&mut self, msg: impl Into<String>) {
        if self.trace_enabled {
            self.trace.push(msg.into());
        }
    }

    pub fn record_effect(&mut self, op: impl Into<String>, args: Vec<Value>) {
        let op = op.into();
        let seq = match &self.sink {
            Some(sink) => sink.record(self.task_id.as_deref(), &op, &args),
            None => self.effects.len() as u64,
        };
        self.effects.push(EffectOccurrence { op, args, seq });
    }
}
