//! The async evaluator (§4.10 C11): extends the synchronous evaluator with
//! PIR's `spawn`/`await`/`channel`/`send`/`recv`/`select`/`race`/`par` node
//! kinds, installed as a [`PirHook`] on a [`cairs_eval::Evaluator`] so every
//! other node kind still reduces through the exact same code C7 uses.
//!
//! Each spawned task gets its own [`EvalState`] (so EIR-local bindings like
//! `refCell` side-tables stay task-private, per §5's "Operator registry and
//! definitions are treated as immutable" carve-out) but shares this
//! evaluator's channel store and effect log, which *are* meant to be visible
//! across tasks.

use crate::channel::ChannelType;
use crate::effect_log::ConcurrentEffectLog;
use crate::scheduler::{Scheduler, TaskFn};
use crate::store::ChannelStore;
use cairs_env::Defs;
use cairs_eval::{EffectSink, EvalOptions, EvalState, Evaluator, PirHook};
use cairs_ir::{Block, BlockId, ChannelHandle, Document, ErrorCode, Expr, FutureValue, Value, ValueEnv};
use cairs_ops::{EffectRegistry, OperatorRegistry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// §4.10's `concurrency` option. `Speculative` is accepted but, absent any
/// spec detail distinguishing it from eager parallel evaluation (e.g.
/// cancelling the branches that lose a race), is currently dispatched
/// identically to `Parallel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Concurrency {
    Sequential,
    Parallel,
    Speculative,
}

#[derive(Clone, Copy, Debug)]
pub struct AsyncEvalOptions {
    pub max_steps: u64,
    pub trace: bool,
    pub concurrency: Concurrency,
}

impl Default for AsyncEvalOptions {
    fn default() -> Self {
        AsyncEvalOptions { max_steps: 10_000, trace: false, concurrency: Concurrency::Parallel }
    }
}

#[derive(Clone)]
pub struct AsyncEvaluator {
    doc: Arc<Document>,
    operators: Arc<OperatorRegistry>,
    effects: Arc<EffectRegistry>,
    defs: Arc<Defs>,
    scheduler: Arc<dyn Scheduler>,
    channels: Arc<ChannelStore>,
    effect_log: Arc<ConcurrentEffectLog>,
    concurrency: Concurrency,
    max_steps: u64,
    trace: bool,
    next_task_id: Arc<AtomicU64>,
}

/// Evaluate a PIR document's `result` node, reducing `spawn`/`await`/channel
/// operations through `scheduler` (§4.11 C12's PIR dispatch branch).
#[must_use]
pub fn evaluate_pir(
    doc: &Document,
    operators: &OperatorRegistry,
    effects: &EffectRegistry,
    defs: &Defs,
    scheduler: Arc<dyn Scheduler>,
    input_env: Option<ValueEnv>,
    options: AsyncEvalOptions,
) -> (Value, Arc<ConcurrentEffectLog>) {
    let evaluator = AsyncEvaluator {
        doc: Arc::new(doc.clone()),
        operators: Arc::new(operators.clone()),
        effects: Arc::new(effects.clone()),
        defs: Arc::new(defs.clone()),
        scheduler,
        channels: Arc::new(ChannelStore::new()),
        effect_log: Arc::new(ConcurrentEffectLog::new()),
        concurrency: options.concurrency,
        max_steps: options.max_steps,
        trace: options.trace,
        next_task_id: Arc::new(AtomicU64::new(0)),
    };
    let env = input_env.unwrap_or_default();
    let value = evaluator.run_task(&evaluator.doc.result.clone(), env, "main");
    (value, evaluator.effect_log.clone())
}

impl AsyncEvaluator {
    fn run_task(&self, node: &str, env: ValueEnv, task_id: &str) -> Value {
        let mut state = EvalState::new(&EvalOptions { max_steps: self.max_steps, trace: self.trace })
            .with_sink(task_id.to_string(), self.effect_log.clone() as Arc<dyn EffectSink>);
        let base = Evaluator::new_with_pir(&self.doc, &self.operators, &self.effects, &self.defs, self);
        let (value, _env) = base.eval(node, env, &mut state);
        value
    }

    /// Run `blocks` from `entry` as its own task, used for each `fork`
    /// branch (§4.7 PIR-LIR `fork`) — a branch gets its own task-private
    /// `EvalState` exactly like a `spawn`ed task does, sharing only the
    /// channel store and effect log.
    fn run_block_task(&self, blocks: &[Block], entry: &BlockId, env: ValueEnv, task_id: &str) -> Value {
        let mut state = EvalState::new(&EvalOptions { max_steps: self.max_steps, trace: self.trace })
            .with_sink(task_id.to_string(), self.effect_log.clone() as Arc<dyn EffectSink>);
        let base = Evaluator::new_with_pir(&self.doc, &self.operators, &self.effects, &self.defs, self);
        base.eval_block(blocks, entry, &env, &mut state)
    }

    fn fork_branches(&self, blocks: &[Block], branches: &[BlockId], env: &ValueEnv) -> Option<Value> {
        let mut task_ids = Vec::with_capacity(branches.len());
        for branch in branches {
            let task_id = format!("task-{}", self.next_task_id.fetch_add(1, Ordering::Relaxed));
            let child = self.clone();
            let owned_blocks = blocks.to_vec();
            let entry = branch.clone();
            let captured_env = env.clone();
            let id_for_task = task_id.clone();
            let closure: TaskFn = Box::new(move || child.run_block_task(&owned_blocks, &entry, captured_env, &id_for_task));
            self.scheduler.spawn(task_id.clone(), closure);
            task_ids.push(task_id);
        }
        for id in &task_ids {
            let value = self.scheduler.await_task(id);
            if value.is_error() {
                return Some(value);
            }
        }
        None
    }

    fn await_future_value(&self, future_value: Value) -> Value {
        match future_value {
            Value::Future(f) => self.scheduler.await_task(&f.task_id),
            other if other.is_error() => other,
            _ => Value::error_with(ErrorCode::TypeError, "suspend target is not a future"),
        }
    }

    fn eval_spawn(&self, task: &str, env: ValueEnv) -> (Value, ValueEnv) {
        let task_id = format!("task-{}", self.next_task_id.fetch_add(1, Ordering::Relaxed));
        let child = self.clone();
        let node = task.to_string();
        let captured_env = env.clone();
        let id_for_task = task_id.clone();
        let closure: TaskFn = Box::new(move || child.run_task(&node, captured_env, &id_for_task));
        self.scheduler.spawn(task_id.clone(), closure);
        (Value::Future(FutureValue { task_id }), env)
    }

    fn eval_await(
        &self,
        future: &str,
        timeout: Option<&str>,
        fallback: Option<&str>,
        return_index: bool,
        env: ValueEnv,
        state: &mut EvalState,
        evaluator: &Evaluator<'_>,
    ) -> (Value, ValueEnv) {
        let (fv, env) = evaluator.eval(future, env, state);
        if fv.is_error() {
            return (fv, env);
        }
        let Value::Future(f) = fv else {
            return (Value::error_with(ErrorCode::TypeError, "await target is not a future"), env);
        };
        match timeout {
            None => {
                let value = self.scheduler.await_task(&f.task_id);
                (wrap_outcome(value, 0, return_index), env)
            }
            Some(timeout_id) => {
                let (tv, env) = evaluator.eval(timeout_id, env, state);
                if tv.is_error() {
                    return (tv, env);
                }
                let Value::Int(millis) = tv else {
                    return (Value::error_with(ErrorCode::TypeError, "await timeout is not an int"), env);
                };
                match self.race_against_timeout(&f.task_id, millis.max(0) as u64) {
                    Some(value) => (wrap_outcome(value, 0, return_index), env),
                    None => match fallback {
                        Some(fb) => {
                            let (fbv, env) = evaluator.eval(fb, env, state);
                            (wrap_outcome(fbv, 1, return_index), env)
                        }
                        None => (wrap_outcome(Value::error(ErrorCode::TimeoutError), 1, return_index), env),
                    },
                }
            }
        }
    }

    /// `Some(value)` if the task completed within `millis`; `None` on
    /// timeout. The background thread finishes the real await regardless
    /// (so the task's result is still retrievable via re-await — §5
    /// "Timeout on await/select never cancels the underlying task").
    fn race_against_timeout(&self, task_id: &str, millis: u64) -> Option<Value> {
        if self.scheduler.is_complete(task_id) {
            return Some(self.scheduler.await_task(task_id));
        }
        let (tx, rx) = crossbeam::channel::bounded(1);
        let scheduler = self.scheduler.clone();
        let id = task_id.to_string();
        thread::spawn(move || {
            let value = scheduler.await_task(&id);
            let _ = tx.send(value);
        });
        rx.recv_timeout(Duration::from_millis(millis)).ok()
    }

    fn eval_channel_new(
        &self,
        channel_type: &str,
        buffer_size: Option<&str>,
        env: ValueEnv,
        state: &mut EvalState,
        evaluator: &Evaluator<'_>,
    ) -> (Value, ValueEnv) {
        let Some(ct) = ChannelType::parse(channel_type) else {
            return (Value::error_with(ErrorCode::DomainError, format!("unknown channel type \"{channel_type}\"")), env);
        };
        let (capacity, env) = match buffer_size {
            Some(id) => {
                let (v, env) = evaluator.eval(id, env, state);
                match v {
                    Value::Int(n) => (n, env),
                    other if other.is_error() => return (other, env),
                    _ => return (Value::error_with(ErrorCode::TypeError, "channel buffer size is not an int"), env),
                }
            }
            None => (0, env),
        };
        match self.channels.create(ct, capacity) {
            Ok((id, _channel)) => (Value::Channel(ChannelHandle { id }), env),
            Err(e) => (e, env),
        }
    }

    fn eval_send(&self, channel: &str, value: &str, env: ValueEnv, state: &mut EvalState, evaluator: &Evaluator<'_>) -> (Value, ValueEnv) {
        let (cv, env) = evaluator.eval(channel, env, state);
        if cv.is_error() {
            return (cv, env);
        }
        let Value::Channel(handle) = cv else {
            return (Value::error_with(ErrorCode::TypeError, "send target is not a channel"), env);
        };
        let (vv, env) = evaluator.eval(value, env, state);
        if vv.is_error() {
            return (vv, env);
        }
        match self.channels.get(handle.id) {
            Some(channel) => (channel.send(vv), env),
            None => (Value::error_with(ErrorCode::DomainError, "channel no longer exists"), env),
        }
    }

    fn eval_recv(&self, channel: &str, env: ValueEnv, state: &mut EvalState, evaluator: &Evaluator<'_>) -> (Value, ValueEnv) {
        let (cv, env) = evaluator.eval(channel, env, state);
        if cv.is_error() {
            return (cv, env);
        }
        let Value::Channel(handle) = cv else {
            return (Value::error_with(ErrorCode::TypeError, "recv target is not a channel"), env);
        };
        match self.channels.get(handle.id) {
            Some(channel) => (channel.recv(), env),
            None => (Value::error_with(ErrorCode::DomainError, "channel no longer exists"), env),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_select(
        &self,
        futures: &[String],
        timeout: Option<&str>,
        fallback: Option<&str>,
        return_index: bool,
        mut env: ValueEnv,
        state: &mut EvalState,
        evaluator: &Evaluator<'_>,
    ) -> (Value, ValueEnv) {
        let mut task_ids = Vec::with_capacity(futures.len());
        for f in futures {
            let (fv, next_env) = evaluator.eval(f, env, state);
            env = next_env;
            if fv.is_error() {
                return (fv, env);
            }
            let Value::Future(fut) = fv else {
                return (Value::error_with(ErrorCode::TypeError, "select target is not a future"), env);
            };
            task_ids.push(fut.task_id);
        }
        let timeout_millis = match timeout {
            Some(id) => {
                let (tv, next_env) = evaluator.eval(id, env, state);
                env = next_env;
                match tv {
                    Value::Int(n) => Some(n.max(0) as u64),
                    other if other.is_error() => return (other, env),
                    _ => return (Value::error_with(ErrorCode::TypeError, "select timeout is not an int"), env),
                }
            }
            None => None,
        };

        let (tx, rx) = crossbeam::channel::bounded(task_ids.len().max(1));
        for (index, id) in task_ids.iter().enumerate() {
            let scheduler = self.scheduler.clone();
            let id = id.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let value = scheduler.await_task(&id);
                let _ = tx.send((index, value));
            });
        }
        let outcome = match timeout_millis {
            Some(ms) => rx.recv_timeout(Duration::from_millis(ms)).ok(),
            None => rx.recv().ok(),
        };
        match outcome {
            Some((index, value)) => (wrap_outcome(value, index as i64, return_index), env),
            None => match fallback {
                Some(fb) => {
                    let (fbv, env) = evaluator.eval(fb, env, state);
                    (wrap_outcome(fbv, -1, return_index), env)
                }
                None => (wrap_outcome(Value::error(ErrorCode::SelectTimeout), -1, return_index), env),
            },
        }
    }

    fn eval_race(&self, tasks: &[String], mut env: ValueEnv) -> (Value, ValueEnv) {
        let mut spawned = Vec::with_capacity(tasks.len());
        for t in tasks {
            let (future_value, next_env) = self.eval_spawn(t, env);
            env = next_env;
            let Value::Future(f) = future_value else {
                unreachable!("eval_spawn always returns a Future value")
            };
            spawned.push(f.task_id);
        }
        let mut results = Vec::with_capacity(spawned.len());
        for id in &spawned {
            let value = self.scheduler.await_task(id);
            if value.is_error() {
                return (value, env);
            }
            results.push(value);
        }
        (Value::list(results), env)
    }

    fn eval_par(&self, branches: &[String], env: ValueEnv, state: &mut EvalState, evaluator: &Evaluator<'_>) -> (Value, ValueEnv) {
        match self.concurrency {
            Concurrency::Sequential => {
                let mut env = env;
                let mut results = Vec::with_capacity(branches.len());
                for b in branches {
                    let (v, next_env) = evaluator.eval(b, env, state);
                    env = next_env;
                    if v.is_error() {
                        return (v, env);
                    }
                    results.push(v);
                }
                (Value::list(results), env)
            }
            Concurrency::Parallel | Concurrency::Speculative => self.eval_race(branches, env),
        }
    }
}

fn wrap_outcome(value: Value, index: i64, return_index: bool) -> Value {
    if return_index {
        Value::map(vec![(Value::string("index"), Value::Int(index)), (Value::string("value"), value)])
    } else {
        value
    }
}

impl PirHook for AsyncEvaluator {
    fn eval_pir(&self, expr: &Expr, env: ValueEnv, state: &mut EvalState, evaluator: &Evaluator<'_>) -> (Value, ValueEnv) {
        match expr {
            Expr::Spawn { task } => self.eval_spawn(task, env),
            Expr::Await { future, timeout, fallback, return_index } => self.eval_await(
                future,
                timeout.as_deref(),
                fallback.as_deref(),
                return_index.unwrap_or(false),
                env,
                state,
                evaluator,
            ),
            Expr::ChannelNew { channel_type, buffer_size } => {
                self.eval_channel_new(channel_type, buffer_size.as_deref(), env, state, evaluator)
            }
            Expr::Send { channel, value } => self.eval_send(channel, value, env, state, evaluator),
            Expr::Recv { channel } => self.eval_recv(channel, env, state, evaluator),
            Expr::Select { futures, timeout, fallback, return_index } => self.eval_select(
                futures,
                timeout.as_deref(),
                fallback.as_deref(),
                return_index.unwrap_or(false),
                env,
                state,
                evaluator,
            ),
            Expr::Race { tasks } => self.eval_race(tasks, env),
            Expr::Par { branches } => self.eval_par(branches, env, state, evaluator),
            _ => unreachable!("eval_pir is only installed as the hook for PIR expr kinds"),
        }
    }

    fn fork_join(&self, _evaluator: &Evaluator<'_>, blocks: &[Block], branches: &[BlockId], env: &ValueEnv) -> Option<Value> {
        self.fork_branches(blocks, branches, env)
    }

    fn await_future(&self, future_value: Value) -> Value {
        self.await_future_value(future_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DefaultScheduler;
    use cairs_ir::{Instruction, Layer, Node, NodeBody, Terminator, Type};

    fn lit(id: &str, n: i64) -> Node {
        Node { id: id.to_string(), body: NodeBody::Expr { expr: Expr::Lit { ty: Type::Int, value: serde_json::json!(n) } } }
    }

    fn node(id: &str, expr: Expr) -> Node {
        Node { id: id.to_string(), body: NodeBody::Expr { expr } }
    }

    fn doc(nodes: Vec<Node>, result: &str) -> Document {
        Document { version: "1.0.0".into(), layer: Layer::Pir, capabilities: None, air_defs: vec![], nodes, result: result.into() }
    }

    fn run(document: &Document) -> Value {
        let operators = cairs_ops::domains::standard();
        let effects = EffectRegistry::standard();
        let defs = Defs::empty();
        let scheduler: Arc<dyn Scheduler> = Arc::new(DefaultScheduler::default());
        let (value, _log) = evaluate_pir(document, &operators, &effects, &defs, scheduler, None, AsyncEvalOptions::default());
        value
    }

    #[test]
    fn spawn_then_await_returns_the_task_result() {
        let nodes = vec![
            lit("forty_two", 42),
            node("spawned", Expr::Spawn { task: "forty_two".into() }),
            node("awaited", Expr::Await { future: "spawned".into(), timeout: None, fallback: None, return_index: None }),
        ];
        let d = doc(nodes, "awaited");
        assert_eq!(run(&d), Value::Int(42));
    }

    #[test]
    fn race_collects_results_in_original_order() {
        let nodes = vec![
            lit("a", 1),
            lit("b", 2),
            lit("c", 3),
            node("raced", Expr::Race { tasks: vec!["a".into(), "b".into(), "c".into()] }),
        ];
        let d = doc(nodes, "raced");
        assert_eq!(run(&d), Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn channel_send_then_recv_round_trips_through_a_spawned_task() {
        let nodes = vec![
            node("ch", Expr::ChannelNew { channel_type: "spsc".into(), buffer_size: None }),
            lit("payload", 99),
            node("var_ch_send", Expr::Var { name: "ch".into() }),
            node("send_node", Expr::Send { channel: "var_ch_send".into(), value: "payload".into() }),
            node("spawn_send", Expr::Spawn { task: "send_node".into() }),
            node("var_ch_recv", Expr::Var { name: "ch".into() }),
            node("recv_node", Expr::Recv { channel: "var_ch_recv".into() }),
            node("seq_node", Expr::Seq { first: "spawn_send".into(), then: "recv_node".into() }),
            node("let_node", Expr::Let { name: "ch".into(), value: "ch".into(), body: "seq_node".into() }),
        ];
        let d = doc(nodes, "let_node");
        assert_eq!(run(&d), Value::Int(99));
    }

    #[test]
    fn select_returns_the_first_future_to_complete() {
        let nodes = vec![lit("fast", 1), node("spawned", Expr::Spawn { task: "fast".into() }), node(
            "selected",
            Expr::Select { futures: vec!["spawned".into()], timeout: None, fallback: None, return_index: None },
        )];
        let d = doc(nodes, "selected");
        assert_eq!(run(&d), Value::Int(1));
    }

    #[test]
    fn await_with_an_elapsed_timeout_runs_the_fallback() {
        let nodes = vec![
            lit("never_read_channel_recv_blocks_forever_marker", 0),
            node("ch", Expr::ChannelNew { channel_type: "spsc".into(), buffer_size: None }),
            node("var_ch", Expr::Var { name: "ch".into() }),
            node("blocked_recv", Expr::Recv { channel: "var_ch".into() }),
            node("spawned", Expr::Spawn { task: "blocked_recv".into() }),
            lit("timeout_ms", 20),
            lit("fallback_value", -1),
            node(
                "awaited",
                Expr::Await {
                    future: "spawned".into(),
                    timeout: Some("timeout_ms".into()),
                    fallback: Some("fallback_value".into()),
                    return_index: None,
                },
            ),
            node("bind_ch", Expr::Let { name: "ch".into(), value: "ch".into(), body: "awaited".into() }),
        ];
        let d = doc(nodes, "bind_ch");
        assert_eq!(run(&d), Value::Int(-1));
    }

    #[test]
    fn fork_runs_both_branches_and_joins_at_continuation() {
        let blocks = vec![
            Block {
                id: "entry".into(),
                instructions: vec![],
                terminator: Terminator::Fork { branches: vec!["b1".into(), "b2".into()], continuation: "join".into() },
            },
            Block {
                id: "b1".into(),
                instructions: vec![Instruction::Effect { op: "log".into(), args: vec![] }],
                terminator: Terminator::Return { value: None },
            },
            Block {
                id: "b2".into(),
                instructions: vec![Instruction::Effect { op: "log".into(), args: vec![] }],
                terminator: Terminator::Return { value: None },
            },
            Block {
                id: "join".into(),
                instructions: vec![Instruction::Assign {
                    target: "r".into(),
                    value: Expr::Lit { ty: Type::Int, value: serde_json::json!(7) },
                }],
                terminator: Terminator::Return { value: Some("r".into()) },
            },
        ];
        let d = Document {
            version: "1.0.0".into(),
            layer: Layer::Pir,
            capabilities: None,
            air_defs: vec![],
            nodes: vec![Node { id: "prog".into(), body: NodeBody::Block { blocks, entry: "entry".into() } }],
            result: "prog".into(),
        };

        let operators = cairs_ops::domains::standard();
        let effects = EffectRegistry::standard();
        let defs = Defs::empty();
        let scheduler: Arc<dyn Scheduler> = Arc::new(DefaultScheduler::default());
        let (value, log) = evaluate_pir(&d, &operators, &effects, &defs, scheduler, None, AsyncEvalOptions::default());
        assert_eq!(value, Value::Int(7));
        assert_eq!(log.get_ordered().iter().filter(|e| e.op == "log").count(), 2, "both fork branches ran");
    }

    #[test]
    fn suspend_awaits_the_referenced_future_and_resumes_at_the_named_block() {
        let nodes = vec![
            lit("forty_two", 42),
            node("spawned", Expr::Spawn { task: "forty_two".into() }),
            Node {
                id: "prog".into(),
                body: NodeBody::Block {
                    blocks: vec![
                        Block {
                            id: "entry".into(),
                            instructions: vec![],
                            terminator: Terminator::Suspend { future: "spawned".into(), resume_block: "after".into() },
                        },
                        Block { id: "after".into(), instructions: vec![], terminator: Terminator::Return { value: Some("spawned".into()) } },
                    ],
                    entry: "entry".into(),
                },
            },
        ];
        let d = doc(nodes, "prog");
        assert_eq!(run(&d), Value::Int(42));
    }
}
