//! The LIR control-flow-graph interpreter (§4.7 C8): basic blocks of
//! straight-line instructions ending in a structured terminator, executed
//! starting at a node's `entry` block.
//!
//! This lives as a second `impl Evaluator` block rather than its own type so
//! `Instruction::Assign`'s embedded `Expr` can call straight back into
//! [`Evaluator::eval_expr`] (an `assign` instruction's value may itself
//! contain a `ref{id}` into the surrounding document).

use crate::state::EvalState;
use crate::sync_eval::Evaluator;
use cairs_ir::{Block, BlockId, ErrorCode, Instruction, Terminator, Value, ValueEnv};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

impl<'a> Evaluator<'a> {
    /// Run the block list starting at `entry`, returning the value produced
    /// by whichever `return`/`exit` terminator is reached.
    pub(crate) fn run_lir(
        &self,
        blocks: &[Block],
        entry: &BlockId,
        outer_env: &ValueEnv,
        state: &mut EvalState,
    ) -> Value {
        let block_map: FxHashMap<&str, &Block> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();
        let mut locals: FxHashMap<String, Value> = FxHashMap::default();
        let mut env = outer_env.clone();
        let mut current: BlockId = entry.clone();
        let mut predecessor: Option<BlockId> = None;

        loop {
            if !state.tick() {
                return Value::error(ErrorCode::NonTermination);
            }
            let Some(block) = block_map.get(current.as_str()) else {
                return Value::error_with(ErrorCode::InvalidIdFormat, format!("unknown block \"{current}\""));
            };

            for instr in &block.instructions {
                if let Some(err) = self.run_instruction(instr, &mut locals, &mut env, predecessor.as_deref(), state) {
                    return err;
                }
            }

            match &block.terminator {
                Terminator::Jump { to } => {
                    predecessor = Some(current.clone());
                    current = to.clone();
                }
                Terminator::Branch { cond, then_block, else_block } => {
                    let c = resolve(cond, &locals, &env);
                    match c {
                        Value::Bool(true) => {
                            predecessor = Some(current.clone());
                            current = then_block.clone();
                        }
                        Value::Bool(false) => {
                            predecessor = Some(current.clone());
                            current = else_block.clone();
                        }
                        other if other.is_error() => return other,
                        _ => return Value::error_with(ErrorCode::TypeError, "branch condition is not bool"),
                    }
                }
                Terminator::Return { value } => {
                    return match value {
                        Some(name) => resolve(name, &locals, &env),
                        None => Value::Void,
                    };
                }
                Terminator::Exit { .. } => return Value::Void,
                Terminator::Fork { branches, continuation } => {
                    let Some(pir) = self.pir else {
                        return Value::error_with(ErrorCode::TypeError, "fork requires the async evaluator");
                    };
                    if let Some(err) = pir.fork_join(self, blocks, branches, &env) {
                        return err;
                    }
                    predecessor = Some(current.clone());
                    current = continuation.clone();
                }
                Terminator::Suspend { future, resume_block } => {
                    let Some(pir) = self.pir else {
                        return Value::error_with(ErrorCode::TypeError, "suspend requires the async evaluator");
                    };
                    let (future_value, new_env) = self.eval(future, env.clone(), state);
                    if future_value.is_error() {
                        return future_value;
                    }
                    let resolved = pir.await_future(future_value);
                    if resolved.is_error() {
                        return resolved;
                    }
                    env = new_env.extend(future.clone(), resolved);
                    predecessor = Some(current.clone());
                    current = resume_block.clone();
                }
            }
        }
    }

    /// Execute one instruction, mutating `locals`/`env` in place. Returns
    /// `Some(error_value)` to short-circuit the whole block execution.
    fn run_instruction(
        &self,
        instr: &Instruction,
        locals: &mut FxHashMap<String, Value>,
        env: &mut ValueEnv,
        predecessor: Option<&str>,
        state: &mut EvalState,
    ) -> Option<Value> {
        match instr {
            Instruction::Assign { target, value } => {
                let merged = env.extend_many(locals.iter().map(|(k, v)| (k.clone(), v.clone())));
                let (v, new_env) = self.eval_expr(value, merged, state);
                if v.is_error() {
                    return Some(v);
                }
                *env = new_env;
                locals.insert(target.clone(), v);
                None
            }
            Instruction::Op { target, ns, name, args } => {
                let Some(op) = self.operators.get(ns, name) else {
                    return Some(Value::error_with(ErrorCode::UnknownOperator, format!("{ns}:{name}")));
                };
                let values: Vec<Value> = args.iter().map(|a| resolve(a, &*locals, &*env)).collect();
                let result = op.call(&values);
                if result.is_error() {
                    return Some(result);
                }
                locals.insert(target.clone(), result);
                None
            }
            Instruction::Phi { target, sources } => {
                let Some(source) = sources.iter().find(|s| Some(s.block.as_str()) == predecessor) else {
                    return Some(Value::error_with(
                        ErrorCode::InvalidIdFormat,
                        format!("phi \"{target}\" has no source for the predecessor block"),
                    ));
                };
                let v = resolve(&source.id, &*locals, &*env);
                if v.is_error() {
                    return Some(v);
                }
                locals.insert(target.clone(), v);
                None
            }
            Instruction::Effect { op, args } => {
                let Some(effect) = self.effects.get(op) else {
                    return Some(Value::error_with(ErrorCode::UnknownOperator, op.clone()));
                };
                let values: Vec<Value> = args.iter().map(|a| resolve(a, &*locals, &*env)).collect();
                if let Some(err) = values.iter().find(|v| v.is_error()) {
                    return Some((*err).clone());
                }
                let placeholder = effect.call(&values);
                state.record_effect(op.clone(), values);
                let _ = placeholder;
                None
            }
            Instruction::AssignRef { target, value } => {
                let v = resolve(value, locals, env);
                if v.is_error() {
                    return Some(v);
                }
                match state.ref_cells.get(target) {
                    Some(cell) => *cell.lock() = v.clone(),
                    None => {
                        state.ref_cells.insert(target.clone(), Arc::new(Mutex::new(v.clone())));
                    }
                }
                *env = env.extend(target.clone(), v);
                None
            }
            Instruction::Call { target, callee, args } => {
                let values: Vec<Value> = args.iter().map(|a| resolve(a, &*locals, &*env)).collect();
                if let Some(err) = values.iter().find(|v| v.is_error()) {
                    return Some((*err).clone());
                }
                let result = if let Some((ns, name)) = callee.split_once(':') {
                    self.call_named_def(ns, name, values, state)
                } else if let Some(closure) = locals.get(callee).cloned().or_else(|| env.lookup(callee)) {
                    self.apply_value(&closure, values, state)
                } else {
                    Value::error_with(ErrorCode::UnknownDefinition, callee.clone())
                };
                if result.is_error() {
                    return Some(result);
                }
                locals.insert(target.clone(), result);
                None
            }
        }
    }
}

fn resolve(name: &str, locals: &FxHashMap<String, Value>, env: &ValueEnv) -> Value {
    if let Some(v) = locals.get(name) {
        return v.clone();
    }
    match env.lookup(name) {
        Some(v) => v,
        None => Value::error_with(ErrorCode::UnboundIdentifier, name.to_string()),
    }
}
