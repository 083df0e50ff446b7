//! The synchronous AIR/CIR/EIR evaluator (§4.6 C7).
//!
//! `Evaluator::eval` reduces a node by id, threading a [`ValueEnv`] forward
//! through the reduction: pure AIR/CIR node kinds return it unchanged, while
//! EIR's `let`/`seq`/`assign`/`while`/`for`/`iter` persist their env mutations
//! to whatever the caller does next with the returned env. `callExpr` and
//! `airRef` are the two places that deliberately break that thread: a
//! function or named-definition body evaluates in its own isolated scope, and
//! only the *caller's* env (from evaluating the callee and argument nodes)
//! survives the call.

use crate::literal::literal_to_value;
use crate::state::EvalState;
use cairs_env::Defs;
use cairs_ir::{Block, BlockId, ClosureValue, Document, ErrorCode, Expr, Heap, NodeBody, Value, ValueEnv};
use cairs_ops::{EffectRegistry, OperatorRegistry};
use std::sync::Arc;

/// Extension point for PIR expressions and PIR-LIR terminators (§4.10
/// "Extends C7 with PIR expressions", §4.7 `fork`/`suspend`). `cairs_async`'s
/// async evaluator implements this and hands itself to
/// [`Evaluator::new_with_pir`] so `spawn`/`await`/channel operations and
/// `fork`/`suspend` terminators reduce through the scheduler instead of
/// hitting the "requires the async evaluator" placeholder. Kept here rather
/// than in `cairs_async` so this crate's dependency graph stays
/// one-directional.
pub trait PirHook: Send + Sync {
    fn eval_pir(
        &self,
        expr: &Expr,
        env: ValueEnv,
        state: &mut EvalState,
        evaluator: &Evaluator<'_>,
    ) -> (Value, ValueEnv);

    /// Run each of `blocks[b]` (by id, for `b` in `branches`) to completion
    /// as an independent task starting from `env`, blocking until every
    /// branch finishes (§4.7 PIR-LIR `fork`). `Some(error)` if any branch
    /// produced an error value; `None` once every branch has joined.
    fn fork_join(&self, evaluator: &Evaluator<'_>, blocks: &[Block], branches: &[BlockId], env: &ValueEnv) -> Option<Value>;

    /// Block the current task until `future_value` (expected to be a
    /// `Value::Future`) resolves, returning the task's result (§4.7
    /// PIR-LIR `suspend`).
    fn await_future(&self, future_value: Value) -> Value;
}

pub struct Evaluator<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) operators: &'a OperatorRegistry,
    pub(crate) effects: &'a EffectRegistry,
    pub(crate) defs: &'a Defs,
    pub(crate) pir: Option<&'a dyn PirHook>,
}

/// Priority order for resolving a namespace-less `predicate{name, value}`
/// call (§4.6): the first domain that registers a matching unary operator
/// wins. The spec documents `predicate` only as "a documented alias for
/// calling a named boolean predicate" without naming its namespace, so this
/// order is a deliberate choice, not something read off the wire.
const PREDICATE_DOMAINS: [&str; 4] = ["bool", "core", "list", "set"];

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(
        doc: &'a Document,
        operators: &'a OperatorRegistry,
        effects: &'a EffectRegistry,
        defs: &'a Defs,
    ) -> Self {
        Evaluator { doc, operators, effects, defs, pir: None }
    }

    /// Build an evaluator whose PIR node kinds delegate to `hook` instead of
    /// erroring (§4.10 C11).
    #[must_use]
    pub fn new_with_pir(
        doc: &'a Document,
        operators: &'a OperatorRegistry,
        effects: &'a EffectRegistry,
        defs: &'a Defs,
        hook: &'a dyn PirHook,
    ) -> Self {
        Evaluator { doc, operators, effects, defs, pir: Some(hook) }
    }

    /// Reduce the node `id` under `env`, returning its value and the
    /// (possibly extended) environment.
    #[must_use]
    pub fn eval(&self, id: &str, env: ValueEnv, state: &mut EvalState) -> (Value, ValueEnv) {
        cairs_stack::ensure_sufficient_stack(|| self.eval_inner(id, env, state))
    }

    /// Run `blocks` from `entry` to completion. Exposed so a [`PirHook`]
    /// implementation can run one `fork` branch as its own task while still
    /// going through this crate's own block interpreter (§4.7 PIR-LIR
    /// `fork`).
    #[must_use]
    pub fn eval_block(&self, blocks: &[Block], entry: &BlockId, env: &ValueEnv, state: &mut EvalState) -> Value {
        self.run_lir(blocks, entry, env, state)
    }

    fn eval_inner(&self, id: &str, env: ValueEnv, state: &mut EvalState) -> (Value, ValueEnv) {
        if !state.tick() {
            return (Value::error(ErrorCode::NonTermination), env);
        }
        let Some(node) = self.doc.find_node(id) else {
            return (
                Value::error_with(ErrorCode::UnboundIdentifier, format!("no node \"{id}\"")),
                env,
            );
        };
        match &node.body {
            NodeBody::Expr { expr } => self.eval_expr(expr, env, state),
            NodeBody::Block { blocks, entry } => {
                let value = self.run_lir(blocks, entry, &env, state);
                (value, env)
            }
        }
    }

    /// Evaluate every id in `args` left to right, threading `env` forward
    /// through the sequence (an arg expression may itself contain EIR
    /// effects). Short-circuits on the first error.
    fn eval_args(
        &self,
        args: &[String],
        mut env: ValueEnv,
        state: &mut EvalState,
    ) -> Result<(Vec<Value>, ValueEnv), (Value, ValueEnv)> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let (v, next_env) = self.eval(arg, env, state);
            env = next_env;
            if v.is_error() {
                return Err((v, env));
            }
            values.push(v);
        }
        Ok((values, env))
    }

    pub(crate) fn eval_expr(
        &self,
        expr: &Expr,
        env: ValueEnv,
        state: &mut EvalState,
    ) -> (Value, ValueEnv) {
        match expr {
            Expr::Lit { ty, value } => (literal_to_value(ty, value), env),
            Expr::Ref { id } => self.eval(id, env, state),
            Expr::Var { name } => match env.lookup(name) {
                Some(v) => (v, env),
                None => (
                    Value::error_with(ErrorCode::UnboundIdentifier, name.clone()),
                    env,
                ),
            },
            Expr::Call { ns, name, args } => {
                let (values, env) = match self.eval_args(args, env, state) {
                    Ok(pair) => pair,
                    Err(pair) => return pair,
                };
                let Some(op) = self.operators.get(ns, name) else {
                    return (
                        Value::error_with(ErrorCode::UnknownOperator, format!("{ns}:{name}")),
                        env,
                    );
                };
                (op.call(&values), env)
            }
            Expr::If { cond, then_branch, else_branch, .. } => {
                let (c, env) = self.eval(cond, env, state);
                match c {
                    Value::Bool(true) => self.eval(then_branch, env, state),
                    Value::Bool(false) => self.eval(else_branch, env, state),
                    other if other.is_error() => (other, env),
                    _ => (Value::error_with(ErrorCode::TypeError, "if condition is not bool"), env),
                }
            }
            Expr::Let { name, value, body } => {
                let (v, env) = self.eval(value, env, state);
                if v.is_error() {
                    return (v, env);
                }
                let env = env.extend(name.clone(), v);
                self.eval(body, env, state)
            }
            Expr::AirRef { ns, name, args } => {
                let (values, env) = match self.eval_args(args, env, state) {
                    Ok(pair) => pair,
                    Err(pair) => return pair,
                };
                let result = self.call_named_def(ns, name, values, state);
                (result, env)
            }
            Expr::Predicate { name, value } => {
                let (v, env) = self.eval(value, env, state);
                if v.is_error() {
                    return (v, env);
                }
                let op = PREDICATE_DOMAINS.iter().find_map(|ns| self.operators.get(*ns, name));
                match op {
                    Some(op) => (op.call(&[v]), env),
                    None => (
                        Value::error_with(ErrorCode::UnknownOperator, format!("predicate:{name}")),
                        env,
                    ),
                }
            }

            // ---- CIR ----
            Expr::Lambda { params, body, .. } => {
                (Value::closure(params.clone(), body.clone(), env.clone()), env)
            }
            Expr::CallExpr { callee, args } => {
                let (callee_value, env) = self.eval(callee, env, state);
                if callee_value.is_error() {
                    return (callee_value, env);
                }
                let (values, env) = match self.eval_args(args, env, state) {
                    Ok(pair) => pair,
                    Err(pair) => return pair,
                };
                let result = self.apply_value(&callee_value, values, state);
                (result, env)
            }
            Expr::Fix { fn_ref, .. } => {
                let (f, env) = self.eval(fn_ref, env, state);
                if f.is_error() {
                    return (f, env);
                }
                match f {
                    Value::Closure(h) if h.params.len() == 1 => (Value::fix_closure(h), env),
                    Value::Closure(_) => (
                        Value::error_with(ErrorCode::TypeError, "fix requires a one-parameter closure"),
                        env,
                    ),
                    _ => (Value::error_with(ErrorCode::TypeError, "fix target is not a function"), env),
                }
            }

            // ---- EIR ----
            Expr::Seq { first, then } => {
                let (v, env) = self.eval(first, env, state);
                if v.is_error() {
                    return (v, env);
                }
                self.eval(then, env, state)
            }
            Expr::Assign { target, value } => {
                let (v, env) = self.eval(value, env, state);
                if v.is_error() {
                    return (v, env);
                }
                let env = env.extend(target.clone(), v.clone());
                if let Some(cell) = state.ref_cells.get(target) {
                    *cell.lock() = v;
                }
                (Value::Void, env)
            }
            Expr::While { cond, body } => self.eval_while(cond, body, env, state),
            Expr::For { var, init, cond, update, body } => {
                self.eval_for(var, init, cond, update, body, env, state)
            }
            Expr::Iter { var, iter, body } => self.eval_iter(var, iter, body, env, state),
            Expr::Effect { op, args } => {
                let (values, env) = match self.eval_args(args, env, state) {
                    Ok(pair) => pair,
                    Err(pair) => return pair,
                };
                let Some(effect) = self.effects.get(op) else {
                    return (Value::error_with(ErrorCode::UnknownOperator, op.clone()), env);
                };
                let placeholder = effect.call(&values);
                state.record_effect(op.clone(), values);
                (placeholder, env)
            }
            Expr::RefCellNew { target } => {
                let Some(v) = env.lookup(target) else {
                    return (
                        Value::error_with(ErrorCode::UnboundIdentifier, target.clone()),
                        env,
                    );
                };
                state.ref_cells.insert(target.clone(), Arc::new(parking_lot::Mutex::new(v.clone())));
                (Value::ref_cell(v), env)
            }
            Expr::Deref { target } => match state.ref_cells.get(target) {
                Some(cell) => (cell.lock().clone(), env),
                None => (
                    Value::error_with(ErrorCode::UnboundIdentifier, target.clone()),
                    env,
                ),
            },
            Expr::Try { try_body, catch_param, catch_body, fallback } => {
                let (v, env) = self.eval(try_body, env, state);
                if v.is_error() {
                    let env = env.extend(catch_param.clone(), v);
                    return self.eval(catch_body, env, state);
                }
                match fallback {
                    Some(fallback_id) => self.eval(fallback_id, env, state),
                    None => (v, env),
                }
            }

            // ---- PIR: delegated to a PirHook when one is installed. ----
            Expr::Spawn { .. }
            | Expr::Await { .. }
            | Expr::ChannelNew { .. }
            | Expr::Send { .. }
            | Expr::Recv { .. }
            | Expr::Select { .. }
            | Expr::Race { .. }
            | Expr::Par { .. } => match self.pir {
                Some(hook) => hook.eval_pir(expr, env, state, self),
                None => (
                    Value::error_with(
                        ErrorCode::TypeError,
                        format!("\"{}\" requires the async evaluator", expr.kind()),
                    ),
                    env,
                ),
            },
        }
    }

    fn eval_while(
        &self,
        cond: &str,
        body: &str,
        mut env: ValueEnv,
        state: &mut EvalState,
    ) -> (Value, ValueEnv) {
        loop {
            let (c, next_env) = self.eval(cond, env, state);
            env = next_env;
            match c {
                Value::Bool(false) => return (Value::Void, env),
                Value::Bool(true) => {}
                other if other.is_error() => return (other, env),
                _ => {
                    return (Value::error_with(ErrorCode::TypeError, "while condition is not bool"), env)
                }
            }
            if !state.tick() {
                return (Value::error(ErrorCode::NonTermination), env);
            }
            let (v, next_env) = self.eval(body, env, state);
            env = next_env;
            if v.is_error() {
                return (v, env);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_for(
        &self,
        var: &str,
        init: &str,
        cond: &str,
        update: &str,
        body: &str,
        env: ValueEnv,
        state: &mut EvalState,
    ) -> (Value, ValueEnv) {
        let (iv, env) = self.eval(init, env, state);
        if iv.is_error() {
            return (iv, env);
        }
        let mut env = env.extend(var.to_string(), iv);
        loop {
            let (c, next_env) = self.eval(cond, env, state);
            env = next_env;
            match c {
                Value::Bool(false) => return (Value::Void, env),
                Value::Bool(true) => {}
                other if other.is_error() => return (other, env),
                _ => return (Value::error_with(ErrorCode::TypeError, "for condition is not bool"), env),
            }
            if !state.tick() {
                return (Value::error(ErrorCode::NonTermination), env);
            }
            let (bv, next_env) = self.eval(body, env, state);
            env = next_env;
            if bv.is_error() {
                return (bv, env);
            }
            let (uv, next_env) = self.eval(update, env, state);
            env = next_env;
            if uv.is_error() {
                return (uv, env);
            }
            env = env.extend(var.to_string(), uv);
        }
    }

    fn eval_iter(
        &self,
        var: &str,
        iter: &str,
        body: &str,
        env: ValueEnv,
        state: &mut EvalState,
    ) -> (Value, ValueEnv) {
        let (iv, mut env) = self.eval(iter, env, state);
        if iv.is_error() {
            return (iv, env);
        }
        let Value::List(items) = iv else {
            return (Value::error_with(ErrorCode::TypeError, "iter target is not a list"), env);
        };
        for item in items.iter() {
            if !state.tick() {
                return (Value::error(ErrorCode::NonTermination), env);
            }
            env = env.extend(var.to_string(), item.clone());
            let (bv, next_env) = self.eval(body, env, state);
            env = next_env;
            if bv.is_error() {
                return (bv, env);
            }
        }
        (Value::Void, env)
    }

    /// Apply a callable value to already-evaluated `args`, dispatching the
    /// `fix` two-stage call per `ClosureValue::fix_of`'s doc comment.
    pub(crate) fn apply_value(&self, callee: &Value, args: Vec<Value>, state: &mut EvalState) -> Value {
        match callee {
            Value::Closure(h) => match &h.fix_of {
                Some(f) => {
                    let inner = self.apply_closure(f, vec![callee.clone()], state);
                    if inner.is_error() {
                        return inner;
                    }
                    match inner {
                        Value::Closure(inner_h) => self.apply_closure(&inner_h, args, state),
                        _ => Value::error_with(ErrorCode::TypeError, "fix body did not produce a closure"),
                    }
                }
                None => self.apply_closure(h, args, state),
            },
            other if other.is_error() => other.clone(),
            _ => Value::error_with(ErrorCode::TypeError, "callExpr target is not a function"),
        }
    }

    fn apply_closure(&self, h: &Heap<ClosureValue>, args: Vec<Value>, state: &mut EvalState) -> Value {
        if args.len() != h.params.len() {
            return Value::error_with(
                ErrorCode::ArityError,
                format!("closure expects {} argument(s), got {}", h.params.len(), args.len()),
            );
        }
        let call_env = h.captured.extend_many(h.params.iter().cloned().zip(args));
        let (value, _env) = self.eval(&h.body, call_env, state);
        value
    }

    /// Look up and call a named definition (`ns:name`), isolating its body's
    /// env from the caller's (§4.6 `airRef`): defs are globally addressable,
    /// not closures, so they evaluate in a fresh scope built only from their
    /// formal parameters.
    pub(crate) fn call_named_def(&self, ns: &str, name: &str, args: Vec<Value>, state: &mut EvalState) -> Value {
        let Some(def) = self.defs.lookup(ns, name) else {
            return Value::error_with(ErrorCode::UnknownDefinition, format!("{ns}:{name}"));
        };
        if let Some(err) = args.iter().find(|v| v.is_error()) {
            return (*err).clone();
        }
        if args.len() != def.params.len() {
            return Value::error_with(ErrorCode::ArityError, def.key());
        }
        let call_env = ValueEnv::empty().extend_many(def.params.iter().cloned().zip(args));
        let (value, _env) = self.eval_expr(&def.body, call_env, state);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvalOptions;
    use cairs_env::Defs;
    use cairs_ir::{AirDef, Layer, Node, NodeBody as IrNodeBody, Type};
    use cairs_ops::domains;

    fn lit(id: &str, n: i64) -> Node {
        Node { id: id.to_string(), body: IrNodeBody::Expr { expr: Expr::Lit { ty: Type::Int, value: serde_json::json!(n) } } }
    }

    fn node(id: &str, expr: Expr) -> Node {
        Node { id: id.to_string(), body: IrNodeBody::Expr { expr } }
    }

    fn doc(layer: Layer, air_defs: Vec<AirDef>, nodes: Vec<Node>, result: &str) -> Document {
        Document { version: "1.0.0".into(), layer, capabilities: None, air_defs, nodes, result: result.into() }
    }

    fn run(document: &Document) -> (Value, EvalState) {
        let operators = domains::standard();
        let effects = EffectRegistry::standard();
        let defs = Defs::from_air_defs(document.air_defs.clone());
        let evaluator = Evaluator::new(document, &operators, &effects, &defs);
        let mut state = EvalState::new(&EvalOptions::default());
        let (value, _env) = evaluator.eval(&document.result, ValueEnv::empty(), &mut state);
        (value, state)
    }

    #[test]
    fn air_arithmetic() {
        let d = doc(
            Layer::Air,
            vec![],
            vec![
                lit("a", 10),
                lit("b", 32),
                node("r", Expr::Call { ns: "core".into(), name: "add".into(), args: vec!["a".into(), "b".into()] }),
            ],
            "r",
        );
        let (value, _state) = run(&d);
        assert_eq!(value, Value::Int(42));
    }

    #[test]
    fn divide_by_zero_is_an_error_value() {
        let d = doc(
            Layer::Air,
            vec![],
            vec![
                lit("a", 1),
                lit("b", 0),
                node("r", Expr::Call { ns: "core".into(), name: "div".into(), args: vec!["a".into(), "b".into()] }),
            ],
            "r",
        );
        let (value, _state) = run(&d);
        assert!(matches!(value, Value::Error(e) if e.code == ErrorCode::DivideByZero));
    }

    #[test]
    fn cir_factorial_via_fix() {
        // inner(n) = if n <= 1 then 1 else n * self(n - 1)
        let nodes = vec![
            lit("one", 1),
            node("var_n_cond", Expr::Var { name: "n".into() }),
            node("n_le_1", Expr::Call { ns: "core".into(), name: "lte".into(), args: vec!["var_n_cond".into(), "one".into()] }),
            node("var_n_sub", Expr::Var { name: "n".into() }),
            node("n_minus_1", Expr::Call { ns: "core".into(), name: "sub".into(), args: vec!["var_n_sub".into(), "one".into()] }),
            node("var_self", Expr::Var { name: "self".into() }),
            node(
                "self_call",
                Expr::CallExpr { callee: "var_self".into(), args: vec!["n_minus_1".into()] },
            ),
            node("var_n_mul", Expr::Var { name: "n".into() }),
            node("rec_mul", Expr::Call { ns: "core".into(), name: "mul".into(), args: vec!["var_n_mul".into(), "self_call".into()] }),
            node(
                "if_node",
                Expr::If { cond: "n_le_1".into(), then_branch: "one".into(), else_branch: "rec_mul".into(), ty: Type::Int },
            ),
            node(
                "inner_lambda",
                Expr::Lambda { params: vec!["n".into()], body: "if_node".into(), ty: Type::Int },
            ),
            node(
                "outer_lambda",
                Expr::Lambda { params: vec!["self".into()], body: "inner_lambda".into(), ty: Type::Int },
            ),
            node("fix_node", Expr::Fix { fn_ref: "outer_lambda".into(), ty: Type::Int }),
            lit("five", 5),
            node("call_result", Expr::CallExpr { callee: "fix_node".into(), args: vec!["five".into()] }),
        ];
        let d = doc(Layer::Cir, vec![], nodes, "call_result");
        let (value, _state) = run(&d);
        assert_eq!(value, Value::Int(120));
    }

    #[test]
    fn eir_while_counter() {
        let nodes = vec![
            lit("zero", 0),
            node("make_cell", Expr::RefCellNew { target: "i".into() }),
            node("var_i_cond", Expr::Var { name: "i".into() }),
            lit("five", 5),
            node("cond", Expr::Call { ns: "core".into(), name: "lt".into(), args: vec!["var_i_cond".into(), "five".into()] }),
            node("var_i_body", Expr::Var { name: "i".into() }),
            lit("one", 1),
            node("plus", Expr::Call { ns: "core".into(), name: "add".into(), args: vec!["var_i_body".into(), "one".into()] }),
            node("assign_i", Expr::Assign { target: "i".into(), value: "plus".into() }),
            node("while_node", Expr::While { cond: "cond".into(), body: "assign_i".into() }),
            node("deref_i", Expr::Deref { target: "i".into() }),
            node("loop_and_deref", Expr::Seq { first: "while_node".into(), then: "deref_i".into() }),
            node("after_bind", Expr::Seq { first: "make_cell".into(), then: "loop_and_deref".into() }),
            node("bind_i", Expr::Let { name: "i".into(), value: "zero".into(), body: "after_bind".into() }),
        ];
        let d = doc(Layer::Eir, vec![], nodes, "bind_i");
        let (value, state) = run(&d);
        assert_eq!(value, Value::Int(5));
        assert!(state.effects.is_empty());
    }

    #[test]
    fn nested_let_shadowing_resolves_to_innermost_binding() {
        let nodes = vec![
            lit("x1", 1),
            node("lam", Expr::Lambda { params: vec![], body: "var_x".into(), ty: Type::Int }),
            node("var_x", Expr::Var { name: "x".into() }),
            node("capture", Expr::Let { name: "x".into(), value: "x1".into(), body: "lam".into() }),
            lit("x2", 2),
            node(
                "call_under_shadow",
                Expr::Let {
                    name: "x".into(),
                    value: "x2".into(),
                    body: "call_captured".into(),
                },
            ),
            node("call_captured", Expr::CallExpr { callee: "capture".into(), args: vec![] }),
        ];
        let d = doc(Layer::Cir, vec![], nodes, "call_under_shadow");
        let (value, _state) = run(&d);
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn unbound_variable_is_an_error() {
        let d = doc(Layer::Air, vec![], vec![node("v", Expr::Var { name: "missing".into() })], "v");
        let (value, _state) = run(&d);
        assert!(matches!(value, Value::Error(e) if e.code == ErrorCode::UnboundIdentifier));
    }

    #[test]
    fn air_ref_calls_a_named_definition() {
        // square(x) = mul(x, x). The def body's `Call` args are node ids, so
        // the document carries an `arg_x` node the def body points at; it's
        // evaluated in the def's own call-time scope (param `x` bound there),
        // not the caller's.
        let def = AirDef {
            ns: "math".into(),
            name: "square".into(),
            params: vec!["x".into()],
            result: Type::Int,
            body: Expr::Call { ns: "core".into(), name: "mul".into(), args: vec!["arg_x".into(), "arg_x".into()] },
        };
        let nodes = vec![
            node("arg_x", Expr::Var { name: "x".into() }),
            lit("four", 4),
            node(
                "squared",
                Expr::AirRef { ns: "math".into(), name: "square".into(), args: vec!["four".into()] },
            ),
        ];
        let d = doc(Layer::Air, vec![def], nodes, "squared");
        let (value, _state) = run(&d);
        assert_eq!(value, Value::Int(16));
    }

    #[test]
    fn air_ref_to_unknown_definition_is_an_error() {
        let nodes = vec![
            lit("four", 4),
            node(
                "missing_def",
                Expr::AirRef { ns: "math".into(), name: "cube".into(), args: vec!["four".into()] },
            ),
        ];
        let d = doc(Layer::Air, vec![], nodes, "missing_def");
        let (value, _state) = run(&d);
        assert!(matches!(value, Value::Error(e) if e.code == ErrorCode::UnknownDefinition));
    }
}
