//! The effect registry (§4.4): named side-effecting operations whose
//! *occurrence* is what the evaluator records, not their return value alone.
//! `impl` here only supplies the placeholder return value — logging the
//! occurrence into the effect log is the evaluator's job (`cairs_eval`).

use cairs_ir::{Type, Value};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

pub type EffectImpl = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct Effect {
    pub name: String,
    pub params: Vec<Type>,
    pub returns: Type,
    pub imp: EffectImpl,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl Effect {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Type>,
        returns: Type,
        imp: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Effect { name: name.into(), params, returns, imp: Arc::new(imp) }
    }

    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.imp)(args)
    }
}

/// `name → Effect`.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    table: FxHashMap<String, Effect>,
}

impl EffectRegistry {
    #[must_use]
    pub fn empty() -> Self {
        EffectRegistry::default()
    }

    pub fn register(&mut self, effect: Effect) -> &mut Self {
        self.table.insert(effect.name.clone(), effect);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Effect> {
        self.table.get(name)
    }

    #[must_use]
    pub fn merge(&self, other: &EffectRegistry) -> EffectRegistry {
        let mut table = self.table.clone();
        table.extend(other.table.iter().map(|(k, v)| (k.clone(), v.clone())));
        EffectRegistry { table }
    }

    /// The built-in effects (§4.4) with no queued inputs: `readLine`/
    /// `readInt` are immediately drained (return `""`/`0`), `getState`
    /// starts empty, matching a [`QueuedEffectRegistryBuilder`] with no
    /// inputs seeded.
    #[must_use]
    pub fn standard() -> Self {
        QueuedEffectRegistryBuilder::new().build()
    }
}

/// Builds an [`EffectRegistry`] whose `readLine`/`readInt` draw from a
/// shared FIFO of scalar inputs, and whose `getState`/`setState` share one
/// mutable string cell — the only mechanism for deterministic interactive
/// replay (§4.4).
#[derive(Default)]
pub struct QueuedEffectRegistryBuilder {
    inputs: VecDeque<Value>,
    initial_state: String,
}

impl QueuedEffectRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        QueuedEffectRegistryBuilder::default()
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Value>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_initial_state(mut self, state: impl Into<String>) -> Self {
        self.initial_state = state.into();
        self
    }

    #[must_use]
    pub fn build(self) -> EffectRegistry {
        let queue = Arc::new(Mutex::new(self.inputs));
        let state = Arc::new(Mutex::new(self.initial_state));

        let mut r = EffectRegistry::empty();

        r.register(Effect::new("print", vec![Type::String], Type::Void, |_| Value::Void));
        r.register(Effect::new("printInt", vec![Type::Int], Type::Void, |_| Value::Void));

        {
            let queue = Arc::clone(&queue);
            r.register(Effect::new("readLine", vec![], Type::String, move |_| {
                let mut q = queue.lock();
                match q.pop_front() {
                    Some(Value::Str(s)) => Value::string((*s).clone()),
                    Some(Value::Int(n)) => Value::string(n.to_string()),
                    Some(other) => other,
                    None => Value::string(""),
                }
            }));
        }
        {
            let queue = Arc::clone(&queue);
            r.register(Effect::new("readInt", vec![], Type::Int, move |_| {
                let mut q = queue.lock();
                match q.pop_front() {
                    Some(Value::Int(n)) => Value::Int(n),
                    Some(Value::Str(s)) => s.parse::<i64>().map_or(Value::Int(0), Value::Int),
                    Some(_) | None => Value::Int(0),
                }
            }));
        }
        {
            let state = Arc::clone(&state);
            r.register(Effect::new("getState", vec![], Type::String, move |_| {
                Value::string(state.lock().clone())
            }));
        }
        {
            let state = Arc::clone(&state);
            r.register(Effect::new("setState", vec![Type::String], Type::Void, move |args| {
                if let Value::Str(s) = &args[0] {
                    *state.lock() = (**s).clone();
                }
                Value::Void
            }));
        }

        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_line_drains_queue_then_returns_empty_string() {
        let registry = QueuedEffectRegistryBuilder::new()
            .with_inputs(vec![Value::string("hello")])
            .build();
        let read_line = registry.get("readLine").expect("registered");
        assert_eq!(read_line.call(&[]), Value::string("hello"));
        assert_eq!(read_line.call(&[]), Value::string(""));
    }

    #[test]
    fn read_int_drains_queue_then_returns_zero() {
        let registry =
            QueuedEffectRegistryBuilder::new().with_inputs(vec![Value::Int(7)]).build();
        let read_int = registry.get("readInt").expect("registered");
        assert_eq!(read_int.call(&[]), Value::Int(7));
        assert_eq!(read_int.call(&[]), Value::Int(0));
    }

    #[test]
    fn get_set_state_round_trips() {
        let registry =
            QueuedEffectRegistryBuilder::new().with_initial_state("init").build();
        assert_eq!(registry.get("getState").expect("registered").call(&[]), Value::string("init"));
        registry.get("setState").expect("registered").call(&[Value::string("updated")]);
        assert_eq!(registry.get("getState").expect("registered").call(&[]), Value::string("updated"));
    }

    #[test]
    fn standard_has_no_seeded_inputs() {
        let registry = EffectRegistry::standard();
        assert_eq!(registry.get("readLine").expect("registered").call(&[]), Value::string(""));
        assert_eq!(registry.get("readInt").expect("registered").call(&[]), Value::Int(0));
    }
}
