//! CAIRS Ops - operator registry, domain operators, and effect registry
//!
//! - `operator`: `Operator`/`OperatorRegistry` (§4.3).
//! - `domains`: the four required operator domains (`core`, `bool`, `list`,
//!   `set`) and `domains::standard()`, the merge of all four.
//! - `effect`: `Effect`/`EffectRegistry` (§4.4) and the queued-input variant
//!   that makes interactive replay deterministic.

pub mod domains;
pub mod effect;
pub mod operator;

pub use effect::{Effect, EffectRegistry, QueuedEffectRegistryBuilder};
pub use operator::{OpImpl, Operator, OperatorRegistry};
