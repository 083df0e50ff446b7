//! CAIRS Eval - the synchronous AIR/CIR/EIR evaluator and the LIR CFG
//! interpreter (§4.6 C7, §4.7 C8).
//!
//! [`evaluate`] is the document-level entry point: it builds an [`Evaluator`]
//! over the supplied registries and definitions and reduces `doc.result`,
//! dispatching to the LIR interpreter automatically for block-form nodes
//! (§3 "Hybrid nodes").

pub mod lir_eval;
pub mod literal;
pub mod state;
pub mod sync_eval;

pub use literal::literal_to_value;
pub use state::{EffectOccurrence, EffectSink, EvalOptions, EvalState};
pub use sync_eval::{Evaluator, PirHook};

use cairs_env::Defs;
use cairs_ir::{Document, Value, ValueEnv};
use cairs_ops::{EffectRegistry, OperatorRegistry};

/// Evaluate `doc.result` against the supplied registries, definitions, and
/// optional caller environment, returning the resulting value together with
/// the full [`EvalState`] (effect log, ref cells, step count) accumulated
/// along the way (§4.11 C12's entry point into the synchronous evaluator).
#[must_use]
pub fn evaluate(
    doc: &Document,
    operators: &OperatorRegistry,
    effects: &EffectRegistry,
    defs: &Defs,
    input_env: Option<ValueEnv>,
    options: EvalOptions,
) -> (Value, EvalState) {
    let evaluator = Evaluator::new(doc, operators, effects, defs);
    let mut state = EvalState::new(&options);
    let env = input_env.unwrap_or_default();
    let (value, _final_env) = evaluator.eval(&doc.result, env, &mut state);
    (value, state)
}
