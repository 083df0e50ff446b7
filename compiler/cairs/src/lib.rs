//! CAIRS - the document-level orchestrator (§4.11 C12) and crate-root
//! convenience API.
//!
//! [`run_document`] is the one entry point a host needs: it builds the
//! effective [`Defs`] from a document's `airDefs`, merges the caller's
//! operator registry against the layer-standard domains, picks the
//! synchronous evaluator or the async one by `doc.layer`, and reduces
//! `doc.result`. Everything else here (`CairsError`, the registry/effect
//! re-exports, `validate_for_layer`) exists to save a host from reaching
//! into five crates directly, the way the teacher's root crate re-exports
//! its pipeline stages' public types.

use cairs_async::{AsyncEvalOptions, ConcurrentEffectLog, DefaultScheduler, Scheduler};
pub use cairs_async::Concurrency;
use cairs_diagnostic::Report;
use cairs_env::Defs;
use cairs_eval::EvalOptions;
pub use cairs_eval::EffectOccurrence;
use cairs_ir::{Document, Layer, Value, ValueEnv};
use cairs_ops::{domains, EffectRegistry, OperatorRegistry};
use std::sync::Arc;
use thiserror::Error;

pub use cairs_diagnostic::Issue;
pub use cairs_env::{Defs as CairsDefs, TypeEnv};
pub use cairs_ir::{ChannelHandle, ClosureValue, ErrorCode, ErrorValue, FutureValue, Node, NodeBody};
pub use cairs_ops::{Effect, Operator, QueuedEffectRegistryBuilder};
pub use cairs_validate::{validate_air, validate_cir, validate_eir, validate_lir, validate_pir};

/// Host-facing failures that are genuinely exceptional rather than
/// evaluation-time error values (§7 reserves `Value::Error` for the latter).
#[derive(Debug, Error)]
pub enum CairsError {
    #[error("document failed validation:\n{0}")]
    Invalid(FormattedReport),
    #[error("PIR document requires a scheduler (none supplied and no default configured)")]
    MissingScheduler,
}

/// A `Report` wrapped so it implements `Display` the way `thiserror`'s
/// `#[error]` attribute needs.
#[derive(Debug)]
pub struct FormattedReport(pub Report);

impl std::fmt::Display for FormattedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for issue in &self.0.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Options threaded into whichever evaluator `run_document` selects.
/// Mirrors the teacher's `InterpreterBuilder` pattern: one struct, built
/// from parsed CLI flags, passed by value into the entry point (§C,
/// supplemented feature 1).
#[derive(Clone)]
pub struct RunOptions {
    pub max_steps: u64,
    pub trace: bool,
    pub concurrency: Concurrency,
    /// `None` uses a fresh [`DefaultScheduler`] for PIR documents.
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { max_steps: 10_000, trace: false, concurrency: Concurrency::Parallel, scheduler: None }
    }
}

impl RunOptions {
    fn eval_options(&self) -> EvalOptions {
        EvalOptions { max_steps: self.max_steps, trace: self.trace }
    }

    fn async_eval_options(&self) -> AsyncEvalOptions {
        AsyncEvalOptions { max_steps: self.max_steps, trace: self.trace, concurrency: self.concurrency }
    }
}

/// Where a run's effect occurrences ended up: a plain per-call `Vec` for the
/// synchronous evaluator, or the cross-task [`ConcurrentEffectLog`] for PIR
/// (§6 "Effect delivery").
pub enum EffectRecord {
    Sync(Vec<EffectOccurrence>),
    Async(Arc<ConcurrentEffectLog>),
}

impl EffectRecord {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            EffectRecord::Sync(v) => v.len(),
            EffectRecord::Async(log) => log.get_ordered().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `doc.result` to completion (§4.11 C12).
///
/// Builds `Defs` from `doc.air_defs`, merges `operators` over the four
/// standard domains (caller registrations win on key collision, per
/// [`OperatorRegistry::merge`]'s "later wins" rule), and dispatches on
/// `doc.layer`: `Pir` goes through [`cairs_async::evaluate_pir`] with
/// `options.scheduler` (or a fresh [`DefaultScheduler`]); everything else
/// goes through [`cairs_eval::evaluate`], which already dispatches into the
/// LIR CFG interpreter on its own for block-form nodes.
#[must_use]
pub fn run_document(
    doc: &Document,
    operators: &OperatorRegistry,
    effects: &EffectRegistry,
    input_env: Option<ValueEnv>,
    options: RunOptions,
) -> (Value, EffectRecord) {
    let defs = Defs::from_air_defs(doc.air_defs.clone());
    let merged_operators = domains::standard().merge(operators);

    match doc.layer {
        Layer::Pir => {
            let scheduler = options.scheduler.clone().unwrap_or_else(|| Arc::new(DefaultScheduler::default()) as Arc<dyn Scheduler>);
            let (value, log) =
                cairs_async::evaluate_pir(doc, &merged_operators, effects, &defs, scheduler, input_env, options.async_eval_options());
            (value, EffectRecord::Async(log))
        }
        Layer::Air | Layer::Cir | Layer::Eir | Layer::Lir => {
            let (value, state) = cairs_eval::evaluate(doc, &merged_operators, effects, &defs, input_env, options.eval_options());
            (value, EffectRecord::Sync(state.effects))
        }
    }
}

/// Validate `doc` against whichever validator matches `doc.layer` (§4.5),
/// returning the validator's own report unchanged.
#[must_use]
pub fn validate_for_layer(doc: &Document) -> Report {
    match doc.layer {
        Layer::Air => validate_air(doc),
        Layer::Cir => validate_cir(doc),
        Layer::Eir => validate_eir(doc),
        Layer::Lir => validate_lir(doc),
        Layer::Pir => validate_pir(doc),
    }
}

/// Validate, then run only if validation passed (`CairsError::Invalid`
/// otherwise). The convenience path a CLI's `--validate` flag wants: one
/// call, one place a nonzero exit code comes from for a structural problem
/// as opposed to a runtime error *value*.
pub fn run_validated(
    doc: &Document,
    operators: &OperatorRegistry,
    effects: &EffectRegistry,
    input_env: Option<ValueEnv>,
    options: RunOptions,
) -> Result<(Value, EffectRecord), CairsError> {
    let report = validate_for_layer(doc);
    if !report.valid() {
        return Err(CairsError::Invalid(FormattedReport(report)));
    }
    Ok(run_document(doc, operators, effects, input_env, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairs_ir::{Expr, Node, NodeBody, Type};

    fn doc_with(layer: Layer, nodes: Vec<Node>, result: &str) -> Document {
        Document { version: "1.0.0".into(), layer, capabilities: None, air_defs: vec![], nodes, result: result.into() }
    }

    #[test]
    fn air_document_runs_through_the_sync_evaluator() {
        let doc = doc_with(
            Layer::Air,
            vec![
                Node { id: "a".into(), body: NodeBody::Expr { expr: Expr::Lit { ty: Type::Int, value: serde_json::json!(3) } } },
                Node { id: "b".into(), body: NodeBody::Expr { expr: Expr::Lit { ty: Type::Int, value: serde_json::json!(4) } } },
                Node {
                    id: "r".into(),
                    body: NodeBody::Expr { expr: Expr::Call { ns: "core".into(), name: "add".into(), args: vec!["a".into(), "b".into()] } },
                },
            ],
            "r",
        );
        let operators = OperatorRegistry::empty();
        let effects = EffectRegistry::standard();
        let (value, record) = run_document(&doc, &operators, &effects, None, RunOptions::default());
        assert_eq!(value, Value::Int(7));
        assert!(matches!(record, EffectRecord::Sync(_)));
        assert!(record.is_empty());
    }

    #[test]
    fn pir_document_runs_through_the_async_evaluator() {
        let doc = doc_with(
            Layer::Pir,
            vec![
                Node { id: "forty_two".into(), body: NodeBody::Expr { expr: Expr::Lit { ty: Type::Int, value: serde_json::json!(42) } } },
                Node { id: "spawned".into(), body: NodeBody::Expr { expr: Expr::Spawn { task: "forty_two".into() } } },
                Node {
                    id: "awaited".into(),
                    body: NodeBody::Expr {
                        expr: Expr::Await { future: "spawned".into(), timeout: None, fallback: None, return_index: None },
                    },
                },
            ],
            "awaited",
        );
        let operators = OperatorRegistry::empty();
        let effects = EffectRegistry::standard();
        let (value, record) = run_document(&doc, &operators, &effects, None, RunOptions::default());
        assert_eq!(value, Value::Int(42));
        assert!(matches!(record, EffectRecord::Async(_)));
    }

    #[test]
    fn run_validated_rejects_a_structurally_broken_document() {
        let doc = doc_with(Layer::Air, vec![], "missing");
        let operators = OperatorRegistry::empty();
        let effects = EffectRegistry::standard();
        let err = run_validated(&doc, &operators, &effects, None, RunOptions::default()).unwrap_err();
        assert!(matches!(err, CairsError::Invalid(_)));
    }
}
