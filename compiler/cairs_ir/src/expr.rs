//! The expression AST shared by AIR/CIR/EIR/PIR (§3 DATA MODEL, Expressions).
//!
//! Every expression refers to sibling expressions by node id (a plain
//! `String`), never by inline sub-expression — this is what lets a block
//! form and an expression form share one node table. `Expr` itself is one
//! flat enum for every layer; `cairs_validate` is what rejects an EIR-only
//! or PIR-only kind appearing in an AIR document.

use crate::ty::Type;
use serde::{Deserialize, Serialize};

/// A node id: a string key into a [`crate::doc::Document`]'s `nodes` list.
pub type NodeId = String;

/// An expression node body. Tagged by `"kind"` on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    // ---- AIR ----
    #[serde(rename = "lit")]
    Lit {
        #[serde(rename = "type")]
        ty: Type,
        value: serde_json::Value,
    },
    #[serde(rename = "ref")]
    Ref { id: NodeId },
    #[serde(rename = "var")]
    Var { name: String },
    #[serde(rename = "call")]
    Call { ns: String, name: String, args: Vec<NodeId> },
    #[serde(rename = "if")]
    If {
        cond: NodeId,
        #[serde(rename = "then")]
        then_branch: NodeId,
        #[serde(rename = "else")]
        else_branch: NodeId,
        #[serde(rename = "type")]
        ty: Type,
    },
    #[serde(rename = "let")]
    Let { name: String, value: NodeId, body: NodeId },
    #[serde(rename = "airRef")]
    AirRef { ns: String, name: String, args: Vec<NodeId> },
    #[serde(rename = "predicate")]
    Predicate { name: String, value: NodeId },

    // ---- CIR ----
    #[serde(rename = "lambda")]
    Lambda {
        params: Vec<String>,
        body: NodeId,
        #[serde(rename = "type")]
        ty: Type,
    },
    #[serde(rename = "callExpr")]
    CallExpr {
        #[serde(rename = "fn")]
        callee: NodeId,
        args: Vec<NodeId>,
    },
    #[serde(rename = "fix")]
    Fix {
        #[serde(rename = "fn")]
        fn_ref: NodeId,
        #[serde(rename = "type")]
        ty: Type,
    },

    // ---- EIR ----
    #[serde(rename = "seq")]
    Seq { first: NodeId, then: NodeId },
    #[serde(rename = "assign")]
    Assign { target: String, value: NodeId },
    #[serde(rename = "while")]
    While { cond: NodeId, body: NodeId },
    #[serde(rename = "for")]
    For {
        var: String,
        init: NodeId,
        cond: NodeId,
        update: NodeId,
        body: NodeId,
    },
    #[serde(rename = "iter")]
    Iter { var: String, iter: NodeId, body: NodeId },
    #[serde(rename = "effect")]
    Effect { op: String, args: Vec<NodeId> },
    #[serde(rename = "refCell")]
    RefCellNew { target: String },
    #[serde(rename = "deref")]
    Deref { target: String },
    #[serde(rename = "try")]
    Try {
        #[serde(rename = "tryBody")]
        try_body: NodeId,
        #[serde(rename = "catchParam")]
        catch_param: String,
        #[serde(rename = "catchBody")]
        catch_body: NodeId,
        #[serde(default)]
        fallback: Option<NodeId>,
    },

    // ---- PIR ----
    #[serde(rename = "spawn")]
    Spawn { task: NodeId },
    #[serde(rename = "await")]
    Await {
        future: NodeId,
        #[serde(default)]
        timeout: Option<NodeId>,
        #[serde(default)]
        fallback: Option<NodeId>,
        #[serde(default, rename = "returnIndex")]
        return_index: Option<bool>,
    },
    #[serde(rename = "channel")]
    ChannelNew {
        #[serde(rename = "channelType")]
        channel_type: String,
        #[serde(default, rename = "bufferSize")]
        buffer_size: Option<NodeId>,
    },
    #[serde(rename = "send")]
    Send { channel: NodeId, value: NodeId },
    #[serde(rename = "recv")]
    Recv { channel: NodeId },
    #[serde(rename = "select")]
    Select {
        futures: Vec<NodeId>,
        #[serde(default)]
        timeout: Option<NodeId>,
        #[serde(default)]
        fallback: Option<NodeId>,
        #[serde(default, rename = "returnIndex")]
        return_index: Option<bool>,
    },
    #[serde(rename = "race")]
    Race { tasks: Vec<NodeId> },
    #[serde(rename = "par")]
    Par { branches: Vec<NodeId> },
}

impl Expr {
    /// The wire `kind` tag, for diagnostics and layer-legality checks.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Lit { .. } => "lit",
            Expr::Ref { .. } => "ref",
            Expr::Var { .. } => "var",
            Expr::Call { .. } => "call",
            Expr::If { .. } => "if",
            Expr::Let { .. } => "let",
            Expr::AirRef { .. } => "airRef",
            Expr::Predicate { .. } => "predicate",
            Expr::Lambda { .. } => "lambda",
            Expr::CallExpr { .. } => "callExpr",
            Expr::Fix { .. } => "fix",
            Expr::Seq { .. } => "seq",
            Expr::Assign { .. } => "assign",
            Expr::While { .. } => "while",
            Expr::For { .. } => "for",
            Expr::Iter { .. } => "iter",
            Expr::Effect { .. } => "effect",
            Expr::RefCellNew { .. } => "refCell",
            Expr::Deref { .. } => "deref",
            Expr::Try { .. } => "try",
            Expr::Spawn { .. } => "spawn",
            Expr::Await { .. } => "await",
            Expr::ChannelNew { .. } => "channel",
            Expr::Send { .. } => "send",
            Expr::Recv { .. } => "recv",
            Expr::Select { .. } => "select",
            Expr::Race { .. } => "race",
            Expr::Par { .. } => "par",
        }
    }

    /// Every node id this expression directly refers to (not transitively).
    /// Used by validators for referential-integrity checks and by the
    /// evaluator for memoization scoping.
    #[must_use]
    pub fn referenced_ids(&self) -> Vec<&NodeId> {
        match self {
            Expr::Lit { .. } | Expr::Var { .. } | Expr::RefCellNew { .. } | Expr::Deref { .. } => {
                vec![]
            }
            Expr::Ref { id } => vec![id],
            Expr::Call { args, .. } | Expr::AirRef { args, .. } | Expr::Effect { op: _, args } => {
                args.iter().collect()
            }
            Expr::If { cond, then_branch, else_branch, .. } => {
                vec![cond, then_branch, else_branch]
            }
            Expr::Let { value, body, .. } => vec![value, body],
            Expr::Predicate { value, .. } => vec![value],
            Expr::Lambda { body, .. } => vec![body],
            Expr::CallExpr { callee, args } => {
                let mut v = vec![callee];
                v.extend(args.iter());
                v
            }
            Expr::Fix { fn_ref, .. } => vec![fn_ref],
            Expr::Seq { first, then } => vec![first, then],
            Expr::Assign { value, .. } => vec![value],
            Expr::While { cond, body } => vec![cond, body],
            Expr::For { init, cond, update, body, .. } => vec![init, cond, update, body],
            Expr::Iter { iter, body, .. } => vec![iter, body],
            Expr::Try { try_body, catch_body, fallback, .. } => {
                let mut v = vec![try_body, catch_body];
                v.extend(fallback.iter());
                v
            }
            Expr::Spawn { task } => vec![task],
            Expr::Await { future, timeout, fallback, .. } => {
                let mut v = vec![future];
                v.extend(timeout.iter());
                v.extend(fallback.iter());
                v
            }
            Expr::ChannelNew { buffer_size, .. } => buffer_size.iter().collect(),
            Expr::Send { channel, value } => vec![channel, value],
            Expr::Recv { channel } => vec![channel],
            Expr::Select { futures, timeout, fallback, .. } => {
                let mut v: Vec<&NodeId> = futures.iter().collect();
                v.extend(timeout.iter());
                v.extend(fallback.iter());
                v
            }
            Expr::Race { tasks } => tasks.iter().collect(),
            Expr::Par { branches } => branches.iter().collect(),
        }
    }
}
