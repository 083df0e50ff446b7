//! Documents (§3 DATA MODEL, Document): the top-level JSON shape the
//! orchestrator consumes.

use crate::expr::{Expr, NodeId};
use crate::lir::{Block, BlockId};
use serde::{Deserialize, Serialize};

/// Which IR layer a document is written in. The spec's wire format leaves
/// this implicit in practice (it falls out of which node kinds appear), but
/// `capabilities` is explicitly advisory-only (§6) rather than authoritative,
/// so the orchestrator needs a real discriminant to pick an evaluator (§4.11)
/// without first walking every node to infer one. This field is a
/// Rust-native addition over the wire format described in §3/§6: it is
/// required, not advisory, and sits beside `capabilities` rather than
/// replacing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Air,
    Cir,
    Eir,
    Lir,
    Pir,
}

impl Layer {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Air => "air",
            Layer::Cir => "cir",
            Layer::Eir => "eir",
            Layer::Lir => "lir",
            Layer::Pir => "pir",
        }
    }

    /// `true` if `kind` is a legal expression kind for this layer (§3
    /// invariant 4, §4.5 check 5). Each layer is a conservative extension of
    /// the one before it, so legality is cumulative.
    #[must_use]
    pub fn allows_expr_kind(self, kind: &str) -> bool {
        const AIR: &[&str] =
            &["lit", "ref", "var", "call", "if", "let", "airRef", "predicate"];
        const CIR_ONLY: &[&str] = &["lambda", "callExpr", "fix"];
        const EIR_ONLY: &[&str] = &[
            "seq", "assign", "while", "for", "iter", "effect", "refCell", "deref", "try",
        ];
        const PIR_ONLY: &[&str] = &[
            "spawn", "await", "channel", "send", "recv", "select", "race", "par",
        ];

        match self {
            Layer::Air => AIR.contains(&kind),
            Layer::Cir => AIR.contains(&kind) || CIR_ONLY.contains(&kind),
            Layer::Eir | Layer::Lir => {
                AIR.contains(&kind) || CIR_ONLY.contains(&kind) || EIR_ONLY.contains(&kind)
            }
            Layer::Pir => {
                AIR.contains(&kind)
                    || CIR_ONLY.contains(&kind)
                    || EIR_ONLY.contains(&kind)
                    || PIR_ONLY.contains(&kind)
            }
        }
    }
}

/// A named, globally addressable definition (`ns:name`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AirDef {
    pub ns: String,
    pub name: String,
    pub params: Vec<String>,
    pub result: crate::ty::Type,
    pub body: Expr,
}

impl AirDef {
    /// The key defs are addressed by (`ns:name`).
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.ns, self.name)
    }
}

/// A node body: either an expression or a CFG block list (§3, "Hybrid
/// nodes"). Untagged: the shape of the JSON object (presence of `blocks` +
/// `entry` versus `expr`) discriminates.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeBody {
    Block { blocks: Vec<Block>, entry: BlockId },
    Expr { expr: Expr },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub body: NodeBody,
}

impl Node {
    #[must_use]
    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.body {
            NodeBody::Expr { expr } => Some(expr),
            NodeBody::Block { .. } => None,
        }
    }

    #[must_use]
    pub fn as_blocks(&self) -> Option<(&[Block], &BlockId)> {
        match &self.body {
            NodeBody::Block { blocks, entry } => Some((blocks.as_slice(), entry)),
            NodeBody::Expr { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub layer: Layer,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, rename = "airDefs")]
    pub air_defs: Vec<AirDef>,
    pub nodes: Vec<Node>,
    pub result: NodeId,
}

impl Document {
    #[must_use]
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn find_def(&self, ns: &str, name: &str) -> Option<&AirDef> {
        self.air_defs.iter().find(|d| d.ns == ns && d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_legality_is_cumulative() {
        assert!(Layer::Air.allows_expr_kind("call"));
        assert!(!Layer::Air.allows_expr_kind("lambda"));
        assert!(Layer::Cir.allows_expr_kind("lambda"));
        assert!(Layer::Eir.allows_expr_kind("lambda"));
        assert!(!Layer::Eir.allows_expr_kind("spawn"));
        assert!(Layer::Pir.allows_expr_kind("spawn"));
        assert!(Layer::Pir.allows_expr_kind("while"));
    }

    #[test]
    fn def_key_is_namespaced() {
        let def = AirDef {
            ns: "math".into(),
            name: "square".into(),
            params: vec!["x".into()],
            result: crate::ty::Type::Int,
            body: Expr::Var { name: "x".into() },
        };
        assert_eq!(def.key(), "math:square");
    }

    #[test]
    fn node_body_untagged_dispatch() {
        let expr_json = r#"{"id":"a","expr":{"kind":"lit","type":{"kind":"int"},"value":1}}"#;
        let n: Node = serde_json::from_str(expr_json).expect("valid node");
        assert!(n.as_expr().is_some());
        assert!(n.as_blocks().is_none());
    }

    #[test]
    fn document_lookup_by_id() {
        let doc_json = r#"{
            "version":"1.0.0",
            "layer":"air",
            "airDefs":[],
            "nodes":[{"id":"a","expr":{"kind":"lit","type":{"kind":"int"},"value":1}}],
            "result":"a"
        }"#;
        let doc: Document = serde_json::from_str(doc_json).expect("valid document");
        assert!(doc.find_node("a").is_some());
        assert!(doc.find_node("missing").is_none());
    }
}
