//! The LIR control-flow-graph form (§3, §4.7): basic blocks of straight-line
//! instructions ending in a structured terminator.

use crate::expr::{Expr, NodeId};
use serde::{Deserialize, Serialize};

/// A block id, scoped to the node that owns the block list.
pub type BlockId = String;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

/// Where a `phi` instruction picks its value from: the block on the
/// predecessor edge that was actually taken.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhiSource {
    pub block: BlockId,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Instruction {
    #[serde(rename = "assign")]
    Assign { target: String, value: Expr },
    #[serde(rename = "op")]
    Op { target: String, ns: String, name: String, args: Vec<String> },
    #[serde(rename = "phi")]
    Phi { target: String, sources: Vec<PhiSource> },
    #[serde(rename = "effect")]
    Effect { op: String, args: Vec<String> },
    #[serde(rename = "assignRef")]
    AssignRef { target: String, value: String },
    #[serde(rename = "call")]
    Call { target: String, callee: String, args: Vec<String> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Terminator {
    #[serde(rename = "jump")]
    Jump { to: BlockId },
    #[serde(rename = "branch")]
    Branch {
        cond: String,
        #[serde(rename = "then")]
        then_block: BlockId,
        #[serde(rename = "else")]
        else_block: BlockId,
    },
    #[serde(rename = "return")]
    Return {
        #[serde(default)]
        value: Option<String>,
    },
    #[serde(rename = "exit")]
    Exit {
        #[serde(default)]
        code: Option<i64>,
    },
    /// PIR-LIR only.
    #[serde(rename = "fork")]
    Fork { branches: Vec<BlockId>, continuation: BlockId },
    /// PIR-LIR only.
    #[serde(rename = "suspend")]
    Suspend {
        future: NodeId,
        #[serde(rename = "resumeBlock")]
        resume_block: BlockId,
    },
}

impl Terminator {
    /// Block ids this terminator may transfer control to, for validator
    /// referential-integrity checks (§4.5 check 6).
    #[must_use]
    pub fn target_blocks(&self) -> Vec<&BlockId> {
        match self {
            Terminator::Jump { to } => vec![to],
            Terminator::Branch { then_block, else_block, .. } => vec![then_block, else_block],
            Terminator::Return { .. } | Terminator::Exit { .. } => vec![],
            Terminator::Fork { branches, continuation } => {
                let mut v: Vec<&BlockId> = branches.iter().collect();
                v.push(continuation);
                v
            }
            Terminator::Suspend { resume_block, .. } => vec![resume_block],
        }
    }
}
