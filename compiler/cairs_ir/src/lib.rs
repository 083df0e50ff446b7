//! CAIRS IR - shared value, type, and expression model
//!
//! This crate contains the data structures every CAIRS IR layer (AIR, CIR,
//! EIR, LIR, PIR) builds on:
//! - The type algebra (`ty`) and the closed error-code set (`error`).
//! - The runtime value algebra (`value`), including value hashing.
//! - Immutable-extend value environments (`env`).
//! - The expression AST (`expr`) and the LIR CFG form (`lir`).
//! - Documents (`doc`): the node table, named defs, and the result node.
//!
//! # Design Philosophy
//!
//! - **Share by reference**: expressions refer to each other by node id
//!   (`String`), never by inline sub-expression.
//! - **Values, not exceptions**: every evaluation failure is a `Value::Error`,
//!   never a panic or an unwind.
//! - **Arc everywhere**: every heap-allocated value variant is `Send + Sync`,
//!   since the PIR evaluator shares values across spawned tasks.

pub mod doc;
pub mod env;
pub mod error;
pub mod expr;
pub mod lir;
pub mod ty;
pub mod value;

pub use doc::{AirDef, Document, Layer, Node, NodeBody};
pub use env::ValueEnv;
pub use error::ErrorCode;
pub use expr::{Expr, NodeId};
pub use lir::{Block, BlockId, Instruction, PhiSource, Terminator};
pub use ty::Type;
pub use value::{value_hash, ChannelHandle, ClosureValue, ErrorValue, FutureValue, Heap, Value};
