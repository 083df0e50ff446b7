//! CAIRS Validate - per-layer structural validators (§4.5)
//!
//! Five entry points, one per IR layer, all built on one shared walk: collect
//! every issue found (never stop at the first), then derive `valid` from
//! whether the list is empty.
//!
//! Referential integrity naturally excludes lambda parameter names from
//! node-id resolution — [`cairs_ir::Expr::referenced_ids`] only returns ids
//! an expression actually points at by id, and a `lambda`'s parameter names
//! are never among them (they resolve against lexical scope, per the spec's
//! own open question about this exact false-positive class).

use cairs_diagnostic::{Issue, Report};
use cairs_ir::{Document, ErrorCode, Layer, NodeBody};
use rustc_hash::FxHashSet;

fn is_valid_semver(version: &str) -> bool {
    let (core, _pre) = version.split_once('-').unwrap_or((version, ""));
    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Run every §4.5 check for `doc` against `expected_layer`.
#[must_use]
pub fn validate(doc: &Document, expected_layer: Layer) -> Report {
    let mut report = Report::empty();

    // 1. version present and semver-shaped.
    if doc.version.is_empty() {
        report.push(Issue::new(ErrorCode::MissingRequiredField, "$.version", "version is required"));
    } else if !is_valid_semver(&doc.version) {
        report.push(Issue::new(
            ErrorCode::InvalidResultReference,
            "$.version",
            format!("\"{}\" is not a valid semver string", doc.version),
        ));
    }

    if doc.layer != expected_layer {
        report.push(Issue::new(
            ErrorCode::ValidationError,
            "$.layer",
            format!("expected layer {:?}, document declares {:?}", expected_layer, doc.layer),
        ));
    }

    // 2 & 7. nodes present, unique ids.
    if doc.nodes.is_empty() {
        report.push(Issue::new(ErrorCode::MissingRequiredField, "$.nodes", "nodes must be non-empty"));
    }
    let mut seen_ids = FxHashSet::default();
    for (i, node) in doc.nodes.iter().enumerate() {
        if !seen_ids.insert(node.id.clone()) {
            report.push(Issue::new(
                ErrorCode::DuplicateNodeId,
                format!("$.nodes[{i}].id"),
                format!("duplicate node id \"{}\"", node.id),
            ));
        }
    }

    // 3. result resolves.
    if doc.find_node(&doc.result).is_none() {
        report.push(Issue::new(
            ErrorCode::InvalidResultReference,
            "$.result",
            format!("result \"{}\" does not resolve to a node", doc.result),
        ));
    }

    for (i, node) in doc.nodes.iter().enumerate() {
        let path_prefix = format!("$.nodes[{i}]");
        match &node.body {
            NodeBody::Expr { expr } => {
                // 5. kind legality for this layer.
                if !expected_layer.allows_expr_kind(expr.kind()) {
                    report.push(Issue::new(
                        ErrorCode::InvalidExprFormat,
                        format!("{path_prefix}.expr"),
                        format!("\"{}\" is not legal in {:?}", expr.kind(), expected_layer),
                    ));
                }
                // 4. every id-reference resolves.
                for referenced in expr.referenced_ids() {
                    if doc.find_node(referenced).is_none() {
                        report.push(Issue::new(
                            ErrorCode::InvalidIdFormat,
                            format!("{path_prefix}.expr"),
                            format!("reference to unknown node \"{referenced}\""),
                        ));
                    }
                }
            }
            NodeBody::Block { blocks, entry } => {
                // 6. entry resolves within this node's own block set.
                let block_ids: FxHashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
                if !block_ids.contains(entry.as_str()) {
                    report.push(Issue::new(
                        ErrorCode::InvalidIdFormat,
                        format!("{path_prefix}.entry"),
                        format!("entry \"{entry}\" does not resolve to a block"),
                    ));
                }
                for block in blocks {
                    for target in block.terminator.target_blocks() {
                        if !block_ids.contains(target.as_str()) {
                            report.push(Issue::new(
                                ErrorCode::InvalidIdFormat,
                                format!("{path_prefix}.blocks[{}].terminator", block.id),
                                format!("terminator target \"{target}\" does not resolve to a block"),
                            ));
                        }
                    }
                    if let cairs_ir::Terminator::Suspend { future, .. } = &block.terminator {
                        if doc.find_node(future).is_none() {
                            report.push(Issue::new(
                                ErrorCode::InvalidIdFormat,
                                format!("{path_prefix}.blocks[{}].terminator", block.id),
                                format!("suspend future \"{future}\" does not resolve to a node"),
                            ));
                        }
                    }
                    for instr in &block.instructions {
                        match instr {
                            cairs_ir::Instruction::Phi { sources, .. } => {
                                for source in sources {
                                    if !block_ids.contains(source.block.as_str()) {
                                        report.push(Issue::new(
                                            ErrorCode::InvalidIdFormat,
                                            format!("{path_prefix}.blocks[{}].phi", block.id),
                                            format!(
                                                "phi source block \"{}\" does not resolve",
                                                source.block
                                            ),
                                        ));
                                    }
                                }
                            }
                            cairs_ir::Instruction::Assign { value, .. } => {
                                for referenced in value.referenced_ids() {
                                    if doc.find_node(referenced).is_none() {
                                        report.push(Issue::new(
                                            ErrorCode::InvalidIdFormat,
                                            format!("{path_prefix}.blocks[{}].assign", block.id),
                                            format!("reference to unknown node \"{referenced}\""),
                                        ));
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    report
}

#[must_use]
pub fn validate_air(doc: &Document) -> Report {
    validate(doc, Layer::Air)
}

#[must_use]
pub fn validate_cir(doc: &Document) -> Report {
    validate(doc, Layer::Cir)
}

#[must_use]
pub fn validate_eir(doc: &Document) -> Report {
    validate(doc, Layer::Eir)
}

#[must_use]
pub fn validate_lir(doc: &Document) -> Report {
    validate(doc, Layer::Lir)
}

#[must_use]
pub fn validate_pir(doc: &Document) -> Report {
    validate(doc, Layer::Pir)
}
