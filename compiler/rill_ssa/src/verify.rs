//! Structural verifier for the SSA graph.
//!
//! Construction is unchecked; this pass reports what callers got wrong.
//! Problems are collected rather than returned early, so one run lists
//! every malformed block.
//!
//! # Rules
//!
//! - A block ends in exactly one terminating instruction (`ret`/`je`/`jmp`).
//! - Phis form a contiguous prefix of their block.
//! - Every variable-arity slot has been filled by `set_arg`.
//! - Use-lists mirror operands exactly: an instruction reading a value `n`
//!   times appears `n` times in that value's use-list, and nothing else does.
//! - Every block an instruction references lists that instruction as a user.

use crate::ir::{BlockId, InstData, IrGraph, Kind, ValueId};

/// A single well-formedness violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyProblem {
    /// The block is empty or its last instruction does not terminate.
    MissingTerminator { block: BlockId },
    /// A terminating instruction is followed by more instructions.
    TerminatorNotLast { block: BlockId, inst: ValueId },
    /// A phi follows a non-phi instruction.
    PhiNotAtStart { block: BlockId, inst: ValueId },
    /// A variable-arity slot was never filled.
    UnsetSlot {
        block: BlockId,
        inst: ValueId,
        index: usize,
    },
    /// `user` reads `value` more often than `value`'s use-list records.
    MissingUse {
        block: BlockId,
        value: ValueId,
        user: ValueId,
    },
    /// `value`'s use-list records `user` more often than `user` reads it.
    StaleUse {
        block: Option<BlockId>,
        value: ValueId,
        user: ValueId,
    },
    /// `user` references `target` but is missing from its block-use list.
    MissingBlockUse {
        block: BlockId,
        target: BlockId,
        user: ValueId,
    },
}

impl VerifyProblem {
    /// The block the problem is attributed to.
    pub fn block(&self) -> Option<BlockId> {
        match self {
            VerifyProblem::MissingTerminator { block }
            | VerifyProblem::TerminatorNotLast { block, .. }
            | VerifyProblem::PhiNotAtStart { block, .. }
            | VerifyProblem::UnsetSlot { block, .. }
            | VerifyProblem::MissingUse { block, .. }
            | VerifyProblem::MissingBlockUse { block, .. } => Some(*block),
            VerifyProblem::StaleUse { block, .. } => *block,
        }
    }
}

/// Result of verifying a whole graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub blocks_checked: usize,
    pub problems: Vec<VerifyProblem>,
}

impl VerifyReport {
    pub fn is_well_formed(&self) -> bool {
        self.problems.is_empty()
    }

    /// Number of checked blocks with no problem attributed to them.
    pub fn well_formed_blocks(&self) -> usize {
        let mut bad: Vec<BlockId> = self.problems.iter().filter_map(VerifyProblem::block).collect();
        bad.sort_unstable();
        bad.dedup();
        self.blocks_checked - bad.len()
    }
}

/// Verify every block of `graph`, plus every use-list.
pub fn verify(graph: &IrGraph) -> VerifyReport {
    let mut problems = Vec::new();
    for block in graph.block_ids() {
        verify_block_into(graph, block, &mut problems);
    }
    check_stale_uses(graph, &mut problems);

    let report = VerifyReport {
        blocks_checked: graph.block_count(),
        problems,
    };
    tracing::debug!(
        blocks = report.blocks_checked,
        well_formed = report.well_formed_blocks(),
        problems = report.problems.len(),
        "verified IR graph"
    );
    report
}

/// Verify a single block: terminator and phi placement, slots, and the
/// use edges of its instructions.
pub fn verify_block(graph: &IrGraph, block: BlockId) -> Vec<VerifyProblem> {
    let mut problems = Vec::new();
    verify_block_into(graph, block, &mut problems);
    problems
}

fn verify_block_into(graph: &IrGraph, block: BlockId, problems: &mut Vec<VerifyProblem>) {
    let insts = graph.block(block).insts();

    match insts.last() {
        Some(&last) if graph.value(last).kind().is_terminating() => {}
        _ => problems.push(VerifyProblem::MissingTerminator { block }),
    }

    let mut in_phi_prefix = true;
    for (pos, &inst) in insts.iter().enumerate() {
        let value = graph.value(inst);
        let kind = value.kind();

        if kind.is_terminating() && pos + 1 < insts.len() {
            problems.push(VerifyProblem::TerminatorNotLast { block, inst });
        }
        if kind == Kind::Phi {
            if !in_phi_prefix {
                problems.push(VerifyProblem::PhiNotAtStart { block, inst });
            }
        } else {
            in_phi_prefix = false;
        }

        let Some(data) = value.inst() else {
            continue;
        };
        check_slots(block, inst, data, problems);
        check_uses(graph, block, inst, data, problems);
        check_block_uses(graph, block, inst, data, problems);
    }
}

fn check_slots(block: BlockId, inst: ValueId, data: &InstData, problems: &mut Vec<VerifyProblem>) {
    let Some(slots) = data.slots() else {
        return;
    };
    for (index, slot) in slots.iter().enumerate() {
        if slot.is_none() {
            problems.push(VerifyProblem::UnsetSlot { block, inst, index });
        }
    }
}

fn check_uses(
    graph: &IrGraph,
    block: BlockId,
    user: ValueId,
    data: &InstData,
    problems: &mut Vec<VerifyProblem>,
) {
    for (value, reads) in counted(data.used_values()) {
        let edges = graph
            .value(value)
            .uses()
            .iter()
            .filter(|edge| edge.user == user)
            .count();
        if edges < reads {
            problems.push(VerifyProblem::MissingUse { block, value, user });
        }
    }
}

fn check_block_uses(
    graph: &IrGraph,
    block: BlockId,
    user: ValueId,
    data: &InstData,
    problems: &mut Vec<VerifyProblem>,
) {
    for (target, refs) in counted(data.used_blocks()) {
        let edges = graph
            .block(target)
            .uses()
            .iter()
            .filter(|&&u| u == user)
            .count();
        if edges < refs {
            problems.push(VerifyProblem::MissingBlockUse {
                block,
                target,
                user,
            });
        }
    }
}

/// Flag use edges with no matching operand.
fn check_stale_uses(graph: &IrGraph, problems: &mut Vec<VerifyProblem>) {
    for value in graph.value_ids() {
        let users = graph.value(value).uses().iter().map(|edge| edge.user);
        for (user, edges) in counted(users) {
            let user_value = graph.value(user);
            let reads = user_value
                .used_values()
                .iter()
                .filter(|&&read| read == value)
                .count();
            if edges > reads {
                problems.push(VerifyProblem::StaleUse {
                    block: user_value.block(),
                    value,
                    user,
                });
            }
        }
    }
}

/// Distinct items with their multiplicity, in first-seen order.
fn counted<T: Copy + PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
