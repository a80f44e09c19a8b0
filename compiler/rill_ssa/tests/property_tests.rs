//! Property-based tests for def-use bookkeeping.
//!
//! 1. For any straight-line block of binary instructions, every value's
//!    use-list length equals the number of operand positions reading it.
//! 2. Such a block, closed with `ret`, always verifies clean.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use proptest::prelude::*;
use rill_ir::Id;
use rill_ssa::{add, arg, mul, ret, sub, verify, xor, IrGraph, ValueId};

/// One instruction: operator selector plus two operand picks, each reduced
/// modulo the number of values defined so far.
fn inst_strategy() -> impl Strategy<Value = (u8, usize, usize)> {
    (0u8..4, any::<usize>(), any::<usize>())
}

fn build(arg_count: u32, insts: &[(u8, usize, usize)]) -> (IrGraph, Vec<ValueId>) {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let mut defined: Vec<ValueId> = (0..arg_count)
        .map(|i| arg(&mut graph, entry, Id::from_raw(i), i))
        .collect();

    for &(op, lhs, rhs) in insts {
        let lhs = defined[lhs % defined.len()];
        let rhs = defined[rhs % defined.len()];
        let ctor = match op {
            0 => add,
            1 => sub,
            2 => mul,
            _ => xor,
        };
        defined.push(ctor(&mut graph, entry, Id::default(), lhs, rhs));
    }
    let last = defined.last().copied();
    ret(&mut graph, entry, last);
    (graph, defined)
}

proptest! {
    #[test]
    fn use_counts_match_operand_reads(
        arg_count in 1u32..5,
        insts in prop::collection::vec(inst_strategy(), 0..40),
    ) {
        let (graph, _) = build(arg_count, &insts);

        for value in graph.value_ids() {
            let reads: usize = graph
                .value_ids()
                .map(|user| {
                    graph
                        .value(user)
                        .used_values()
                        .iter()
                        .filter(|&&read| read == value)
                        .count()
                })
                .sum();
            prop_assert_eq!(graph.value(value).uses().len(), reads);
            for edge in graph.value(value).uses() {
                prop_assert_eq!(edge.value, value);
            }
        }
    }

    #[test]
    fn straight_line_blocks_verify(
        arg_count in 1u32..5,
        insts in prop::collection::vec(inst_strategy(), 0..40),
    ) {
        let (graph, defined) = build(arg_count, &insts);
        let report = verify(&graph);

        prop_assert!(report.is_well_formed(), "{:?}", report.problems);
        prop_assert_eq!(report.well_formed_blocks(), 1);
        // Arguments are not instructions; everything else plus the ret is.
        let entry = graph.block_ids().next().unwrap();
        prop_assert_eq!(graph.block(entry).insts().len(), insts.len() + 1);
        prop_assert_eq!(defined.len(), arg_count as usize + insts.len());
    }
}
