use pretty_assertions::assert_eq;
use rill_ir::Id;

use crate::build::{add, arg, call, jmp, phi, ret, set_arg};
use crate::ir::{FunctionRef, PhiAlt, Use};

use super::*;

fn name(n: u32) -> Id {
    Id::from_raw(n)
}

// Well-formed graphs

#[test]
fn returning_block_is_well_formed() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let b = arg(&mut graph, entry, name(2), 1);
    let sum = add(&mut graph, entry, name(3), a, b);
    ret(&mut graph, entry, Some(sum));

    let report = verify(&graph);
    assert_eq!(report.blocks_checked, 1);
    assert!(report.is_well_formed(), "{:?}", report.problems);
    assert_eq!(report.well_formed_blocks(), 1);
}

#[test]
fn filled_call_is_well_formed() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let c = call(&mut graph, entry, name(2), FunctionRef::new(0), 2);
    set_arg(&mut graph, c, 0, a).unwrap();
    set_arg(&mut graph, c, 1, a).unwrap();
    ret(&mut graph, entry, Some(c));

    assert_eq!(verify_block(&graph, entry), vec![]);
}

#[test]
fn empty_graph_is_well_formed() {
    let report = verify(&IrGraph::new());
    assert_eq!(report, VerifyReport::default());
    assert!(report.is_well_formed());
}

// Terminators

#[test]
fn empty_block_lacks_terminator() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();

    assert_eq!(
        verify_block(&graph, entry),
        vec![VerifyProblem::MissingTerminator { block: entry }]
    );
}

#[test]
fn non_terminating_last_instruction() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    add(&mut graph, entry, name(2), a, a);

    assert_eq!(
        verify_block(&graph, entry),
        vec![VerifyProblem::MissingTerminator { block: entry }]
    );
}

#[test]
fn instruction_after_terminator() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let r = ret(&mut graph, entry, None);
    add(&mut graph, entry, name(2), a, a);

    assert_eq!(
        verify_block(&graph, entry),
        vec![
            VerifyProblem::MissingTerminator { block: entry },
            VerifyProblem::TerminatorNotLast {
                block: entry,
                inst: r
            },
        ]
    );
}

#[test]
fn two_terminators() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let exit = graph.new_block();
    let first = jmp(&mut graph, entry, exit);
    ret(&mut graph, entry, None);
    ret(&mut graph, exit, None);

    let report = verify(&graph);
    assert_eq!(
        report.problems,
        vec![VerifyProblem::TerminatorNotLast {
            block: entry,
            inst: first
        }]
    );
    assert_eq!(report.well_formed_blocks(), 1);
}

// Phis

#[test]
fn phi_after_non_phi() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    add(&mut graph, entry, name(2), a, a);
    let late = phi(
        &mut graph,
        entry,
        name(3),
        vec![PhiAlt {
            from_block: entry,
            value: a,
        }],
    );
    ret(&mut graph, entry, Some(late));

    assert_eq!(
        verify_block(&graph, entry),
        vec![VerifyProblem::PhiNotAtStart {
            block: entry,
            inst: late
        }]
    );
}

#[test]
fn leading_phis_are_accepted() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let alts = vec![PhiAlt {
        from_block: entry,
        value: a,
    }];
    let p = phi(&mut graph, entry, name(2), alts.clone());
    let q = phi(&mut graph, entry, name(3), alts);
    let sum = add(&mut graph, entry, name(4), p, q);
    ret(&mut graph, entry, Some(sum));

    assert_eq!(verify_block(&graph, entry), vec![]);
}

// Slots

#[test]
fn unset_call_slot() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let c = call(&mut graph, entry, name(2), FunctionRef::new(0), 3);
    set_arg(&mut graph, c, 1, a).unwrap();
    ret(&mut graph, entry, None);

    assert_eq!(
        verify_block(&graph, entry),
        vec![
            VerifyProblem::UnsetSlot {
                block: entry,
                inst: c,
                index: 0
            },
            VerifyProblem::UnsetSlot {
                block: entry,
                inst: c,
                index: 2
            },
        ]
    );
}

// Use-lists

#[test]
fn dropped_use_edge() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let square = add(&mut graph, entry, name(2), a, a);
    ret(&mut graph, entry, Some(square));

    graph.uses_mut(a).pop();

    assert_eq!(
        verify(&graph).problems,
        vec![VerifyProblem::MissingUse {
            block: entry,
            value: a,
            user: square
        }]
    );
}

#[test]
fn extra_use_edge() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let a = arg(&mut graph, entry, name(1), 0);
    let b = arg(&mut graph, entry, name(2), 1);
    let sum = add(&mut graph, entry, name(3), a, a);
    ret(&mut graph, entry, Some(sum));

    graph.uses_mut(b).push(Use {
        value: b,
        user: sum,
    });

    let report = verify(&graph);
    assert_eq!(
        report.problems,
        vec![VerifyProblem::StaleUse {
            block: Some(entry),
            value: b,
            user: sum
        }]
    );
    assert_eq!(report.well_formed_blocks(), 0);
}

#[test]
fn dropped_block_use() {
    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let exit = graph.new_block();
    let jump = jmp(&mut graph, entry, exit);
    ret(&mut graph, exit, None);

    graph.block_users_mut(exit).clear();

    assert_eq!(
        verify(&graph).problems,
        vec![VerifyProblem::MissingBlockUse {
            block: entry,
            target: exit,
            user: jump
        }]
    );
}

// Reports

#[test]
fn report_counts_distinct_bad_blocks() {
    let mut graph = IrGraph::new();
    let good = graph.new_block();
    let bad = graph.new_block();
    let empty = graph.new_block();
    ret(&mut graph, good, None);
    let a = arg(&mut graph, bad, name(1), 0);
    let c = call(&mut graph, bad, name(2), FunctionRef::new(0), 2);
    add(&mut graph, bad, name(3), a, c);

    let report = verify(&graph);
    assert_eq!(report.blocks_checked, 3);
    // `bad` has three problems but counts once.
    assert_eq!(report.problems.len(), 4);
    assert_eq!(report.well_formed_blocks(), 1);
    assert!(report
        .problems
        .iter()
        .all(|problem| matches!(problem.block(), Some(block) if block == bad || block == empty)));
}

#[test]
fn problem_block_attribution() {
    let stale = VerifyProblem::StaleUse {
        block: None,
        value: ValueId::new(0),
        user: ValueId::new(1),
    };
    assert_eq!(stale.block(), None);
    assert_eq!(
        VerifyProblem::MissingTerminator {
            block: BlockId::new(2)
        }
        .block(),
        Some(BlockId::new(2))
    );
}
