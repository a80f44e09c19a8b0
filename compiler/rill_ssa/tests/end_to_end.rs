//! Build small functions through the public API and verify them.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use rill_ir::Context;
use rill_ssa::{
    add, arg, call, const_int, const_string, icmp, init_tracing, je, jmp, phi, ret, set_arg,
    verify, FunctionRef, ICmp, IrGraph, Kind, PhiAlt, Use, ValueId,
};

/// B0 branches to B1 or B2, B1 computes `t = a + b` and jumps to B2,
/// B2 merges `a` and `t`.
struct Join {
    graph: IrGraph,
    a: ValueId,
    t: ValueId,
    cond: ValueId,
    branch: ValueId,
    merge: ValueId,
}

fn build_join(ctx: &mut Context<'_>, cond_is_a: bool) -> Join {
    let name_a = ctx.add_qualified_name("a");
    let name_b = ctx.add_qualified_name("b");
    let name_c = ctx.add_qualified_name("cond");
    let name_t = ctx.add_qualified_name("t");
    let name_m = ctx.add_qualified_name("merge");

    let mut graph = IrGraph::new();
    let b0 = graph.new_block();
    let b1 = graph.new_block();
    let b2 = graph.new_block();

    let a = arg(&mut graph, b0, name_a, 0);
    let b = arg(&mut graph, b0, name_b, 1);
    let cond = if cond_is_a {
        a
    } else {
        arg(&mut graph, b0, name_c, 2)
    };
    let branch = je(&mut graph, b0, cond, b1, b2);

    let t = add(&mut graph, b1, name_t, a, b);
    jmp(&mut graph, b1, b2);

    let merge = phi(
        &mut graph,
        b2,
        name_m,
        vec![
            PhiAlt {
                from_block: b0,
                value: a,
            },
            PhiAlt {
                from_block: b1,
                value: t,
            },
        ],
    );
    ret(&mut graph, b2, Some(merge));

    Join {
        graph,
        a,
        t,
        cond,
        branch,
        merge,
    }
}

#[test]
fn join_with_separate_condition() {
    init_tracing();
    let mut ctx = Context::new();
    let join = build_join(&mut ctx, false);

    let report = verify(&join.graph);
    assert!(report.is_well_formed(), "{:?}", report.problems);
    assert_eq!(report.blocks_checked, 3);
    assert_eq!(report.well_formed_blocks(), 3);

    let users: Vec<ValueId> = join.graph.value(join.a).uses().iter().map(|u| u.user).collect();
    assert!(users.contains(&join.t));
    assert!(users.contains(&join.merge));
    assert!(!users.contains(&join.branch));
    assert_eq!(
        join.graph.value(join.cond).uses(),
        &[Use {
            value: join.cond,
            user: join.branch
        }]
    );
    assert_eq!(
        join.graph.value(join.t).uses(),
        &[Use {
            value: join.t,
            user: join.merge
        }]
    );
}

#[test]
fn join_branching_on_a() {
    init_tracing();
    let mut ctx = Context::new();
    let join = build_join(&mut ctx, true);

    let report = verify(&join.graph);
    assert_eq!(report.well_formed_blocks(), 3);
    assert!(report.is_well_formed());

    let users: Vec<ValueId> = join.graph.value(join.a).uses().iter().map(|u| u.user).collect();
    assert_eq!(users, vec![join.branch, join.t, join.merge]);
    assert_eq!(join.graph.value(join.merge).kind(), Kind::Phi);
}

#[test]
fn block_use_lists_name_their_referrers() {
    let mut ctx = Context::new();
    let join = build_join(&mut ctx, false);
    let graph = &join.graph;
    let blocks: Vec<_> = graph.block_ids().collect();

    // B0 is only a phi predecessor; B1 is a branch target and a phi
    // predecessor; B2 is reached from the branch and the jump.
    assert_eq!(graph.block(blocks[0]).uses(), &[join.merge]);
    assert_eq!(graph.block(blocks[1]).uses(), &[join.branch, join.merge]);
    assert_eq!(graph.block(blocks[2]).uses().len(), 2);
    assert_eq!(graph.block(blocks[2]).uses()[0], join.branch);
}

#[test]
fn call_with_string_and_comparison() {
    init_tracing();
    let mut ctx = Context::new();
    let print = ctx.add_qualified_name("io.print");
    let done = ctx.add_qualified_name("done");

    let mut graph = IrGraph::new();
    let entry = graph.new_block();
    let message = const_string(&mut graph, &mut ctx, entry, b"hello");
    let zero = const_int(&mut graph, entry, 0);
    let c = call(&mut graph, entry, print, FunctionRef::new(1), 1);

    // Unset slot is a verifier problem until filled.
    assert!(!verify(&graph).is_well_formed());

    set_arg(&mut graph, c, 0, message).unwrap();
    let ok = icmp(&mut graph, entry, done, c, zero, ICmp::Eq);
    ret(&mut graph, entry, Some(ok));

    let report = verify(&graph);
    assert!(report.is_well_formed(), "{:?}", report.problems);
    assert_eq!(graph.value(message).uses().len(), 1);
    assert_eq!(ctx.text(print).unwrap(), b"io.print");
    assert_eq!(ctx.segment_text(print, 1).unwrap(), b"print");
}
