//! SSA instruction model for the Rill compiler.
//!
//! This crate provides:
//!
//! - **SSA IR** ([`IrGraph`], [`Value`], [`InstData`], [`Block`]): typed
//!   values and instructions with explicit def-use bookkeeping
//! - **Construction functions** ([`add`], [`call`], [`phi`], ...): the only
//!   way to create nodes; each one wires use-lists as it goes
//! - **Verifier** ([`verify`]): terminator placement, phi placement, unset
//!   call slots and use-list integrity
//!
//! # Crate Dependencies
//!
//! `rill_ssa` depends on `rill_ir` for [`Id`](rill_ir::Id) names and the
//! [`Context`](rill_ir::Context) arena. Types, functions and constructors
//! are opaque handles owned by the surrounding compiler.

pub mod build;
pub mod ir;
pub mod verify;

pub use build::{
    add, add_block_use, arg, arg_at, bitand, call, call_dyn, call_dyn_gen, call_foreign, call_gen,
    const_float, const_int, const_string, div, fadd, fcmp, fdiv, fext, fmul, fsub, ftrunc, fun,
    icmp, idiv, irem, je, jmp, mul, or, phi, record, rem, ret, sar, set_arg, sext, shl, shr, sub,
    trunc, tup, xor, zext, IrError,
};
pub use ir::{
    is_terminating, BinOp, Block, BlockId, CastOp, ConRef, FCmp, ForeignRef, FunctionRef, ICmp,
    InstData, IrGraph, Kind, PhiAlt, ShiftOp, TypeRef, Use, Value, ValueData, ValueId,
};
pub use verify::{verify, verify_block, VerifyProblem, VerifyReport};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=rill_ssa=debug`, or
/// `RUST_LOG=rill_ir=trace` to see arena growth and interning.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
