//! Construction functions for IR nodes.
//!
//! Each function allocates its node in the [`IrGraph`], registers a use on
//! every value it reads (and a block use on every block it references), and
//! appends instructions to their block. Constants and arguments belong to a
//! block but are not part of its instruction sequence.
//!
//! Variable-arity instructions (`call*`, `tup`, `fun`) are created with empty
//! slots. Each slot must then be filled exactly once with [`set_arg`], which
//! also records the use.
//!
//! Construction never fails and never reorders. Appending after a
//! terminator or placing a phi behind a non-phi is logged and left for
//! [`verify`](crate::verify) to report.

use rill_ir::{Context, Id};

use crate::ir::{
    BinOp, BlockId, CastOp, ConRef, FCmp, ForeignRef, FunctionRef, ICmp, InstData, IrGraph, Kind,
    PhiAlt, ShiftOp, TypeRef, Value, ValueData, ValueId,
};

/// Misuse of a variable-arity instruction's slots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error("{kind:?} instruction {inst:?} has no argument slots")]
    NotVariadic { inst: ValueId, kind: Kind },

    #[error("slot {index} is out of range for {inst:?} with {count} slots")]
    SlotOutOfRange {
        inst: ValueId,
        index: usize,
        count: usize,
    },

    #[error("slot {index} of {inst:?} is already set")]
    SlotAlreadySet { inst: ValueId, index: usize },

    #[error("slot {index} of {inst:?} was read before being set")]
    UnsetSlot { inst: ValueId, index: usize },
}

// ── Arguments and constants ─────────────────────────────────────────

/// Function parameter `index`, owned by `block` (normally the entry block).
pub fn arg(graph: &mut IrGraph, block: BlockId, name: Id, index: u32) -> ValueId {
    graph.push_value(Value::new(
        Some(block),
        name,
        None,
        ValueData::Arg { index },
    ))
}

pub fn const_int(graph: &mut IrGraph, block: BlockId, value: i64) -> ValueId {
    graph.push_value(Value::new(
        Some(block),
        Id::default(),
        None,
        ValueData::ConstInt(value),
    ))
}

pub fn const_float(graph: &mut IrGraph, block: BlockId, value: f64) -> ValueId {
    graph.push_value(Value::new(
        Some(block),
        Id::default(),
        None,
        ValueData::ConstFloat(value),
    ))
}

/// String constant. The bytes are copied into the context arena.
pub fn const_string(
    graph: &mut IrGraph,
    ctx: &mut Context<'_>,
    block: BlockId,
    value: &[u8],
) -> ValueId {
    let slice = ctx.arena_mut().alloc_copy(value);
    graph.push_value(Value::new(
        Some(block),
        Id::default(),
        None,
        ValueData::ConstString(slice),
    ))
}

// ── Conversion ──────────────────────────────────────────────────────

pub fn trunc(graph: &mut IrGraph, block: BlockId, name: Id, from: ValueId, to: TypeRef) -> ValueId {
    cast(graph, block, name, CastOp::Trunc, from, to)
}

pub fn ftrunc(graph: &mut IrGraph, block: BlockId, name: Id, from: ValueId, to: TypeRef) -> ValueId {
    cast(graph, block, name, CastOp::FTrunc, from, to)
}

pub fn zext(graph: &mut IrGraph, block: BlockId, name: Id, from: ValueId, to: TypeRef) -> ValueId {
    cast(graph, block, name, CastOp::ZExt, from, to)
}

pub fn sext(graph: &mut IrGraph, block: BlockId, name: Id, from: ValueId, to: TypeRef) -> ValueId {
    cast(graph, block, name, CastOp::SExt, from, to)
}

pub fn fext(graph: &mut IrGraph, block: BlockId, name: Id, from: ValueId, to: TypeRef) -> ValueId {
    cast(graph, block, name, CastOp::FExt, from, to)
}

fn cast(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    op: CastOp,
    from: ValueId,
    to: TypeRef,
) -> ValueId {
    insert_inst(graph, block, name, Some(to), InstData::Cast { op, from })
}

// ── Arithmetic and bitwise ──────────────────────────────────────────

pub fn add(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Add, lhs, rhs)
}

pub fn sub(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Sub, lhs, rhs)
}

pub fn mul(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Mul, lhs, rhs)
}

pub fn div(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Div, lhs, rhs)
}

/// Signed division.
pub fn idiv(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::IDiv, lhs, rhs)
}

pub fn rem(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Rem, lhs, rhs)
}

/// Signed remainder.
pub fn irem(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::IRem, lhs, rhs)
}

pub fn fadd(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::FAdd, lhs, rhs)
}

pub fn fsub(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::FSub, lhs, rhs)
}

pub fn fmul(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::FMul, lhs, rhs)
}

pub fn fdiv(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::FDiv, lhs, rhs)
}

pub fn bitand(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::And, lhs, rhs)
}

pub fn or(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Or, lhs, rhs)
}

pub fn xor(graph: &mut IrGraph, block: BlockId, name: Id, lhs: ValueId, rhs: ValueId) -> ValueId {
    binary(graph, block, name, BinOp::Xor, lhs, rhs)
}

fn binary(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    op: BinOp,
    lhs: ValueId,
    rhs: ValueId,
) -> ValueId {
    insert_inst(graph, block, name, None, InstData::Binary { op, lhs, rhs })
}

pub fn shl(graph: &mut IrGraph, block: BlockId, name: Id, arg: ValueId, amount: ValueId) -> ValueId {
    shift(graph, block, name, ShiftOp::Shl, arg, amount)
}

/// Logical shift right.
pub fn shr(graph: &mut IrGraph, block: BlockId, name: Id, arg: ValueId, amount: ValueId) -> ValueId {
    shift(graph, block, name, ShiftOp::Shr, arg, amount)
}

/// Arithmetic shift right.
pub fn sar(graph: &mut IrGraph, block: BlockId, name: Id, arg: ValueId, amount: ValueId) -> ValueId {
    shift(graph, block, name, ShiftOp::Sar, arg, amount)
}

fn shift(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    op: ShiftOp,
    arg: ValueId,
    amount: ValueId,
) -> ValueId {
    insert_inst(graph, block, name, None, InstData::Shift { op, arg, amount })
}

// ── Comparison ──────────────────────────────────────────────────────

pub fn icmp(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    lhs: ValueId,
    rhs: ValueId,
    cmp: ICmp,
) -> ValueId {
    insert_inst(graph, block, name, None, InstData::ICmp { cmp, lhs, rhs })
}

pub fn fcmp(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    lhs: ValueId,
    rhs: ValueId,
    cmp: FCmp,
) -> ValueId {
    insert_inst(graph, block, name, None, InstData::FCmp { cmp, lhs, rhs })
}

// ── Construction ────────────────────────────────────────────────────

/// Apply data constructor `con` to `arg`.
pub fn record(graph: &mut IrGraph, block: BlockId, name: Id, con: ConRef, arg: ValueId) -> ValueId {
    insert_inst(graph, block, name, None, InstData::Record { con, arg })
}

/// Tuple with `field_count` unset fields.
pub fn tup(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    ty: TypeRef,
    field_count: usize,
) -> ValueId {
    let fields = vec![None; field_count];
    insert_inst(graph, block, name, Some(ty), InstData::Tup { fields })
}

/// Closure over `body` with `frame_count` unset captured values.
pub fn fun(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    body: FunctionRef,
    ty: TypeRef,
    frame_count: usize,
) -> ValueId {
    let frame = vec![None; frame_count];
    insert_inst(graph, block, name, Some(ty), InstData::Fun { body, frame })
}

// ── Calls ───────────────────────────────────────────────────────────

pub fn call(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    fun: FunctionRef,
    arg_count: usize,
) -> ValueId {
    let args = vec![None; arg_count];
    let inst = InstData::Call {
        fun,
        generic: false,
        args,
    };
    insert_inst(graph, block, name, None, inst)
}

pub fn call_gen(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    fun: FunctionRef,
    arg_count: usize,
) -> ValueId {
    let args = vec![None; arg_count];
    let inst = InstData::Call {
        fun,
        generic: true,
        args,
    };
    insert_inst(graph, block, name, None, inst)
}

/// Call through the function value `fun`.
pub fn call_dyn(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    fun: ValueId,
    arg_count: usize,
) -> ValueId {
    let args = vec![None; arg_count];
    let inst = InstData::CallDyn {
        fun,
        generic: false,
        args,
    };
    insert_inst(graph, block, name, None, inst)
}

pub fn call_dyn_gen(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    fun: ValueId,
    arg_count: usize,
) -> ValueId {
    let args = vec![None; arg_count];
    let inst = InstData::CallDyn {
        fun,
        generic: true,
        args,
    };
    insert_inst(graph, block, name, None, inst)
}

pub fn call_foreign(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    fun: ForeignRef,
    arg_count: usize,
) -> ValueId {
    let args = vec![None; arg_count];
    insert_inst(graph, block, name, None, InstData::CallForeign { fun, args })
}

/// Fill slot `index` of a variable-arity instruction and record the use.
///
/// Works for call arguments, tuple fields and closure frames alike. Each
/// slot may be set once.
pub fn set_arg(
    graph: &mut IrGraph,
    inst: ValueId,
    index: usize,
    value: ValueId,
) -> Result<(), IrError> {
    let kind = graph.value(inst).kind();
    let ValueData::Inst(data) = graph.data_mut(inst) else {
        return Err(IrError::NotVariadic { inst, kind });
    };
    let Some(slots) = data.slots_mut() else {
        return Err(IrError::NotVariadic { inst, kind });
    };
    let count = slots.len();
    match slots.get_mut(index) {
        None => return Err(IrError::SlotOutOfRange { inst, index, count }),
        Some(Some(_)) => return Err(IrError::SlotAlreadySet { inst, index }),
        Some(slot) => *slot = Some(value),
    }
    graph.add_use(value, inst);
    Ok(())
}

/// Read slot `index` of a variable-arity instruction.
///
/// Reading a slot that [`set_arg`] has not filled is an error rather than a
/// placeholder value.
pub fn arg_at(graph: &IrGraph, inst: ValueId, index: usize) -> Result<ValueId, IrError> {
    let value = graph.value(inst);
    let Some(slots) = value.inst().and_then(InstData::slots) else {
        return Err(IrError::NotVariadic {
            inst,
            kind: value.kind(),
        });
    };
    match slots.get(index) {
        None => Err(IrError::SlotOutOfRange {
            inst,
            index,
            count: slots.len(),
        }),
        Some(None) => Err(IrError::UnsetSlot { inst, index }),
        Some(Some(arg)) => Ok(*arg),
    }
}

// ── Control flow ────────────────────────────────────────────────────

/// Branch to `then` if `cond` holds, otherwise to `otherwise`.
pub fn je(
    graph: &mut IrGraph,
    block: BlockId,
    cond: ValueId,
    then: BlockId,
    otherwise: BlockId,
) -> ValueId {
    let inst = InstData::Je {
        cond,
        then,
        otherwise,
    };
    insert_inst(graph, block, Id::default(), None, inst)
}

pub fn jmp(graph: &mut IrGraph, block: BlockId, to: BlockId) -> ValueId {
    insert_inst(graph, block, Id::default(), None, InstData::Jmp { to })
}

/// Return `value`, or nothing.
pub fn ret(graph: &mut IrGraph, block: BlockId, value: Option<ValueId>) -> ValueId {
    insert_inst(graph, block, Id::default(), None, InstData::Ret { value })
}

/// Phi node selecting among `alts` by predecessor.
///
/// The caller must keep phis as a contiguous prefix of `block`.
pub fn phi(graph: &mut IrGraph, block: BlockId, name: Id, alts: Vec<PhiAlt>) -> ValueId {
    insert_inst(graph, block, name, None, InstData::Phi { alts })
}

/// Record that `block` references `value` directly rather than through an
/// instruction.
pub fn add_block_use(graph: &mut IrGraph, value: ValueId, block: BlockId) {
    graph.add_block_use(value, block);
}

// ── Shared insertion ────────────────────────────────────────────────

fn insert_inst(
    graph: &mut IrGraph,
    block: BlockId,
    name: Id,
    ty: Option<TypeRef>,
    inst: InstData,
) -> ValueId {
    check_placement(graph, block, inst.kind());

    let used_values = inst.used_values();
    let used_blocks = inst.used_blocks();
    let id = graph.push_value(Value::new(Some(block), name, ty, ValueData::Inst(inst)));

    for value in used_values {
        graph.add_use(value, id);
    }
    for target in used_blocks {
        graph.add_block_user(target, id);
    }
    graph.append_inst(block, id);
    id
}

fn check_placement(graph: &IrGraph, block: BlockId, kind: Kind) {
    let Some(last) = graph.block(block).last_inst() else {
        return;
    };
    let last_kind = graph.value(last).kind();
    if last_kind.is_terminating() {
        tracing::warn!(
            ?block,
            ?kind,
            terminator = ?last_kind,
            "instruction appended after block terminator"
        );
    } else if kind == Kind::Phi && last_kind != Kind::Phi {
        tracing::warn!(?block, "phi appended after a non-phi instruction");
    }
}
