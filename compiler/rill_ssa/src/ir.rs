//! SSA values, instructions and blocks.
//!
//! Every node lives in an [`IrGraph`], the single owner of all values and
//! blocks of one compilation unit. Cross references are [`ValueId`] and
//! [`BlockId`] indices into that graph, so back edges (use-lists) and forward
//! edges (operands) never form owning cycles.
//!
//! # Architecture
//!
//! - **[`Value`]**: common data shared by every node (owning block, type,
//!   use-list, block-use list, codegen slot, display name)
//! - **[`ValueData`]**: argument, constant or instruction payload
//! - **[`InstData`]**: one variant per instruction family; the precise
//!   [`Kind`] is derived from the variant and its operator field
//! - **[`Block`]**: ordered instruction list plus the instructions that
//!   reference the block as a jump target or phi predecessor
//!
//! Nodes are created only through the construction functions in
//! [`build`](crate::build), which keep use-lists in sync with operands.

use rill_ir::{ArenaSlice, Id};
use smallvec::{smallvec, SmallVec};

// ── ID newtypes ─────────────────────────────────────────────────────

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_handle!(
    /// A value (argument, constant or instruction) within an [`IrGraph`].
    ValueId
);
define_handle!(
    /// A basic block within an [`IrGraph`].
    BlockId
);

// ── Collaborator handles ────────────────────────────────────────────
//
// Owned and interpreted by the surrounding compiler; this layer only
// stores and compares them.

define_handle!(
    /// Type assigned by the type checker.
    TypeRef
);
define_handle!(
    /// Function body, owned by the function/module layer.
    FunctionRef
);
define_handle!(
    /// Data constructor, owned by the function/module layer.
    ConRef
);
define_handle!(
    /// Foreign-ABI function, owned by the function/module layer.
    ForeignRef
);

// ── Kinds ───────────────────────────────────────────────────────────

/// Closed discriminant over every value variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    Arg,

    ConstInt,
    ConstFloat,
    ConstString,

    // Conversion
    Trunc,
    FTrunc,
    ZExt,
    SExt,
    FExt,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Rem,
    IRem,
    FAdd,
    FSub,
    FMul,
    FDiv,

    ICmp,
    FCmp,

    // Bitwise
    Shl,
    Shr,
    Sar,
    And,
    Or,
    Xor,

    // Construction
    Record,
    Tup,
    Fun,

    // Calls
    Call,
    CallGen,
    CallDyn,
    CallDynGen,
    CallForeign,

    // Control flow
    Je,
    Jmp,
    Ret,
    Phi,
}

impl Kind {
    #[inline]
    pub fn is_const(self) -> bool {
        matches!(self, Kind::ConstInt | Kind::ConstFloat | Kind::ConstString)
    }

    #[inline]
    pub fn is_inst(self) -> bool {
        !matches!(self, Kind::Arg) && !self.is_const()
    }

    /// Whether instructions of this kind end a block.
    #[inline]
    pub fn is_terminating(self) -> bool {
        is_terminating(self)
    }
}

/// `Ret`, `Je` and `Jmp` are the only terminating kinds.
#[inline]
pub fn is_terminating(kind: Kind) -> bool {
    matches!(kind, Kind::Ret | Kind::Je | Kind::Jmp)
}

// ── Operators ───────────────────────────────────────────────────────

/// Conversion operators. The target type is the instruction's type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CastOp {
    Trunc,
    FTrunc,
    ZExt,
    SExt,
    FExt,
}

/// Two-operand arithmetic and bitwise operators.
///
/// Integer and float arithmetic are distinct operators so passes can
/// dispatch on kind alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Rem,
    IRem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    And,
    Or,
    Xor,
}

impl BinOp {
    /// Whether this is one of the float arithmetic operators.
    pub fn is_float(self) -> bool {
        matches!(self, BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiftOp {
    Shl,
    Shr,
    Sar,
}

/// Integer comparison relations.
///
/// `Gt`/`Ge`/`Lt`/`Le` compare unsigned (or per the operand type's
/// default); the `I` variants compare signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ICmp {
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
    IGt,
    IGe,
    ILt,
    ILe,
}

impl ICmp {
    pub fn is_signed(self) -> bool {
        matches!(self, ICmp::IGt | ICmp::IGe | ICmp::ILt | ICmp::ILe)
    }
}

/// Float comparison relations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum FCmp {
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
}

// ── Instructions ────────────────────────────────────────────────────

/// One incoming edge of a phi node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct PhiAlt {
    pub from_block: BlockId,
    pub value: ValueId,
}

/// Payload of an instruction.
///
/// Variable-arity operands (`args`, `fields`, `frame`) start out as `None`
/// and are filled one slot at a time by [`set_arg`](crate::set_arg).
#[derive(Clone, Debug, PartialEq)]
pub enum InstData {
    Cast {
        op: CastOp,
        from: ValueId,
    },
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    ICmp {
        cmp: ICmp,
        lhs: ValueId,
        rhs: ValueId,
    },
    FCmp {
        cmp: FCmp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Shift {
        op: ShiftOp,
        arg: ValueId,
        amount: ValueId,
    },
    Record {
        con: ConRef,
        arg: ValueId,
    },
    Tup {
        fields: Vec<Option<ValueId>>,
    },
    /// Closure creation: `body` together with its captured frame.
    Fun {
        body: FunctionRef,
        frame: Vec<Option<ValueId>>,
    },
    /// Static call. `generic` selects `CallGen`.
    Call {
        fun: FunctionRef,
        generic: bool,
        args: Vec<Option<ValueId>>,
    },
    /// Call through a function value. `generic` selects `CallDynGen`.
    CallDyn {
        fun: ValueId,
        generic: bool,
        args: Vec<Option<ValueId>>,
    },
    CallForeign {
        fun: ForeignRef,
        args: Vec<Option<ValueId>>,
    },
    /// Conditional branch.
    Je {
        cond: ValueId,
        then: BlockId,
        otherwise: BlockId,
    },
    /// Unconditional branch.
    Jmp {
        to: BlockId,
    },
    /// Return, with or without a value.
    Ret {
        value: Option<ValueId>,
    },
    /// Phi node; phis must form a contiguous prefix of their block.
    Phi {
        alts: Vec<PhiAlt>,
    },
}

impl InstData {
    /// The precise kind of this instruction.
    pub fn kind(&self) -> Kind {
        match self {
            InstData::Cast { op, .. } => match op {
                CastOp::Trunc => Kind::Trunc,
                CastOp::FTrunc => Kind::FTrunc,
                CastOp::ZExt => Kind::ZExt,
                CastOp::SExt => Kind::SExt,
                CastOp::FExt => Kind::FExt,
            },
            InstData::Binary { op, .. } => match op {
                BinOp::Add => Kind::Add,
                BinOp::Sub => Kind::Sub,
                BinOp::Mul => Kind::Mul,
                BinOp::Div => Kind::Div,
                BinOp::IDiv => Kind::IDiv,
                BinOp::Rem => Kind::Rem,
                BinOp::IRem => Kind::IRem,
                BinOp::FAdd => Kind::FAdd,
                BinOp::FSub => Kind::FSub,
                BinOp::FMul => Kind::FMul,
                BinOp::FDiv => Kind::FDiv,
                BinOp::And => Kind::And,
                BinOp::Or => Kind::Or,
                BinOp::Xor => Kind::Xor,
            },
            InstData::ICmp { .. } => Kind::ICmp,
            InstData::FCmp { .. } => Kind::FCmp,
            InstData::Shift { op, .. } => match op {
                ShiftOp::Shl => Kind::Shl,
                ShiftOp::Shr => Kind::Shr,
                ShiftOp::Sar => Kind::Sar,
            },
            InstData::Record { .. } => Kind::Record,
            InstData::Tup { .. } => Kind::Tup,
            InstData::Fun { .. } => Kind::Fun,
            InstData::Call { generic: false, .. } => Kind::Call,
            InstData::Call { generic: true, .. } => Kind::CallGen,
            InstData::CallDyn { generic: false, .. } => Kind::CallDyn,
            InstData::CallDyn { generic: true, .. } => Kind::CallDynGen,
            InstData::CallForeign { .. } => Kind::CallForeign,
            InstData::Je { .. } => Kind::Je,
            InstData::Jmp { .. } => Kind::Jmp,
            InstData::Ret { .. } => Kind::Ret,
            InstData::Phi { .. } => Kind::Phi,
        }
    }

    /// The variable-arity slot array, for instructions that have one.
    pub fn slots(&self) -> Option<&[Option<ValueId>]> {
        match self {
            InstData::Tup { fields: slots }
            | InstData::Fun { frame: slots, .. }
            | InstData::Call { args: slots, .. }
            | InstData::CallDyn { args: slots, .. }
            | InstData::CallForeign { args: slots, .. } => Some(slots.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn slots_mut(&mut self) -> Option<&mut Vec<Option<ValueId>>> {
        match self {
            InstData::Tup { fields: slots }
            | InstData::Fun { frame: slots, .. }
            | InstData::Call { args: slots, .. }
            | InstData::CallDyn { args: slots, .. }
            | InstData::CallForeign { args: slots, .. } => Some(slots),
            _ => None,
        }
    }

    /// Every value this instruction reads, in operand order.
    ///
    /// Derived from the typed fields, so it can never disagree with them.
    /// Unset variable-arity slots are skipped. A value read twice appears
    /// twice.
    pub fn used_values(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            InstData::Cast { from, .. } => smallvec![*from],
            InstData::Binary { lhs, rhs, .. }
            | InstData::ICmp { lhs, rhs, .. }
            | InstData::FCmp { lhs, rhs, .. } => smallvec![*lhs, *rhs],
            InstData::Shift { arg, amount, .. } => smallvec![*arg, *amount],
            InstData::Record { arg, .. } => smallvec![*arg],
            InstData::Tup { fields: slots }
            | InstData::Fun { frame: slots, .. }
            | InstData::Call { args: slots, .. }
            | InstData::CallForeign { args: slots, .. } => slots.iter().flatten().copied().collect(),
            InstData::CallDyn { fun, args, .. } => {
                let mut used = SmallVec::with_capacity(1 + args.len());
                used.push(*fun);
                used.extend(args.iter().flatten().copied());
                used
            }
            InstData::Je { cond, .. } => smallvec![*cond],
            InstData::Jmp { .. } | InstData::Ret { value: None } => SmallVec::new(),
            InstData::Ret { value: Some(value) } => smallvec![*value],
            InstData::Phi { alts } => alts.iter().map(|alt| alt.value).collect(),
        }
    }

    /// Every block this instruction references, in operand order.
    pub fn used_blocks(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            InstData::Je { then, otherwise, .. } => smallvec![*then, *otherwise],
            InstData::Jmp { to } => smallvec![*to],
            InstData::Phi { alts } => alts.iter().map(|alt| alt.from_block).collect(),
            _ => SmallVec::new(),
        }
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// What a value is.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueData {
    /// Function parameter by position.
    Arg { index: u32 },
    ConstInt(i64),
    ConstFloat(f64),
    /// String constant; the bytes live in the context arena.
    ConstString(ArenaSlice),
    Inst(InstData),
}

impl ValueData {
    pub fn kind(&self) -> Kind {
        match self {
            ValueData::Arg { .. } => Kind::Arg,
            ValueData::ConstInt(_) => Kind::ConstInt,
            ValueData::ConstFloat(_) => Kind::ConstFloat,
            ValueData::ConstString(_) => Kind::ConstString,
            ValueData::Inst(inst) => inst.kind(),
        }
    }
}

/// A single read of `value` by the instruction `user`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Use {
    pub value: ValueId,
    pub user: ValueId,
}

/// A node in the SSA graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    block: Option<BlockId>,
    ty: Option<TypeRef>,
    uses: Vec<Use>,
    block_uses: Vec<BlockId>,
    codegen: Option<u64>,
    name: Id,
    data: ValueData,
}

impl Value {
    pub(crate) fn new(block: Option<BlockId>, name: Id, ty: Option<TypeRef>, data: ValueData) -> Self {
        Value {
            block,
            ty,
            uses: Vec::new(),
            block_uses: Vec::new(),
            codegen: None,
            name,
            data,
        }
    }

    /// The block this value belongs to.
    #[inline]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Type assigned by the type checker, if any yet.
    #[inline]
    pub fn ty(&self) -> Option<TypeRef> {
        self.ty
    }

    /// Every instruction read of this value, in registration order.
    #[inline]
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    /// Blocks that reference this value directly.
    #[inline]
    pub fn block_uses(&self) -> &[BlockId] {
        &self.block_uses
    }

    /// Backend annotation slot.
    #[inline]
    pub fn codegen(&self) -> Option<u64> {
        self.codegen
    }

    /// Display name; not part of the value's identity.
    #[inline]
    pub fn name(&self) -> Id {
        self.name
    }

    #[inline]
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.data.kind()
    }

    /// The instruction payload, if this value is an instruction.
    #[inline]
    pub fn inst(&self) -> Option<&InstData> {
        match &self.data {
            ValueData::Inst(inst) => Some(inst),
            _ => None,
        }
    }

    /// Values read by this node; empty for arguments and constants.
    pub fn used_values(&self) -> SmallVec<[ValueId; 4]> {
        self.inst().map(InstData::used_values).unwrap_or_default()
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// A basic block.
///
/// Well-formed blocks end in exactly one terminating instruction and keep
/// their phis as a contiguous prefix. Construction does not enforce either
/// rule; [`verify`](crate::verify) checks them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    insts: Vec<ValueId>,
    uses: Vec<ValueId>,
}

impl Block {
    /// Instructions in execution order.
    #[inline]
    pub fn insts(&self) -> &[ValueId] {
        &self.insts
    }

    /// Instructions that reference this block (jump targets, phi predecessors).
    #[inline]
    pub fn uses(&self) -> &[ValueId] {
        &self.uses
    }

    #[inline]
    pub fn last_inst(&self) -> Option<ValueId> {
        self.insts.last().copied()
    }
}

// ── Graph ───────────────────────────────────────────────────────────

/// Owner of every value and block built for one compilation unit.
///
/// Like the context arena, nothing is removed individually; the whole graph
/// is dropped at once.
#[derive(Clone, Debug, Default)]
pub struct IrGraph {
    values: Vec<Value>,
    blocks: Vec<Block>,
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new empty block.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(to_u32(self.blocks.len()));
        self.blocks.push(Block::default());
        id
    }

    /// Look up a value.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    /// Look up a block.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// All block IDs in creation order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.blocks.len()).map(|i| BlockId::new(to_u32(i)))
    }

    /// All value IDs in creation order.
    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        (0..self.values.len()).map(|i| ValueId::new(to_u32(i)))
    }

    /// Record the type checker's result for `id`.
    pub fn set_type(&mut self, id: ValueId, ty: TypeRef) {
        self.values[id.index()].ty = Some(ty);
    }

    /// Attach backend data to `id`.
    pub fn set_codegen(&mut self, id: ValueId, data: u64) {
        self.values[id.index()].codegen = Some(data);
    }

    // ── Construction internals ──────────────────────────────────

    pub(crate) fn push_value(&mut self, value: Value) -> ValueId {
        let id = ValueId::new(to_u32(self.values.len()));
        self.values.push(value);
        id
    }

    #[cfg(test)]
    pub(crate) fn uses_mut(&mut self, id: ValueId) -> &mut Vec<Use> {
        &mut self.values[id.index()].uses
    }

    #[cfg(test)]
    pub(crate) fn block_users_mut(&mut self, id: BlockId) -> &mut Vec<ValueId> {
        &mut self.blocks[id.index()].uses
    }

    pub(crate) fn data_mut(&mut self, id: ValueId) -> &mut ValueData {
        &mut self.values[id.index()].data
    }

    /// Record that `user` reads `value`.
    pub(crate) fn add_use(&mut self, value: ValueId, user: ValueId) {
        self.values[value.index()].uses.push(Use { value, user });
    }

    /// Record that `user` references `block`.
    pub(crate) fn add_block_user(&mut self, block: BlockId, user: ValueId) {
        self.blocks[block.index()].uses.push(user);
    }

    pub(crate) fn add_block_use(&mut self, value: ValueId, block: BlockId) {
        self.values[value.index()].block_uses.push(block);
    }

    pub(crate) fn append_inst(&mut self, block: BlockId, inst: ValueId) {
        self.blocks[block.index()].insts.push(inst);
    }
}

#[inline]
fn to_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or_else(|_| panic!("index exceeds u32::MAX: {index}"))
}
