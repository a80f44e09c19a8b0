//! Operator precedence and associativity.
//!
//! Fixity declarations are parsed elsewhere and recorded here keyed by the
//! operator's [`Id`]. Operators that were never declared resolve to
//! [`OpProperties::DEFAULT`], so precedence climbing always has an answer.

use rustc_hash::FxHashMap;

use crate::Id;

/// Operator associativity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Assoc {
    Left,
    Right,
}

/// Precedence and associativity of one operator.
///
/// Higher precedence binds more tightly.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct OpProperties {
    pub precedence: u16,
    pub assoc: Assoc,
}

impl OpProperties {
    /// Fallback for operators without a fixity declaration.
    pub const DEFAULT: OpProperties = OpProperties {
        precedence: 9,
        assoc: Assoc::Left,
    };

    pub const fn new(precedence: u16, assoc: Assoc) -> Self {
        OpProperties { precedence, assoc }
    }

    /// Whether an operator with these properties, appearing to the right of
    /// an operator with `left`, should be reduced first.
    ///
    /// Equal precedence defers to associativity: right-associative operators
    /// bind tighter on the right, left-associative ones do not.
    pub fn binds_tighter(self, left: OpProperties) -> bool {
        match self.precedence.cmp(&left.precedence) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.assoc == Assoc::Right,
        }
    }
}

impl Default for OpProperties {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Mapping from operator [`Id`] to its properties.
#[derive(Clone, Debug, Default)]
pub struct OpTable {
    ops: FxHashMap<Id, OpProperties>,
}

impl OpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fixity declaration, replacing any earlier one for `op`.
    pub fn add(&mut self, op: Id, precedence: u16, assoc: Assoc) {
        self.ops.insert(op, OpProperties::new(precedence, assoc));
    }

    /// Properties of `op`, or [`OpProperties::DEFAULT`] if undeclared.
    pub fn find(&self, op: Id) -> OpProperties {
        self.ops.get(&op).copied().unwrap_or(OpProperties::DEFAULT)
    }

    /// Whether `op` has an explicit declaration.
    pub fn is_declared(&self, op: Id) -> bool {
        self.ops.contains_key(&op)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests;
