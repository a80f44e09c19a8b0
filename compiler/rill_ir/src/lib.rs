//! Rill IR core - arena, identifiers and operators
//!
//! This crate holds the per-compilation-unit data every later pass builds on:
//! - [`Arena`]: chunked bump allocator, freed all at once
//! - [`Id`] / [`Identifier`]: interned names, simple or dot-qualified, with
//!   per-segment hashes
//! - [`OpTable`]: operator precedence and associativity
//! - [`Context`]: the single owner of all three for one compilation unit
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: names become `Id(u32)`, compared as integers
//! - **Handles, not pointers**: arena memory is addressed by [`ArenaSlice`]
//! - **Explicit context**: no global state; every caller passes a `Context`

mod arena;
mod context;
mod ident;
mod ops;

pub use arena::{Arena, ArenaSlice, CHUNK_SIZE};
pub use context::{Context, ContextError};
pub use ident::{hash_bytes, Id, Identifier};
pub use ops::{Assoc, OpProperties, OpTable};
