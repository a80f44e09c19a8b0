//! Per-compilation-unit context.
//!
//! A [`Context`] owns the [`Arena`], the identifier table and the
//! [`OpTable`] for one compilation unit. It is passed explicitly to every
//! component that needs it; there is no global instance. `Id`s from
//! different contexts are not comparable.
//!
//! The `'src` lifetime covers source buffers that unqualified names alias
//! instead of copying.

use rustc_hash::FxHashMap;

use crate::arena::{to_u32, Arena};
use crate::ident::{hash_bytes, tables_size, write_word, IdentText, Identifier};
use crate::ops::{Assoc, OpProperties, OpTable};
use crate::Id;

/// Errors from context lookups.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The `Id` was never returned by an intern call on this context.
    #[error("unknown identifier {0:?}")]
    UnknownIdentifier(Id),
}

/// Arena, identifier table and operator table for one compilation unit.
pub struct Context<'src> {
    arena: Arena,
    identifiers: FxHashMap<Id, Identifier<'src>>,
    ops: OpTable,
}

impl<'src> Context<'src> {
    /// Create a context with the default arena chunk size.
    pub fn new() -> Self {
        Self::with_arena(Arena::new())
    }

    /// Create a context whose arena uses `chunk_size`-byte chunks.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self::with_arena(Arena::with_chunk_size(chunk_size))
    }

    fn with_arena(arena: Arena) -> Self {
        Context {
            arena,
            identifiers: FxHashMap::default(),
            ops: OpTable::new(),
        }
    }

    /// The arena backing this context.
    #[inline]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access to the arena, for collaborators allocating their own data.
    #[inline]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    // ── Operators ───────────────────────────────────────────────

    /// Record a fixity declaration.
    pub fn add_op(&mut self, op: Id, precedence: u16, assoc: Assoc) {
        self.ops.add(op, precedence, assoc);
    }

    /// Properties of `op`, defaulting to `{9, Left}` when undeclared.
    pub fn find_op(&self, op: Id) -> OpProperties {
        self.ops.find(op)
    }

    #[inline]
    pub fn ops(&self) -> &OpTable {
        &self.ops
    }

    // ── Identifiers ─────────────────────────────────────────────

    /// Intern a single-segment name without copying it.
    ///
    /// The text is aliased for the lifetime of the context, so it must come
    /// from storage that outlives it (typically the retained source buffer).
    /// Dots in the text are not treated as separators.
    pub fn add_unqualified_name<T>(&mut self, text: &'src T) -> Id
    where
        T: AsRef<[u8]> + ?Sized,
    {
        let text = text.as_ref();
        let ident = Identifier {
            text: IdentText::Borrowed(text),
            segment_count: 1,
            tables: None,
            segment_hash: hash_bytes(text),
        };
        self.add_identifier(ident)
    }

    /// Intern a possibly dot-qualified name, copying it into the arena.
    ///
    /// The segment count is the number of `.` separators plus one.
    pub fn add_qualified_name(&mut self, text: impl AsRef<[u8]>) -> Id {
        let text = text.as_ref();
        let segment_count = 1 + text.iter().filter(|&&b| b == b'.').count();
        self.add_qualified_name_with_segments(text, segment_count)
    }

    /// Intern a qualified name whose segment count the caller already knows.
    ///
    /// With `segment_count <= 1` the whole text is one segment. Otherwise the
    /// text is split on `.` into exactly `segment_count` segments: the last
    /// one runs to the end of the text, and missing segments are empty and
    /// positioned at the end.
    ///
    /// # Panics
    /// Panics if the name and its tables do not fit in one arena chunk.
    pub fn add_qualified_name_with_segments(
        &mut self,
        text: impl AsRef<[u8]>,
        segment_count: usize,
    ) -> Id {
        let text = text.as_ref();

        if segment_count <= 1 {
            let slice = self.arena.alloc_copy(text);
            let ident = Identifier {
                text: IdentText::Arena(slice),
                segment_count: 1,
                tables: None,
                segment_hash: hash_bytes(text),
            };
            return self.add_identifier(ident);
        }

        // Offsets and hashes first, then the text, in one block.
        let table_bytes = tables_size(segment_count);
        let block = self.arena.alloc(table_bytes + text.len());
        let tables = block.sub(0, table_bytes);
        let text_slice = block.sub(table_bytes, text.len());

        self.arena.get_mut(text_slice).copy_from_slice(text);
        let words = self.arena.get_mut(tables);
        let mut start = 0usize;
        for (i, segment) in text.splitn(segment_count, |&b| b == b'.').enumerate() {
            write_word(words, i, to_u32(start, "segment offset"));
            write_word(words, segment_count + i, hash_bytes(segment));
            start += segment.len() + 1;
        }
        let found = text.split(|&b| b == b'.').count().min(segment_count);
        for i in found..segment_count {
            write_word(words, i, to_u32(text.len(), "segment offset"));
            write_word(words, segment_count + i, hash_bytes(&[]));
        }

        let ident = Identifier {
            text: IdentText::Arena(text_slice),
            segment_count: to_u32(segment_count, "segment count"),
            tables: Some(tables),
            segment_hash: 0,
        };
        self.add_identifier(ident)
    }

    /// Insert an identifier under its `Id`.
    ///
    /// Single-segment names reuse their segment hash; qualified names hash
    /// the full text.
    fn add_identifier(&mut self, ident: Identifier<'src>) -> Id {
        let id = if ident.is_qualified() {
            Id::from_raw(hash_bytes(ident.text(&self.arena)))
        } else {
            Id::from_raw(ident.segment_hash)
        };

        if let Some(previous) = self.identifiers.insert(id, ident) {
            if previous.text(&self.arena) != ident.text(&self.arena) {
                tracing::debug!(
                    ?id,
                    previous = %String::from_utf8_lossy(previous.text(&self.arena)),
                    current = %String::from_utf8_lossy(ident.text(&self.arena)),
                    "identifier hash collision, replacing entry"
                );
            }
        } else {
            tracing::trace!(
                ?id,
                segments = ident.segment_count(),
                "interned identifier"
            );
        }
        id
    }

    /// Look up an interned identifier.
    pub fn find(&self, id: Id) -> Result<&Identifier<'src>, ContextError> {
        self.identifiers
            .get(&id)
            .ok_or(ContextError::UnknownIdentifier(id))
    }

    /// Full text of an interned identifier.
    pub fn text(&self, id: Id) -> Result<&[u8], ContextError> {
        Ok(self.find(id)?.text(&self.arena))
    }

    /// Text of segment `index` of an interned identifier.
    ///
    /// # Panics
    /// Panics if `index` is not below the identifier's segment count.
    pub fn segment_text(&self, id: Id, index: usize) -> Result<&[u8], ContextError> {
        Ok(self.find(id)?.segment_text(&self.arena, index))
    }

    /// Whether `a` and `b` agree on their first `count` segments.
    ///
    /// Compares precomputed segment hashes only. Returns `false` if either
    /// name has fewer than `count` segments.
    pub fn shares_prefix(&self, a: Id, b: Id, count: usize) -> Result<bool, ContextError> {
        let a = self.find(a)?;
        let b = self.find(b)?;
        if a.segment_count() < count || b.segment_count() < count {
            return Ok(false);
        }
        Ok((0..count).all(|i| a.segment_hash(&self.arena, i) == b.segment_hash(&self.arena, i)))
    }

    /// Number of distinct `Id`s interned.
    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("arena", &self.arena)
            .field("identifiers", &self.identifiers.len())
            .field("ops", &self.ops.len())
            .finish()
    }
}
