//! Interned identifiers.
//!
//! An [`Id`] is the content hash of an identifier's full text, so equal text
//! always yields an equal `Id` and comparing names is an integer compare.
//! Qualified names (`a.b.c`) additionally carry per-segment offsets and
//! hashes, computed once at interning time, so later passes can match
//! prefixes of qualified names without re-hashing substrings.
//!
//! The hash is the identity. Two distinct names whose hashes collide are
//! merged, and the later insertion wins.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::arena::{Arena, ArenaSlice};

/// Interned identifier key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Id(u32);

impl Id {
    /// Create from a raw hash value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Id(raw)
    }

    /// Get the raw hash value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:#010x})", self.0)
    }
}

/// Content hash used for whole names and for individual segments.
///
/// Folds the 64-bit `FxHasher` output into 32 bits.
#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "folding a 64-bit hash into 32 bits is intentional"
)]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

/// Where an identifier's text lives.
#[derive(Copy, Clone, Debug)]
pub(crate) enum IdentText<'src> {
    /// Caller-owned text, aliased for the lifetime of the context.
    Borrowed(&'src [u8]),
    /// Text copied into the context arena.
    Arena(ArenaSlice),
}

/// One interned name, possibly dot-qualified.
///
/// For qualified names the segment tables live in the arena as a single
/// block: `segment_count` offsets, then `segment_count` hashes, then the
/// text itself. Single-segment names keep just the text and its hash.
#[derive(Copy, Clone, Debug)]
pub struct Identifier<'src> {
    pub(crate) text: IdentText<'src>,
    pub(crate) segment_count: u32,
    /// Offset and hash tables; `None` for single-segment names.
    pub(crate) tables: Option<ArenaSlice>,
    /// Hash of the whole text when `segment_count == 1`.
    pub(crate) segment_hash: u32,
}

const WORD: usize = std::mem::size_of::<u32>();

impl<'src> Identifier<'src> {
    /// Number of dot-separated segments (always at least 1).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_count as usize
    }

    /// Whether this name has more than one segment.
    #[inline]
    pub fn is_qualified(&self) -> bool {
        self.segment_count > 1
    }

    /// Whether the text is stored in the arena rather than aliased.
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.text, IdentText::Arena(_))
    }

    /// Full text of the name.
    pub fn text<'a>(&self, arena: &'a Arena) -> &'a [u8]
    where
        'src: 'a,
    {
        match self.text {
            IdentText::Borrowed(text) => text,
            IdentText::Arena(slice) => arena.get(slice),
        }
    }

    /// Byte offset of segment `index` within the text.
    ///
    /// # Panics
    /// Panics if `index >= segment_count()`.
    #[track_caller]
    pub fn segment_offset(&self, arena: &Arena, index: usize) -> u32 {
        self.check_segment(index);
        match self.tables {
            Some(tables) => read_word(arena.get(tables), index),
            None => 0,
        }
    }

    /// Content hash of segment `index`.
    ///
    /// # Panics
    /// Panics if `index >= segment_count()`.
    #[track_caller]
    pub fn segment_hash(&self, arena: &Arena, index: usize) -> u32 {
        self.check_segment(index);
        match self.tables {
            Some(tables) => read_word(arena.get(tables), self.segment_count() + index),
            None => self.segment_hash,
        }
    }

    /// Text of segment `index`, without the surrounding dots.
    ///
    /// # Panics
    /// Panics if `index >= segment_count()`.
    #[track_caller]
    pub fn segment_text<'a>(&self, arena: &'a Arena, index: usize) -> &'a [u8]
    where
        'src: 'a,
    {
        let text = self.text(arena);
        let start = self.segment_offset(arena, index) as usize;
        let end = if index + 1 < self.segment_count() {
            // A real successor starts one past the separating dot; padding
            // segments (explicit count above the dot count) start at the end.
            let next = self.segment_offset(arena, index + 1) as usize;
            if next > 0 && text[next - 1] == b'.' {
                next - 1
            } else {
                next
            }
        } else {
            text.len()
        };
        &text[start..end.max(start)]
    }

    #[inline]
    #[track_caller]
    fn check_segment(&self, index: usize) {
        assert!(
            index < self.segment_count(),
            "segment index {index} out of range for identifier with {} segments",
            self.segment_count
        );
    }
}

#[inline]
fn read_word(bytes: &[u8], index: usize) -> u32 {
    let start = index * WORD;
    let mut word = [0u8; WORD];
    word.copy_from_slice(&bytes[start..start + WORD]);
    u32::from_ne_bytes(word)
}

#[inline]
pub(crate) fn write_word(bytes: &mut [u8], index: usize, value: u32) {
    let start = index * WORD;
    bytes[start..start + WORD].copy_from_slice(&value.to_ne_bytes());
}

/// Size in bytes of the offset and hash tables for `segment_count` segments.
#[inline]
pub(crate) const fn tables_size(segment_count: usize) -> usize {
    2 * segment_count * WORD
}
