//! Chunked bump allocator backing one compilation unit.
//!
//! Memory is handed out as [`ArenaSlice`] handles rather than pointers: a
//! handle names a chunk and a byte range inside it, and stays valid for as
//! long as the [`Arena`] that produced it. Nothing is freed individually;
//! dropping the arena releases every chunk at once.

/// Default size of each chunk (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Handle to a byte range allocated from an [`Arena`].
///
/// Only meaningful for the arena that returned it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaSlice {
    chunk: u32,
    offset: u32,
    len: u32,
}

impl ArenaSlice {
    /// Index of the chunk holding this slice.
    #[inline]
    pub const fn chunk(self) -> usize {
        self.chunk as usize
    }

    /// Byte offset of the slice within its chunk.
    #[inline]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Sub-range of this slice, relative to its start.
    ///
    /// # Panics
    /// Panics if `start + len` exceeds the slice length.
    #[inline]
    #[track_caller]
    pub fn sub(self, start: usize, len: usize) -> ArenaSlice {
        assert!(
            start + len <= self.len(),
            "sub-slice {start}..{} out of bounds for arena slice of {} bytes",
            start + len,
            self.len
        );
        ArenaSlice {
            chunk: self.chunk,
            offset: self.offset + to_u32(start, "arena offset"),
            len: to_u32(len, "arena slice length"),
        }
    }
}

/// Bump-pointer allocator growing in fixed-size chunks.
///
/// Allocation never fails with an error. When the current chunk cannot hold
/// a request, a fresh chunk is appended to the chunk list and the bump
/// pointer restarts there; the tail of the abandoned chunk is wasted.
pub struct Arena {
    chunks: Vec<Box<[u8]>>,
    /// Bump pointer into the last chunk.
    used: usize,
    chunk_size: usize,
    allocated: usize,
}

impl Arena {
    /// Create an empty arena with the default [`CHUNK_SIZE`].
    pub fn new() -> Self {
        Self::with_chunk_size(CHUNK_SIZE)
    }

    /// Create an empty arena whose chunks hold `chunk_size` bytes.
    ///
    /// No chunk is allocated until the first request.
    ///
    /// # Panics
    /// Panics if `chunk_size` is zero or does not fit in a `u32`.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "arena chunk size must be non-zero");
        to_u32(chunk_size, "arena chunk size");
        Arena {
            chunks: Vec::new(),
            used: 0,
            chunk_size,
            allocated: 0,
        }
    }

    /// Allocate `size` zeroed bytes.
    ///
    /// # Panics
    /// Panics if `size` exceeds the chunk size. There is no oversized-object
    /// path; callers must configure a chunk size large enough for their
    /// largest request.
    #[track_caller]
    pub fn alloc(&mut self, size: usize) -> ArenaSlice {
        assert!(
            size <= self.chunk_size,
            "arena request of {size} bytes exceeds chunk size of {} bytes",
            self.chunk_size
        );

        if self.chunks.is_empty() || self.used + size > self.chunk_size {
            self.chunks
                .push(vec![0u8; self.chunk_size].into_boxed_slice());
            self.used = 0;
            tracing::trace!(
                chunks = self.chunks.len(),
                chunk_size = self.chunk_size,
                "arena grew"
            );
        }

        let slice = ArenaSlice {
            chunk: to_u32(self.chunks.len() - 1, "arena chunk index"),
            offset: to_u32(self.used, "arena offset"),
            len: to_u32(size, "arena slice length"),
        };
        self.used += size;
        self.allocated += size;
        slice
    }

    /// Allocate space for `bytes` and copy them in.
    #[track_caller]
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> ArenaSlice {
        let slice = self.alloc(bytes.len());
        self.get_mut(slice).copy_from_slice(bytes);
        slice
    }

    /// Bytes behind a handle.
    ///
    /// # Panics
    /// Panics if `slice` was not produced by this arena.
    #[inline]
    #[track_caller]
    pub fn get(&self, slice: ArenaSlice) -> &[u8] {
        &self.chunks[slice.chunk()][slice.offset()..slice.offset() + slice.len()]
    }

    /// Mutable bytes behind a handle.
    ///
    /// # Panics
    /// Panics if `slice` was not produced by this arena.
    #[inline]
    #[track_caller]
    pub fn get_mut(&mut self, slice: ArenaSlice) -> &mut [u8] {
        &mut self.chunks[slice.chunk()][slice.offset()..slice.offset() + slice.len()]
    }

    /// Whether `slice` lies entirely inside one of this arena's chunks.
    pub fn contains(&self, slice: ArenaSlice) -> bool {
        self.chunks
            .get(slice.chunk())
            .is_some_and(|chunk| slice.offset() + slice.len() <= chunk.len())
    }

    /// Number of chunks allocated so far.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Configured chunk size.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total bytes reserved across all chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_size
    }

    /// Total bytes handed out by [`alloc`](Self::alloc).
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("chunks", &self.chunks.len())
            .field("chunk_size", &self.chunk_size)
            .field("allocated", &self.allocated)
            .finish()
    }
}

/// Convert a `usize` to `u32`, panicking with context on overflow.
#[inline]
#[track_caller]
pub(crate) fn to_u32(value: usize, what: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic!("{what} exceeds u32::MAX: {value}"))
}
