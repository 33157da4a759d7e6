//! Chunked slab allocator with an optional limit on live objects.

use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object allocated in a `TypedArena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Entry {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Entry>),
}

/// An allocator for a single type of object.
///
/// Objects are stored in fixed-size chunks so that nothing is moved when the arena grows. Freed
/// blocks are kept on an intrusive free list and reused before a new chunk is pushed. An arena
/// may be given a limit on the number of live objects; once the limit is reached
/// `try_allocate` hands the object back instead of storing it.
///
/// # Examples
///
/// ```
/// use avl_collections::arena::TypedArena;
///
/// let mut arena = TypedArena::with_limit(16, Some(1));
///
/// let x = arena.try_allocate(1).unwrap();
/// assert_eq!(arena[x], 1);
/// assert_eq!(arena.try_allocate(2), Err(2));
///
/// assert_eq!(arena.free(&x), 1);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Entry>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
    limit: Option<usize>,
}

impl<T> TypedArena<T> {
    fn block(&self, entry: &Entry) -> Option<&Block<T>> {
        self.chunks
            .get(entry.chunk_index)
            .and_then(|chunk| chunk.get(entry.block_index))
    }

    fn block_mut(&mut self, entry: &Entry) -> Option<&mut Block<T>> {
        self.chunks
            .get_mut(entry.chunk_index)
            .and_then(|chunk| chunk.get_mut(entry.block_index))
    }

    /// Constructs a new, empty `TypedArena<T>` with a specific number of objects per chunk and
    /// no limit on the number of live objects.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Self {
        Self::with_limit(chunk_size, None)
    }

    /// Constructs a new, empty `TypedArena<T>` that holds at most `limit` live objects.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_limit(chunk_size: usize, limit: Option<usize>) -> Self {
        assert!(chunk_size > 0, "Expected a non-zero chunk size.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
            limit,
        }
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum number of live objects, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Stores an object in the arena and returns its `Entry`. If the arena is at its limit, the
    /// object is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.try_allocate(0).unwrap();
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn try_allocate(&mut self, value: T) -> Result<Entry, T> {
        if let Some(limit) = self.limit {
            if self.len >= limit {
                return Err(value);
            }
        }

        if let Some(entry) = self.head {
            let next = match self.block(&entry) {
                Some(Block::Vacant(next)) => *next,
                _ => panic!("Expected a vacant block at the head of the free list."),
            };
            self.head = next;
            self.chunks[entry.chunk_index][entry.block_index] = Block::Occupied(value);
            self.len += 1;
            return Ok(entry);
        }

        if self.len == self.capacity {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }

        let chunk_index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_index];
        chunk.push(Block::Occupied(value));
        self.len += 1;
        Ok(Entry {
            chunk_index,
            block_index: chunk.len() - 1,
        })
    }

    /// Removes an object from the arena and returns it. Its block is reused by a later
    /// allocation.
    ///
    /// # Panics
    ///
    /// Panics if `entry` does not refer to a live object.
    pub fn free(&mut self, entry: &Entry) -> T {
        let head = self.head;
        let old_block = match self.block_mut(entry) {
            Some(block) => mem::replace(block, Block::Vacant(head)),
            None => panic!("Attempting to free an entry outside of the arena."),
        };
        match old_block {
            Block::Occupied(value) => {
                self.head = Some(*entry);
                self.len -= 1;
                value
            },
            Block::Vacant(next) => {
                if let Some(block) = self.block_mut(entry) {
                    *block = Block::Vacant(next);
                }
                panic!("Attempting to free a vacant block.");
            },
        }
    }

    /// Returns an immutable reference to an object in the arena. Returns `None` if the entry
    /// does not refer to a live object.
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        match self.block(entry) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to an object in the arena. Returns `None` if the entry does
    /// not refer to a live object.
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        match self.block_mut(entry) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        self.get(&entry).expect("Expected entry to refer to a live object.")
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        self.get_mut(&entry).expect("Expected entry to refer to a live object.")
    }
}
