use crate::arena::Entry;
use crate::avl_tree::compare::Comparator;
use crate::avl_tree::error::{Error, Result};
use crate::avl_tree::node::{Dir, Nodes};
use crate::avl_tree::tree::AvlTree;
use std::cmp::Ordering;
use std::result;

/// A stateful position in an `AvlTree<T, C>`.
///
/// A cursor records the path from the root to its current node and the tree's nonce at the time
/// the path was built. It is only a handle: every operation on it goes through the tree that
/// created it. A cursor becomes invalid when it moves past either end of the tree, when it was
/// created by a search that failed, or as soon as the tree is mutated. An invalid cursor never
/// becomes valid again.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for key in &[1, 4, 2] {
///     tree.insert(*key).unwrap();
/// }
///
/// let cursor = tree.leftmost().unwrap();
/// let mut keys = Vec::new();
/// while let Some(key) = tree.dereference(&cursor).copied() {
///     keys.push(key);
///     tree.increment(&cursor).unwrap();
/// }
/// assert_eq!(keys, vec![1, 2, 4]);
/// tree.destroy_cursor(cursor).unwrap();
/// ```
#[derive(Debug)]
pub struct Cursor {
    slot: Entry,
    tree: usize,
}

pub struct CursorState {
    path: Vec<Entry>,
    nonce: u64,
}

/// Moves `path` to the in-order neighbour on the `dir` side of its last node. The path is
/// emptied when no such neighbour exists.
fn advance<T>(nodes: &Nodes<T>, path: &mut Vec<Entry>, dir: Dir) {
    let curr = match path.last() {
        Some(&curr) => curr,
        None => return,
    };

    if let Some(child) = nodes[curr].child(dir) {
        let mut next = Some(child);
        while let Some(entry) = next {
            path.push(entry);
            next = nodes[entry].child(dir.opposite());
        }
        return;
    }

    while let Some(child) = path.pop() {
        match path.last() {
            Some(&parent) if nodes[parent].child(dir.opposite()) == Some(child) => return,
            Some(_) => continue,
            None => return,
        }
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    fn empty_path(&self) -> Result<Vec<Entry>> {
        let mut path = Vec::new();
        if path.try_reserve(self.height()).is_err() {
            return Err(self.report(Error::AllocationFailure));
        }
        Ok(path)
    }

    fn register(&mut self, path: Vec<Entry>) -> Result<Cursor> {
        let state = CursorState {
            path,
            nonce: self.nonce,
        };
        match self.cursors.try_allocate(state) {
            Ok(slot) => Ok(Cursor {
                slot,
                tree: self.id,
            }),
            Err(_) => Err(self.report(Error::AllocationFailure)),
        }
    }

    fn extreme_cursor(&mut self, dir: Dir) -> Result<Cursor> {
        let mut path = self.empty_path()?;
        let mut curr = self.root;
        while let Some(entry) = curr {
            path.push(entry);
            curr = self.nodes[entry].child(dir);
        }
        self.register(path)
    }

    /// Returns a cursor at the minimum value of the tree. The cursor is invalid if the tree is
    /// empty.
    pub fn leftmost(&mut self) -> Result<Cursor> {
        self.extreme_cursor(Dir::Left)
    }

    /// Returns a cursor at the maximum value of the tree. The cursor is invalid if the tree is
    /// empty.
    pub fn rightmost(&mut self) -> Result<Cursor> {
        self.extreme_cursor(Dir::Right)
    }

    /// Returns a cursor at the value equal to `query`. The cursor is invalid if no such value
    /// exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(10).unwrap();
    ///
    /// let found = tree.find_cursor(&10).unwrap();
    /// let missing = tree.find_cursor(&11).unwrap();
    /// assert!(tree.is_valid(&found));
    /// assert!(!tree.is_valid(&missing));
    /// ```
    pub fn find_cursor(&mut self, query: &T) -> Result<Cursor> {
        let mut path = self.empty_path()?;
        let mut curr = self.root;
        let mut found = false;
        while let Some(entry) = curr {
            path.push(entry);
            curr = match self.comparator.compare(query, &self.nodes[entry].value) {
                Ordering::Less => self.nodes[entry].left,
                Ordering::Greater => self.nodes[entry].right,
                Ordering::Equal => {
                    found = true;
                    break;
                },
            };
        }
        if !found {
            path.clear();
        }
        self.register(path)
    }

    /// Returns `true` if `cursor` was created by this tree, points at a value, and the tree has
    /// not been mutated since.
    pub fn is_valid(&self, cursor: &Cursor) -> bool {
        cursor.tree == self.id
            && self
                .cursors
                .get(&cursor.slot)
                .map_or(false, |state| !state.path.is_empty() && state.nonce == self.nonce)
    }

    fn check(&self, cursor: &Cursor) -> Result<()> {
        if cursor.tree != self.id {
            return Err(self.report(Error::ForeignCursor));
        }
        if !self.is_valid(cursor) {
            return Err(self.report(Error::InvalidCursor));
        }
        Ok(())
    }

    /// Returns the value at `cursor`. Returns `None`, and reports `Error::InvalidCursor` to the
    /// error handler, if the cursor is invalid.
    pub fn dereference(&self, cursor: &Cursor) -> Option<&T> {
        self.check(cursor).ok()?;
        let entry = *self.cursors[cursor.slot].path.last()?;
        Some(&self.nodes[entry].value)
    }

    fn step(&mut self, cursor: &Cursor, dir: Dir) -> Result<()> {
        self.check(cursor)?;
        let AvlTree {
            ref mut cursors,
            ref nodes,
            ..
        } = *self;
        advance(nodes, &mut cursors[cursor.slot].path, dir);
        Ok(())
    }

    /// Moves `cursor` to the next value in ascending order. Moving past the maximum value
    /// invalidates the cursor.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCursor` and leaves the cursor untouched if it is already invalid.
    pub fn increment(&mut self, cursor: &Cursor) -> Result<()> {
        self.step(cursor, Dir::Right)
    }

    /// Moves `cursor` to the previous value in ascending order. Moving past the minimum value
    /// invalidates the cursor.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCursor` and leaves the cursor untouched if it is already invalid.
    pub fn decrement(&mut self, cursor: &Cursor) -> Result<()> {
        self.step(cursor, Dir::Left)
    }

    /// Unregisters `cursor` and frees its state.
    ///
    /// # Errors
    ///
    /// Returns `Error::ForeignCursor` together with the untouched cursor if it was created by
    /// another tree, so it can still be destroyed by its owner.
    pub fn destroy_cursor(&mut self, cursor: Cursor) -> result::Result<(), (Error, Cursor)> {
        if cursor.tree != self.id {
            return Err((self.report(Error::ForeignCursor), cursor));
        }
        self.cursors.free(&cursor.slot);
        Ok(())
    }
}

impl<T, C> AvlTree<T, C> {
    /// Returns the number of cursors registered with the tree.
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }
}
