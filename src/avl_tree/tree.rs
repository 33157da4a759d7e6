use crate::arena::{Entry, TypedArena};
use crate::avl_tree::compare::{Comparator, Natural};
use crate::avl_tree::config::Config;
use crate::avl_tree::cursor::CursorState;
use crate::avl_tree::error::{Error, Result};
use crate::avl_tree::node::{self, Dir, Link, Node, Nodes};
use log::{debug, warn};
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::atomic::{self, AtomicUsize};

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(0);

type ErrorHandler = Box<dyn Fn(&Error)>;

/// An ordered set implemented using an avl tree.
///
/// An avl tree is a self-balancing binary search tree that maintains the invariant that the
/// heights of two child subtrees of any node differ by at most one. Values are ordered by a
/// `Comparator<T>`; two values that compare equal are the same element, so the tree never holds
/// duplicates.
///
/// Every structural mutation bumps a per-tree nonce. Cursors remember the nonce they were
/// created with and become invalid as soon as it changes.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlTree;
///
/// let mut tree = AvlTree::new();
/// assert_eq!(tree.insert(3), Ok(true));
/// assert_eq!(tree.insert(1), Ok(true));
/// assert_eq!(tree.insert(3), Ok(false));
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.find(&1), Some(&1));
/// assert_eq!(tree.min(), Some(&1));
///
/// assert_eq!(tree.remove(&3), Some(3));
/// assert_eq!(tree.remove(&3), None);
/// ```
pub struct AvlTree<T, C = Natural> {
    pub(super) id: usize,
    pub(super) cursors: TypedArena<CursorState>,
    pub(super) nodes: Nodes<T>,
    pub(super) root: Link,
    pub(super) nonce: u64,
    pub(super) comparator: C,
    len: usize,
    error_handler: Option<ErrorHandler>,
}

impl<T> AvlTree<T, Natural>
where
    T: Ord,
{
    /// Constructs a new, empty `AvlTree<T>` ordered by `T: Ord`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let tree: AvlTree<u32> = AvlTree::new();
    /// assert!(tree.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    /// Constructs a new, empty `AvlTree<T, C>` ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::with_comparator(|a: &(u16, u32), b: &(u16, u32)| a.0 < b.0);
    /// tree.insert((4, 400)).unwrap();
    /// assert_eq!(tree.find(&(4, 0)), Some(&(4, 400)));
    /// ```
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, Config::default())
    }

    /// Constructs a new, empty `AvlTree<T, C>` with specific storage settings.
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::{AvlTree, Config, Error, Natural};
    ///
    /// let config = Config {
    ///     max_len: Some(1),
    ///     ..Config::default()
    /// };
    /// let mut tree = AvlTree::with_config(Natural, config);
    /// assert_eq!(tree.insert(1), Ok(true));
    /// assert_eq!(tree.insert(2), Err(Error::AllocationFailure));
    /// ```
    pub fn with_config(comparator: C, config: Config) -> Self {
        AvlTree {
            id: NEXT_TREE_ID.fetch_add(1, atomic::Ordering::Relaxed),
            cursors: TypedArena::with_limit(config.chunk_size, config.max_cursors),
            nodes: TypedArena::with_limit(config.chunk_size, config.max_len),
            root: None,
            nonce: 0,
            comparator,
            len: 0,
            error_handler: None,
        }
    }

    /// Installs a handler that is called with every error before it is returned to the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let errors = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&errors);
    ///
    /// let mut tree: AvlTree<u32> = AvlTree::new();
    /// tree.set_error_handler(move |_| counter.set(counter.get() + 1));
    ///
    /// let cursor = tree.find_cursor(&1).unwrap();
    /// assert_eq!(tree.dereference(&cursor), None);
    /// assert_eq!(errors.get(), 1);
    /// ```
    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Error) + 'static,
    {
        self.error_handler = Some(Box::new(handler));
    }

    pub(super) fn report(&self, error: Error) -> Error {
        warn!("avl tree {}: {}", self.id, error);
        if let Some(ref handler) = self.error_handler {
            handler(&error);
        }
        error
    }

    fn allocate(&mut self, value: T) -> Result<Entry> {
        match self.nodes.try_allocate(Node::new(value)) {
            Ok(entry) => Ok(entry),
            Err(_) => Err(self.report(Error::AllocationFailure)),
        }
    }

    fn replace_link(&mut self, parent: Option<(Entry, Dir)>, link: Link) {
        match parent {
            None => self.root = link,
            Some((entry, dir)) => self.nodes[entry].set_child(dir, link),
        }
    }

    fn locate(&self, query: &T) -> Link {
        let mut curr = self.root;
        while let Some(entry) = curr {
            curr = match self.comparator.compare(query, &self.nodes[entry].value) {
                Ordering::Less => self.nodes[entry].left,
                Ordering::Greater => self.nodes[entry].right,
                Ordering::Equal => return Some(entry),
            };
        }
        None
    }

    fn bump_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
    }

    /// Inserts a value into the tree. Returns `Ok(true)` if the value was inserted and
    /// `Ok(false)` if an equal value is already present, in which case `value` is dropped and the
    /// tree is untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::AllocationFailure` if the tree is at its configured `max_len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.insert(1), Ok(true));
    /// assert_eq!(tree.insert(1), Ok(false));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> Result<bool> {
        let root = match self.root {
            Some(root) => root,
            None => {
                self.root = Some(self.allocate(value)?);
                self.len += 1;
                self.bump_nonce();
                return Ok(true);
            },
        };

        // Every node below `path[critical]` has a zero balance factor, so only nodes from
        // `path[critical]` down change and only `path[critical]` can end up out of balance.
        let mut path: Vec<(Entry, Dir)> = Vec::new();
        let mut critical = 0;
        let mut curr = root;
        loop {
            let dir = match self.comparator.compare(&value, &self.nodes[curr].value) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => return Ok(false),
            };
            path.push((curr, dir));
            match self.nodes[curr].child(dir) {
                Some(next) => {
                    if self.nodes[next].balance != 0 {
                        critical = path.len();
                    }
                    curr = next;
                },
                None => break,
            }
        }

        let leaf = self.allocate(value)?;
        if let Some(&(parent, dir)) = path.last() {
            self.nodes[parent].set_child(dir, Some(leaf));
        }

        for &(entry, dir) in &path[critical..] {
            self.nodes[entry].balance += dir.sign();
        }

        let (pivot, heavy) = path[critical];
        if self.nodes[pivot].balance.abs() > 1 {
            let new_root = node::rebalance_insert(&mut self.nodes, pivot, heavy);
            let parent = critical.checked_sub(1).map(|index| path[index]);
            self.replace_link(parent, Some(new_root));
        }

        self.len += 1;
        self.bump_nonce();
        Ok(true)
    }

    /// Removes the value equal to `query` and returns it. Returns `None` without touching the
    /// tree if no such value exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.remove(&1), Some(1));
    /// assert_eq!(tree.remove(&1), None);
    /// ```
    pub fn remove(&mut self, query: &T) -> Option<T> {
        // each entry records a node and the side the removal happened on
        let mut path: Vec<(Entry, Dir)> = Vec::new();
        let mut curr = self.root?;
        loop {
            let dir = match self.comparator.compare(query, &self.nodes[curr].value) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => break,
            };
            path.push((curr, dir));
            curr = self.nodes[curr].child(dir)?;
        }

        let target = curr;
        let removed = match (self.nodes[target].left, self.nodes[target].right) {
            (Some(_), Some(right_child)) => {
                path.push((target, Dir::Right));
                let mut successor = right_child;
                while let Some(left) = self.nodes[successor].left {
                    path.push((successor, Dir::Left));
                    successor = left;
                }
                let Node { value, right, .. } = self.nodes.free(&successor);
                self.replace_link(path.last().copied(), right);
                mem::replace(&mut self.nodes[target].value, value)
            },
            (left, right) => {
                let Node { value, .. } = self.nodes.free(&target);
                self.replace_link(path.last().copied(), left.or(right));
                value
            },
        };

        while let Some((entry, shrunk)) = path.pop() {
            let balance = self.nodes[entry].balance - shrunk.sign();
            self.nodes[entry].balance = balance;
            match balance {
                0 => continue,
                -1 | 1 => break,
                _ => {
                    let (new_root, unchanged) =
                        node::rebalance_remove(&mut self.nodes, entry, shrunk.opposite());
                    self.replace_link(path.last().copied(), Some(new_root));
                    if unchanged {
                        break;
                    }
                },
            }
        }

        self.len -= 1;
        self.bump_nonce();
        Some(removed)
    }

    /// Returns the value equal to `query`, or `None` if no such value exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.find(&0), None);
    /// assert_eq!(tree.find(&1), Some(&1));
    /// ```
    pub fn find(&self, query: &T) -> Option<&T> {
        self.locate(query).map(|entry| &self.nodes[entry].value)
    }

    /// Checks if a value equal to `query` exists in the tree.
    pub fn contains(&self, query: &T) -> bool {
        self.locate(query).is_some()
    }

    /// Calls `visitor` on every value in ascending order until it returns `false`. Returns
    /// `true` if every value was visited.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// for key in &[5, 1, 3, 4] {
    ///     tree.insert(*key).unwrap();
    /// }
    ///
    /// let mut seen = Vec::new();
    /// assert!(!tree.apply(|key| {
    ///     seen.push(*key);
    ///     *key < 3
    /// }));
    /// assert_eq!(seen, vec![1, 3]);
    /// ```
    pub fn apply<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        node::apply_inorder(&self.nodes, self.root, &mut visitor)
    }

    /// Removes and drops every value. All outstanding cursors become invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// tree.insert(2).unwrap();
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// ```
    pub fn clear(&mut self) {
        let freed = node::destroy_subtree(&mut self.nodes, self.root.take());
        debug!("avl tree {}: cleared {} values", self.id, freed);
        self.len = 0;
        self.bump_nonce();
    }

    /// Drops every registered cursor, then every value, then the tree itself.
    pub fn destroy(self) {
        debug!(
            "avl tree {}: destroying {} values and {} cursors",
            self.id,
            self.len,
            self.cursors.len(),
        );
    }
}

impl<T, C> AvlTree<T, C> {
    /// Returns the number of values in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of structural mutations performed on the tree so far.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Returns the number of levels in the tree.
    pub fn height(&self) -> usize {
        node::height(&self.nodes, self.root)
    }

    fn extreme(&self, dir: Dir) -> Option<&T> {
        let mut curr = self.root?;
        while let Some(next) = self.nodes[curr].child(dir) {
            curr = next;
        }
        Some(&self.nodes[curr].value)
    }

    /// Returns the minimum value of the tree. Returns `None` if the tree is empty.
    pub fn min(&self) -> Option<&T> {
        self.extreme(Dir::Left)
    }

    /// Returns the maximum value of the tree. Returns `None` if the tree is empty.
    pub fn max(&self) -> Option<&T> {
        self.extreme(Dir::Right)
    }

    /// Returns an iterator over the tree. The iterator will yield values using in-order
    /// traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(3).unwrap();
    /// tree.insert(1).unwrap();
    ///
    /// let mut iterator = tree.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
            remaining: self.len,
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Walks the tree in pre-order, calling `f` with each value, its balance factor and its
    /// depth. Empty child slots are reported as `None` with a balance factor of zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    ///
    /// let mut lines = Vec::new();
    /// tree.dump(|value, balance, depth| lines.push((value.copied(), balance, depth)));
    /// assert_eq!(lines, vec![(Some(1), 0, 0), (None, 0, 1), (None, 0, 1)]);
    /// ```
    pub fn dump<F>(&self, mut f: F)
    where
        F: FnMut(Option<&T>, i8, usize),
    {
        fn walk<T, F>(nodes: &Nodes<T>, link: Link, depth: usize, f: &mut F)
        where
            F: FnMut(Option<&T>, i8, usize),
        {
            match link {
                None => f(None, 0, depth),
                Some(entry) => {
                    let node = &nodes[entry];
                    f(Some(&node.value), node.balance, depth);
                    walk(nodes, node.left, depth + 1, f);
                    walk(nodes, node.right, depth + 1, f);
                },
            }
        }

        walk(&self.nodes, self.root, 0, &mut f);
    }
}

impl<T> Default for AvlTree<T, Natural>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> fmt::Debug for AvlTree<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, C> IntoIterator for &'a AvlTree<T, C>
where
    T: 'a,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator for `AvlTree<T, C>`.
///
/// This iterator traverses the elements of the tree in-order and yields immutable references.
pub struct Iter<'a, T>
where
    T: 'a,
{
    nodes: &'a Nodes<T>,
    stack: Vec<Entry>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T>
where
    T: 'a,
{
    fn push_left_spine(&mut self, mut link: Link) {
        while let Some(entry) = link {
            self.stack.push(entry);
            link = self.nodes[entry].left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        let nodes = self.nodes;
        self.push_left_spine(nodes[entry].right);
        self.remaining -= 1;
        Some(&nodes[entry].value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> where T: 'a {}

#[cfg(test)]
pub(crate) mod tests {
    use super::AvlTree;
    use crate::avl_tree::compare::Comparator;
    use crate::avl_tree::node::{Link, Nodes};
    use std::cell::Cell;
    use std::rc::Rc;

    // Returns the height of the subtree after checking balance factors and ordering.
    fn check_subtree<T, C>(nodes: &Nodes<T>, link: Link, comparator: &C, count: &mut usize) -> usize
    where
        C: Comparator<T>,
    {
        let entry = match link {
            Some(entry) => entry,
            None => return 0,
        };
        let node = &nodes[entry];
        *count += 1;
        if let Some(left) = node.left {
            assert!(comparator.less(&nodes[left].value, &node.value));
        }
        if let Some(right) = node.right {
            assert!(comparator.less(&node.value, &nodes[right].value));
        }
        let left_height = check_subtree(nodes, node.left, comparator, count);
        let right_height = check_subtree(nodes, node.right, comparator, count);
        let balance = right_height as i64 - left_height as i64;
        assert_eq!(balance, i64::from(node.balance));
        assert!(balance.abs() <= 1);
        left_height.max(right_height) + 1
    }

    pub(crate) fn check_invariants<T, C>(tree: &AvlTree<T, C>)
    where
        C: Comparator<T>,
    {
        let mut count = 0;
        let height = check_subtree(&tree.nodes, tree.root, &tree.comparator, &mut count);
        assert_eq!(count, tree.len());
        assert_eq!(count, tree.nodes.len());
        assert_eq!(height, tree.height());
        let values: Vec<&T> = tree.iter().collect();
        for pair in values.windows(2) {
            assert!(tree.comparator.less(pair[0], pair[1]));
        }
    }

    struct Tracked {
        key: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn by_key(a: &Tracked, b: &Tracked) -> bool {
        a.key < b.key
    }

    #[test]
    fn test_len_empty() {
        let tree: AvlTree<u32> = AvlTree::new();
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
    }

    #[test]
    fn test_insert_ascending() {
        let mut tree = AvlTree::new();
        for key in 0..100 {
            assert_eq!(tree.insert(key), Ok(true));
            check_invariants(&tree);
        }
        assert_eq!(tree.len(), 100);
        assert_eq!(tree.height(), 7);
        assert_eq!(tree.iter().cloned().collect::<Vec<u32>>(), (0..100).collect::<Vec<u32>>());
    }

    #[test]
    fn test_insert_descending() {
        let mut tree = AvlTree::new();
        for key in (0..100).rev() {
            tree.insert(key).unwrap();
            check_invariants(&tree);
        }
        assert_eq!(tree.min(), Some(&0));
        assert_eq!(tree.max(), Some(&99));
    }

    #[test]
    fn test_insert_zigzag() {
        let mut tree = AvlTree::new();
        for key in &[50, 10, 30, 20, 25, 40, 45, 42, 5, 7, 6] {
            tree.insert(*key).unwrap();
            check_invariants(&tree);
        }
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = AvlTree::new();
        for key in &[1, 4, 2, 10, 8, 3, 7] {
            tree.insert(*key).unwrap();
        }
        let nonce = tree.nonce();
        let mut before = Vec::new();
        tree.dump(|value, balance, depth| before.push((value.copied(), balance, depth)));

        assert_eq!(tree.insert(8), Ok(false));

        let mut after = Vec::new();
        tree.dump(|value, balance, depth| after.push((value.copied(), balance, depth)));
        assert_eq!(before, after);
        assert_eq!(tree.nonce(), nonce);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_duplicate_is_dropped() {
        let drops = Rc::new(Cell::new(0));
        let mut tree = AvlTree::with_comparator(by_key);
        let make = |key| Tracked {
            key,
            drops: Rc::clone(&drops),
        };
        assert_eq!(tree.insert(make(1)), Ok(true));
        assert_eq!(tree.insert(make(1)), Ok(false));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_remove_every_shape() {
        for removed in 0..31 {
            let mut tree = AvlTree::new();
            for key in 0..31 {
                tree.insert(key).unwrap();
            }
            let nonce = tree.nonce();
            assert_eq!(tree.remove(&removed), Some(removed));
            check_invariants(&tree);
            assert_eq!(tree.len(), 30);
            assert_eq!(tree.nonce(), nonce + 1);
            assert!(!tree.contains(&removed));
        }
    }

    #[test]
    fn test_remove_rotations() {
        let mut tree = AvlTree::new();
        for key in 0..64 {
            tree.insert(key).unwrap();
        }
        for key in (0..64).step_by(3) {
            assert_eq!(tree.remove(&key), Some(key));
            check_invariants(&tree);
        }
        for key in (0..64).rev() {
            tree.remove(&key);
            check_invariants(&tree);
        }
        assert!(tree.is_empty());
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut tree = AvlTree::new();
        for key in &[1, 4, 2, 10, 8] {
            tree.insert(*key).unwrap();
        }
        let nonce = tree.nonce();
        assert_eq!(tree.remove(&5), None);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.nonce(), nonce);

        let mut empty: AvlTree<u32> = AvlTree::new();
        assert_eq!(empty.remove(&5), None);
        assert_eq!(empty.nonce(), 0);
    }

    #[test]
    fn test_find_paired_value() {
        let mut tree = AvlTree::with_comparator(|a: &(u16, u32), b: &(u16, u32)| a.0 < b.0);
        for key in 0..100u16 {
            tree.insert((key, u32::from(key) * 100)).unwrap();
        }
        assert_eq!(tree.find(&(10, 0)), Some(&(10, 1000)));
        assert_eq!(tree.remove(&(10, 0)), Some((10, 1000)));
        assert_eq!(tree.len(), 99);
        assert_eq!(tree.find(&(10, 0)), None);
        check_invariants(&tree);
    }

    #[test]
    fn test_apply_stops_at_eight() {
        let mut tree = AvlTree::new();
        for key in &[1, 4, 2, 10, 8, 3, 7] {
            tree.insert(*key).unwrap();
        }
        let mut seen = Vec::new();
        let finished = tree.apply(|key| {
            seen.push(*key);
            *key != 8
        });
        assert!(!finished);
        assert_eq!(seen, vec![1, 2, 3, 4, 7, 8]);
        assert!(tree.apply(|_| true));
    }

    #[test]
    fn test_clear() {
        let drops = Rc::new(Cell::new(0));
        let mut tree = AvlTree::with_comparator(by_key);
        for key in 0..10 {
            tree.insert(Tracked {
                key,
                drops: Rc::clone(&drops),
            })
            .unwrap();
        }
        let nonce = tree.nonce();
        tree.clear();
        assert_eq!(drops.get(), 10);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.nonce(), nonce + 1);
        assert!(tree.nodes.is_empty());
        check_invariants(&tree);

        tree.insert(Tracked {
            key: 3,
            drops: Rc::clone(&drops),
        })
        .unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_destroy_drops_values() {
        let drops = Rc::new(Cell::new(0));
        let mut tree = AvlTree::with_comparator(by_key);
        for key in 0..25 {
            tree.insert(Tracked {
                key,
                drops: Rc::clone(&drops),
            })
            .unwrap();
        }
        let removed = tree.remove(&Tracked {
            key: 3,
            drops: Rc::new(Cell::new(0)),
        });
        assert!(removed.is_some());
        assert_eq!(drops.get(), 0);
        drop(removed);
        assert_eq!(drops.get(), 1);

        tree.destroy();
        assert_eq!(drops.get(), 25);
    }

    #[test]
    fn test_allocation_failure_leaves_tree() {
        let config = crate::avl_tree::Config {
            chunk_size: 4,
            max_len: Some(3),
            max_cursors: None,
        };
        let mut tree = AvlTree::with_config(crate::avl_tree::Natural, config);
        let errors = Rc::new(Cell::new(0));
        let counter = Rc::clone(&errors);
        tree.set_error_handler(move |_| counter.set(counter.get() + 1));

        for key in 0..3 {
            tree.insert(key).unwrap();
        }
        let nonce = tree.nonce();
        assert_eq!(tree.insert(3), Err(crate::avl_tree::Error::AllocationFailure));
        assert_eq!(errors.get(), 1);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.nonce(), nonce);
        check_invariants(&tree);

        assert_eq!(tree.insert(1), Ok(false));
        tree.remove(&0);
        assert_eq!(tree.insert(3), Ok(true));
        check_invariants(&tree);
    }

    #[test]
    fn test_debug() {
        let mut tree = AvlTree::new();
        tree.insert(2).unwrap();
        tree.insert(1).unwrap();
        assert_eq!(format!("{:?}", tree), "{1, 2}");
    }

    #[test]
    fn test_iter_len() {
        let mut tree = AvlTree::new();
        for key in 0..10 {
            tree.insert(key).unwrap();
        }
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 10);
        iter.next();
        assert_eq!(iter.len(), 9);
        assert_eq!((&tree).into_iter().count(), 10);
    }
}
