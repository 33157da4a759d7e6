use crate::arena::{Entry, TypedArena};
use log::trace;

pub type Link = Option<Entry>;
pub type Nodes<T> = TypedArena<Node<T>>;

/// The side of a node a child hangs on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    /// Change in balance factor when the subtree on this side grows by one level.
    pub fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

/// A struct representing an internal node of an avl tree.
///
/// `balance` is `height(right) - height(left)`. It lies in `[-1, 1]` between operations and
/// reaches `±2` only while a rebalance is pending.
#[derive(Debug)]
pub struct Node<T> {
    pub value: T,
    pub balance: i8,
    pub left: Link,
    pub right: Link,
}

impl<T> Node<T> {
    pub fn new(value: T) -> Self {
        Node {
            value,
            balance: 0,
            left: None,
            right: None,
        }
    }

    pub fn child(&self, dir: Dir) -> Link {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    pub fn set_child(&mut self, dir: Dir, link: Link) {
        match dir {
            Dir::Left => self.left = link,
            Dir::Right => self.right = link,
        }
    }
}

fn expect_child<T>(nodes: &Nodes<T>, entry: Entry, dir: Dir) -> Entry {
    match nodes[entry].child(dir) {
        Some(child) => child,
        None => unreachable!(),
    }
}

/// Rotates the subtree rooted at `root` towards `dir`: the child on the opposite side becomes
/// the new subtree root, which is returned. Balance factors are left to the caller.
pub fn rotate<T>(nodes: &mut Nodes<T>, root: Entry, dir: Dir) -> Entry {
    let pivot = expect_child(nodes, root, dir.opposite());
    let inner = nodes[pivot].child(dir);
    nodes[root].set_child(dir.opposite(), inner);
    nodes[pivot].set_child(dir, Some(root));
    pivot
}

/// Rotates the heavy child away from `dir`, then rotates `root` towards `dir`. The grandchild
/// on the inner side becomes the new subtree root.
pub fn rotate_double<T>(nodes: &mut Nodes<T>, root: Entry, dir: Dir) -> Entry {
    let child = expect_child(nodes, root, dir.opposite());
    let new_child = rotate(nodes, child, dir.opposite());
    nodes[root].set_child(dir.opposite(), Some(new_child));
    rotate(nodes, root, dir)
}

/// Sets the balance factors of `root`, its `heavy` child and the inner grandchild to the values
/// they will have after a double rotation.
fn adjust_for_double<T>(nodes: &mut Nodes<T>, root: Entry, heavy: Dir) {
    let child = expect_child(nodes, root, heavy);
    let grandchild = expect_child(nodes, child, heavy.opposite());
    let lean = heavy.sign();
    let (root_balance, child_balance) = match nodes[grandchild].balance {
        0 => (0, 0),
        balance if balance == lean => (-lean, 0),
        _ => (0, lean),
    };
    nodes[root].balance = root_balance;
    nodes[child].balance = child_balance;
    nodes[grandchild].balance = 0;
}

/// Restores balance at `root` after an insertion made its `heavy` side two levels taller.
/// Returns the new subtree root; the subtree regains its height from before the insertion.
pub fn rebalance_insert<T>(nodes: &mut Nodes<T>, root: Entry, heavy: Dir) -> Entry {
    let child = expect_child(nodes, root, heavy);
    if nodes[child].balance == heavy.sign() {
        trace!("single rotation after insert");
        nodes[root].balance = 0;
        nodes[child].balance = 0;
        rotate(nodes, root, heavy.opposite())
    } else {
        trace!("double rotation after insert");
        adjust_for_double(nodes, root, heavy);
        rotate_double(nodes, root, heavy.opposite())
    }
}

/// Restores balance at `root` after a removal made its `heavy` side two levels taller. Returns
/// the new subtree root and whether the subtree height is unchanged, in which case no ancestor
/// needs updating.
pub fn rebalance_remove<T>(nodes: &mut Nodes<T>, root: Entry, heavy: Dir) -> (Entry, bool) {
    let child = expect_child(nodes, root, heavy);
    let lean = heavy.sign();
    match nodes[child].balance {
        0 => {
            trace!("single rotation after remove, height unchanged");
            nodes[root].balance = lean;
            nodes[child].balance = -lean;
            (rotate(nodes, root, heavy.opposite()), true)
        },
        balance if balance == lean => {
            trace!("single rotation after remove");
            nodes[root].balance = 0;
            nodes[child].balance = 0;
            (rotate(nodes, root, heavy.opposite()), false)
        },
        _ => {
            trace!("double rotation after remove");
            adjust_for_double(nodes, root, heavy);
            (rotate_double(nodes, root, heavy.opposite()), false)
        },
    }
}

/// Frees every node of the subtree post-order, dropping their values. Returns the number of
/// nodes freed.
pub fn destroy_subtree<T>(nodes: &mut Nodes<T>, link: Link) -> usize {
    let mut freed = 0;
    let mut stack: Vec<(Entry, bool)> = link.into_iter().map(|entry| (entry, false)).collect();
    while let Some((entry, expanded)) = stack.pop() {
        if expanded {
            nodes.free(&entry);
            freed += 1;
            continue;
        }
        stack.push((entry, true));
        let node = &nodes[entry];
        stack.extend(node.right.map(|child| (child, false)));
        stack.extend(node.left.map(|child| (child, false)));
    }
    freed
}

/// In-order traversal that stops as soon as `visitor` returns `false`.
pub fn apply_inorder<T, F>(nodes: &Nodes<T>, link: Link, visitor: &mut F) -> bool
where
    F: FnMut(&T) -> bool,
{
    match link {
        None => true,
        Some(entry) => {
            let node = &nodes[entry];
            apply_inorder(nodes, node.left, visitor)
                && visitor(&node.value)
                && apply_inorder(nodes, node.right, visitor)
        },
    }
}

pub fn height<T>(nodes: &Nodes<T>, link: Link) -> usize {
    // follow the taller side; balance factors make this exact
    let mut height = 0;
    let mut curr = link;
    while let Some(entry) = curr {
        height += 1;
        let node = &nodes[entry];
        curr = if node.balance < 0 { node.left } else { node.right.or(node.left) };
    }
    height
}

#[cfg(test)]
mod tests {
    use super::{apply_inorder, destroy_subtree, rebalance_insert, rebalance_remove, rotate, Dir, Node, Nodes};
    use crate::arena::{Entry, TypedArena};

    fn leaf(nodes: &mut Nodes<u32>, value: u32) -> Entry {
        nodes.try_allocate(Node::new(value)).unwrap()
    }

    fn collect(nodes: &Nodes<u32>, root: Entry) -> Vec<u32> {
        let mut values = Vec::new();
        apply_inorder(nodes, Some(root), &mut |value: &u32| {
            values.push(*value);
            true
        });
        values
    }

    #[test]
    fn test_node_debug() {
        let mut nodes = TypedArena::new(8);
        let entry = leaf(&mut nodes, 5);
        assert_eq!(
            format!("{:?}", nodes[entry]),
            "Node { value: 5, balance: 0, left: None, right: None }",
        );
    }

    #[test]
    fn test_rotate_left() {
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 1);
        let b = leaf(&mut nodes, 2);
        let c = leaf(&mut nodes, 3);
        nodes[a].right = Some(b);
        nodes[b].right = Some(c);
        let root = rotate(&mut nodes, a, Dir::Left);
        assert_eq!(root, b);
        assert_eq!(nodes[b].left, Some(a));
        assert_eq!(nodes[a].right, None);
        assert_eq!(collect(&nodes, root), vec![1, 2, 3]);
    }

    #[test]
    fn test_rebalance_insert_single() {
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 3);
        let b = leaf(&mut nodes, 2);
        let c = leaf(&mut nodes, 1);
        nodes[a].left = Some(b);
        nodes[b].left = Some(c);
        nodes[a].balance = -2;
        nodes[b].balance = -1;
        let root = rebalance_insert(&mut nodes, a, Dir::Left);
        assert_eq!(root, b);
        assert_eq!(nodes[root].balance, 0);
        assert_eq!(nodes[a].balance, 0);
        assert_eq!(collect(&nodes, root), vec![1, 2, 3]);
    }

    #[test]
    fn test_rebalance_insert_double() {
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 1);
        let b = leaf(&mut nodes, 3);
        let c = leaf(&mut nodes, 2);
        nodes[a].right = Some(b);
        nodes[b].left = Some(c);
        nodes[a].balance = 2;
        nodes[b].balance = -1;
        let root = rebalance_insert(&mut nodes, a, Dir::Right);
        assert_eq!(root, c);
        assert_eq!(nodes[c].left, Some(a));
        assert_eq!(nodes[c].right, Some(b));
        for entry in &[a, b, c] {
            assert_eq!(nodes[*entry].balance, 0);
        }
    }

    #[test]
    fn test_rebalance_remove_keeps_height() {
        // 1 (+2) with right child 3 (0) having children 2 and 4
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 1);
        let b = leaf(&mut nodes, 3);
        let c = leaf(&mut nodes, 2);
        let d = leaf(&mut nodes, 4);
        nodes[a].right = Some(b);
        nodes[b].left = Some(c);
        nodes[b].right = Some(d);
        nodes[a].balance = 2;
        let (root, unchanged) = rebalance_remove(&mut nodes, a, Dir::Right);
        assert!(unchanged);
        assert_eq!(root, b);
        assert_eq!(nodes[b].balance, -1);
        assert_eq!(nodes[a].balance, 1);
        assert_eq!(collect(&nodes, root), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_destroy_subtree() {
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 2);
        let b = leaf(&mut nodes, 1);
        let c = leaf(&mut nodes, 3);
        nodes[a].left = Some(b);
        nodes[a].right = Some(c);
        assert_eq!(destroy_subtree(&mut nodes, Some(a)), 3);
        assert!(nodes.is_empty());
        assert_eq!(destroy_subtree(&mut nodes, None), 0);
    }

    #[test]
    fn test_apply_stops_early() {
        let mut nodes = TypedArena::new(8);
        let a = leaf(&mut nodes, 2);
        let b = leaf(&mut nodes, 1);
        let c = leaf(&mut nodes, 3);
        nodes[a].left = Some(b);
        nodes[a].right = Some(c);
        let mut seen = Vec::new();
        let finished = apply_inorder(&nodes, Some(a), &mut |value: &u32| {
            seen.push(*value);
            *value != 2
        });
        assert!(!finished);
        assert_eq!(seen, vec![1, 2]);
    }
}
