use std::cmp::Ordering;

/// A strict weak ordering over `T`.
///
/// `less(a, b)` returns `true` when `a` strictly precedes `b`. Two values are considered equal
/// when neither precedes the other. The ordering must be total and consistent for the lifetime
/// of a tree; an inconsistent comparator leaves the tree in an unspecified (but memory safe)
/// order.
pub trait Comparator<T> {
    fn less(&self, a: &T, b: &T) -> bool;

    /// Three-way comparison derived from `less`.
    fn compare(&self, a: &T, b: &T) -> Ordering {
        if self.less(a, b) {
            Ordering::Less
        } else if self.less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Orders values by their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<T> Comparator<T> for Natural
where
    T: Ord,
{
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}
