//! Arena-backed weight-balanced tree of monoid elements.

use crate::{Monoid, MonoidOrd};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of sequence identities, used to catch cursors applied to the wrong
/// sequence.
static NEXT_SEQUENCE_ID: AtomicU32 = AtomicU32::new(1);

/// Rebalance when one side holds more than this many times the other's leaves.
///
/// Every vertex keeps its sides within this ratio after each insert or erase.
/// A ratio of 2 cannot be restored by single and double rotations with any
/// integer `GAMMA`; 3 with a `GAMMA` of 2 is the pair that can.
const DELTA: usize = 3;
/// Choose a double rotation when the inner grandchild holds at least this many
/// times the outer grandchild's leaves.
const GAMMA: usize = 2;

/// Stable name of one element of a sequence.
///
/// Leaves survive edits elsewhere in the sequence. Once erased, a leaf's slot
/// may be reused, but with a new generation, so the stale leaf no longer
/// resolves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Leaf {
    index: u32,
    generation: u32,
}

/// A position in a sequence: a leaf, or the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    sequence: u32,
    leaf: Option<Leaf>,
}

impl Cursor {
    /// The leaf at this position, or `None` at the end.
    #[inline]
    pub fn leaf(self) -> Option<Leaf> {
        self.leaf
    }

    #[inline]
    pub fn is_end(self) -> bool {
        self.leaf.is_none()
    }
}

struct Node<T> {
    /// For a leaf, the element. For an internal vertex, the sum of its left
    /// subtree.
    value: T,
    parent: Option<u32>,
    left: Option<u32>,
    right: Option<u32>,
    /// Vertices in this subtree, counting this one. Internal vertices always
    /// have two children, so a subtree of `size` vertices has `(size + 1) / 2`
    /// leaves.
    size: u32,
    generation: u32,
    live: bool,
}

impl<T> Node<T> {
    #[inline]
    fn children(&self) -> Option<(u32, u32)> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }
}

/// Ordered sequence of monoid elements with O(log n) edits and prefix sums.
pub struct MonoidSequence<T> {
    id: u32,
    nodes: Vec<Node<T>>,
    free: Vec<u32>,
    root: Option<u32>,
}

impl<T: Monoid> MonoidSequence<T> {
    pub fn new() -> Self {
        MonoidSequence {
            id: NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    // === Positions ===

    #[inline]
    fn cursor_at(&self, index: u32) -> Cursor {
        Cursor {
            sequence: self.id,
            leaf: Some(Leaf {
                index,
                generation: self.nodes[index as usize].generation,
            }),
        }
    }

    #[inline]
    fn check(&self, cursor: Cursor) {
        debug_assert_eq!(cursor.sequence, self.id, "cursor from another sequence");
        debug_assert!(
            cursor.leaf.map_or(true, |leaf| self.is_live(leaf)),
            "stale cursor"
        );
    }

    fn is_live(&self, leaf: Leaf) -> bool {
        self.nodes.get(leaf.index as usize).is_some_and(|node| {
            node.live && node.generation == leaf.generation && node.children().is_none()
        })
    }

    /// The cursor for `leaf`, or `None` if the leaf has been erased.
    pub fn cursor(&self, leaf: Leaf) -> Option<Cursor> {
        self.is_live(leaf).then(|| Cursor {
            sequence: self.id,
            leaf: Some(leaf),
        })
    }

    /// Whether `leaf` still names an element of this sequence.
    pub fn contains(&self, leaf: Leaf) -> bool {
        self.is_live(leaf)
    }

    /// First position; equals [`end`](Self::end) when empty.
    pub fn begin(&self) -> Cursor {
        match self.root {
            Some(root) => self.cursor_at(self.leftmost(root)),
            None => self.end(),
        }
    }

    pub fn end(&self) -> Cursor {
        Cursor {
            sequence: self.id,
            leaf: None,
        }
    }

    /// Last element's position; equals [`end`](Self::end) when empty.
    pub fn last(&self) -> Cursor {
        match self.root {
            Some(root) => self.cursor_at(self.rightmost(root)),
            None => self.end(),
        }
    }

    /// The following position. Saturates at the end.
    pub fn next(&self, cursor: Cursor) -> Cursor {
        self.check(cursor);
        let Some(leaf) = cursor.leaf else {
            return cursor;
        };
        let mut current = leaf.index;
        while let Some(parent) = self.nodes[current as usize].parent {
            let node = &self.nodes[parent as usize];
            if node.left == Some(current) {
                if let Some(right) = node.right {
                    return self.cursor_at(self.leftmost(right));
                }
            }
            current = parent;
        }
        self.end()
    }

    /// The preceding position. Saturates at the first element; the position
    /// before the end is the last element.
    pub fn prev(&self, cursor: Cursor) -> Cursor {
        self.check(cursor);
        let Some(leaf) = cursor.leaf else {
            return self.last();
        };
        let mut current = leaf.index;
        while let Some(parent) = self.nodes[current as usize].parent {
            let node = &self.nodes[parent as usize];
            if node.right == Some(current) {
                if let Some(left) = node.left {
                    return self.cursor_at(self.rightmost(left));
                }
            }
            current = parent;
        }
        cursor
    }

    /// The element at `cursor`, or `None` at the end.
    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        self.check(cursor);
        self.get_leaf(cursor.leaf?)
    }

    /// The element named by `leaf`, or `None` if it has been erased.
    pub fn get_leaf(&self, leaf: Leaf) -> Option<&T> {
        self.is_live(leaf)
            .then(|| &self.nodes[leaf.index as usize].value)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.root.map_or(0, |root| self.leaves(root))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of elements before `cursor`.
    pub fn rank(&self, cursor: Cursor) -> usize {
        self.check(cursor);
        let Some(leaf) = cursor.leaf else {
            return self.len();
        };
        let mut rank = 0;
        let mut current = leaf.index;
        while let Some(parent) = self.nodes[current as usize].parent {
            let node = &self.nodes[parent as usize];
            if node.right == Some(current) {
                if let Some(left) = node.left {
                    rank += self.leaves(left);
                }
            }
            current = parent;
        }
        rank
    }

    /// The position of the element with `rank` elements before it, or the end.
    pub fn nth(&self, mut rank: usize) -> Cursor {
        let Some(mut current) = self.root else {
            return self.end();
        };
        if rank >= self.len() {
            return self.end();
        }
        while let Some((left, right)) = self.nodes[current as usize].children() {
            let split = self.leaves(left);
            if rank < split {
                current = left;
            } else {
                rank -= split;
                current = right;
            }
        }
        self.cursor_at(current)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            sequence: self,
            cursor: self.begin(),
        }
    }

    // === Sums ===

    /// Sum of every element.
    pub fn total(&self) -> T {
        self.root
            .map_or_else(T::identity, |root| self.subtree_sum(root))
    }

    /// Sum of the elements strictly before `cursor`.
    pub fn prefix_sum(&self, cursor: Cursor) -> T {
        self.check(cursor);
        let Some(leaf) = cursor.leaf else {
            return self.total();
        };
        let mut sum = T::identity();
        let mut current = leaf.index;
        while let Some(parent) = self.nodes[current as usize].parent {
            let node = &self.nodes[parent as usize];
            if node.right == Some(current) {
                sum = node.value.combine(&sum);
            }
            current = parent;
        }
        sum
    }

    /// Sum of the elements in `[from, to)`; the identity if `to` does not come
    /// after `from`.
    pub fn sum_over_interval(&self, from: Cursor, to: Cursor) -> T {
        let lo = self.rank(from);
        let hi = self.rank(to);
        match self.root {
            Some(root) if lo < hi => self.range_sum(root, lo, hi),
            _ => T::identity(),
        }
    }

    fn subtree_sum(&self, mut current: u32) -> T {
        let mut sum = T::identity();
        loop {
            let node = &self.nodes[current as usize];
            match node.right {
                Some(right) => {
                    sum = sum.combine(&node.value);
                    current = right;
                }
                None => return sum.combine(&node.value),
            }
        }
    }

    /// Sum over leaf ranks `[lo, hi)` of the subtree at `current`, with
    /// `lo < hi`.
    fn range_sum(&self, current: u32, lo: usize, hi: usize) -> T {
        let node = &self.nodes[current as usize];
        let Some((left, right)) = node.children() else {
            return node.value.clone();
        };
        let split = self.leaves(left);
        if hi <= split {
            return self.range_sum(left, lo, hi);
        }
        if lo >= split {
            return self.range_sum(right, lo - split, hi - split);
        }
        let left_sum = if lo == 0 {
            node.value.clone()
        } else {
            self.range_sum(left, lo, split)
        };
        let right_sum = if hi - split == self.leaves(right) {
            self.subtree_sum(right)
        } else {
            self.range_sum(right, 0, hi - split)
        };
        left_sum.combine(&right_sum)
    }

    // === Edits ===

    /// Insert `value` before `cursor` (at the end if `cursor` is the end) and
    /// return the new element's position.
    pub fn insert(&mut self, cursor: Cursor, value: T) -> Cursor {
        self.check(cursor);
        let delta = T::COMMUTATIVE.then(|| value.clone());
        let leaf = self.allocate(value, 1);
        let Some(root) = self.root else {
            self.root = Some(leaf);
            return self.cursor_at(leaf);
        };
        let (anchor, left, right) = match cursor.leaf {
            Some(anchor) => (anchor.index, leaf, anchor.index),
            None => {
                let anchor = self.rightmost(root);
                (anchor, anchor, leaf)
            }
        };
        let parent = self.nodes[anchor as usize].parent;
        let left_value = self.nodes[left as usize].value.clone();
        let joint = self.allocate(left_value, 3);
        {
            let node = &mut self.nodes[joint as usize];
            node.left = Some(left);
            node.right = Some(right);
        }
        self.nodes[left as usize].parent = Some(joint);
        self.nodes[right as usize].parent = Some(joint);
        self.replace_child(parent, anchor, joint);
        self.retrace(parent, joint, delta.as_ref());
        self.cursor_at(leaf)
    }

    /// Erase the element at `cursor` and return the following position.
    /// Erasing at the end does nothing.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        self.check(cursor);
        let Some(leaf) = cursor.leaf else {
            return cursor;
        };
        let following = self.next(cursor);
        let target = leaf.index;
        match self.nodes[target as usize].parent {
            None => {
                self.root = None;
                self.release(target);
            }
            Some(parent) => {
                let node = &self.nodes[parent as usize];
                let sibling = if node.left == Some(target) {
                    node.right
                } else {
                    node.left
                };
                let grandparent = node.parent;
                if let Some(sibling) = sibling {
                    self.replace_child(grandparent, parent, sibling);
                    self.release(target);
                    self.release(parent);
                    self.retrace(grandparent, sibling, None);
                }
            }
        }
        following
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    fn allocate(&mut self, value: T, size: u32) -> u32 {
        match self.free.pop() {
            Some(index) => {
                let node = &mut self.nodes[index as usize];
                node.value = value;
                node.parent = None;
                node.left = None;
                node.right = None;
                node.size = size;
                node.live = true;
                index
            }
            None => {
                let index = u32::try_from(self.nodes.len())
                    .unwrap_or_else(|_| panic!("sequence exceeded {} vertices", u32::MAX));
                self.nodes.push(Node {
                    value,
                    parent: None,
                    left: None,
                    right: None,
                    size,
                    generation: 0,
                    live: true,
                });
                index
            }
        }
    }

    fn release(&mut self, index: u32) {
        let node = &mut self.nodes[index as usize];
        node.value = T::identity();
        node.parent = None;
        node.left = None;
        node.right = None;
        node.size = 0;
        node.live = false;
        node.generation = node.generation.wrapping_add(1);
        self.free.push(index);
    }

    /// Point `parent`'s link to `old` (or the root, if `parent` is `None`) at
    /// `new`.
    fn replace_child(&mut self, parent: Option<u32>, old: u32, new: u32) {
        self.nodes[new as usize].parent = parent;
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                let node = &mut self.nodes[parent as usize];
                if node.left == Some(old) {
                    node.left = Some(new);
                } else {
                    debug_assert_eq!(node.right, Some(old));
                    node.right = Some(new);
                }
            }
        }
    }

    /// Restore sizes, caches and balance from `from` up to the root after the
    /// subtree now rooted at `child` changed. `delta` is the inserted element
    /// when the caches can absorb it directly.
    fn retrace(&mut self, from: Option<u32>, mut child: u32, delta: Option<&T>) {
        let mut current = from;
        while let Some(index) = current {
            let Some((left, right)) = self.nodes[index as usize].children() else {
                return;
            };
            let size = 1 + self.nodes[left as usize].size + self.nodes[right as usize].size;
            let value = if left == child {
                Some(match delta {
                    Some(delta) => self.nodes[index as usize].value.combine(delta),
                    None => self.subtree_sum(left),
                })
            } else {
                None
            };
            let node = &mut self.nodes[index as usize];
            node.size = size;
            if let Some(value) = value {
                node.value = value;
            }
            child = self.rebalance(index);
            current = self.nodes[child as usize].parent;
        }
    }

    fn rebalance(&mut self, index: u32) -> u32 {
        let Some((left, right)) = self.nodes[index as usize].children() else {
            return index;
        };
        let (left_weight, right_weight) = (self.leaves(left), self.leaves(right));
        if left_weight > DELTA * right_weight {
            if let Some((outer, inner)) = self.nodes[left as usize].children() {
                if self.leaves(inner) >= GAMMA * self.leaves(outer) {
                    self.rotate_left(left);
                }
                return self.rotate_right(index);
            }
        } else if right_weight > DELTA * left_weight {
            if let Some((inner, outer)) = self.nodes[right as usize].children() {
                if self.leaves(inner) >= GAMMA * self.leaves(outer) {
                    self.rotate_right(right);
                }
                return self.rotate_left(index);
            }
        }
        index
    }

    /// Lift the left child of `index` into its place.
    fn rotate_right(&mut self, index: u32) -> u32 {
        let node = &self.nodes[index as usize];
        let (Some(pivot), Some(right), parent) = (node.left, node.right, node.parent) else {
            return index;
        };
        let Some((outer, inner)) = self.nodes[pivot as usize].children() else {
            return index;
        };
        let inner_sum = self.subtree_sum(inner);
        let demoted_size = 1 + self.nodes[inner as usize].size + self.nodes[right as usize].size;
        {
            let node = &mut self.nodes[index as usize];
            node.left = Some(inner);
            node.value = inner_sum;
            node.size = demoted_size;
        }
        self.nodes[inner as usize].parent = Some(index);
        let lifted_size = 1 + self.nodes[outer as usize].size + demoted_size;
        {
            let node = &mut self.nodes[pivot as usize];
            node.right = Some(index);
            node.size = lifted_size;
        }
        self.replace_child(parent, index, pivot);
        self.nodes[index as usize].parent = Some(pivot);
        pivot
    }

    /// Lift the right child of `index` into its place.
    fn rotate_left(&mut self, index: u32) -> u32 {
        let node = &self.nodes[index as usize];
        let (Some(left), Some(pivot), parent) = (node.left, node.right, node.parent) else {
            return index;
        };
        let Some((inner, outer)) = self.nodes[pivot as usize].children() else {
            return index;
        };
        let demoted_size = 1 + self.nodes[left as usize].size + self.nodes[inner as usize].size;
        {
            let node = &mut self.nodes[index as usize];
            node.right = Some(inner);
            node.size = demoted_size;
        }
        self.nodes[inner as usize].parent = Some(index);
        let lifted_value = self.nodes[index as usize]
            .value
            .combine(&self.nodes[pivot as usize].value);
        let lifted_size = 1 + demoted_size + self.nodes[outer as usize].size;
        {
            let node = &mut self.nodes[pivot as usize];
            node.left = Some(index);
            node.value = lifted_value;
            node.size = lifted_size;
        }
        self.replace_child(parent, index, pivot);
        self.nodes[index as usize].parent = Some(pivot);
        pivot
    }

    // === Shape ===

    #[inline]
    fn leaves(&self, index: u32) -> usize {
        (self.nodes[index as usize].size as usize + 1) / 2
    }

    fn leftmost(&self, mut index: u32) -> u32 {
        while let Some(left) = self.nodes[index as usize].left {
            index = left;
        }
        index
    }

    fn rightmost(&self, mut index: u32) -> u32 {
        while let Some(right) = self.nodes[index as usize].right {
            index = right;
        }
        index
    }

    #[cfg(test)]
    fn height(&self) -> usize {
        fn walk<T>(nodes: &[Node<T>], index: u32) -> usize {
            match nodes[index as usize].children() {
                Some((left, right)) => 1 + walk(nodes, left).max(walk(nodes, right)),
                None => 1,
            }
        }
        self.root.map_or(0, |root| walk(&self.nodes, root))
    }

    /// The first internal vertex whose sides break the `DELTA` ratio, as its
    /// left and right leaf counts.
    #[cfg(test)]
    fn imbalance(&self) -> Option<(usize, usize)> {
        self.nodes
            .iter()
            .filter(|node| node.live)
            .filter_map(Node::children)
            .map(|(left, right)| (self.leaves(left), self.leaves(right)))
            .find(|&(left, right)| left > DELTA * right || right > DELTA * left)
    }
}

impl<T: MonoidOrd> MonoidSequence<T> {
    /// The leftmost position whose inclusive running sum strictly exceeds
    /// `target`, or the end if there is none.
    pub fn find(&self, target: &T) -> Cursor {
        let Some(mut current) = self.root else {
            return self.end();
        };
        let mut sum = T::identity();
        loop {
            let node = &self.nodes[current as usize];
            let through = sum.combine(&node.value);
            match node.children() {
                Some((left, right)) => {
                    if target.precedes(&through) {
                        current = left;
                    } else {
                        sum = through;
                        current = right;
                    }
                }
                None => {
                    return if target.precedes(&through) {
                        self.cursor_at(current)
                    } else {
                        self.end()
                    };
                }
            }
        }
    }
}

impl<T: Monoid> Default for MonoidSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Monoid + fmt::Debug> fmt::Debug for MonoidSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, value)| value)).finish()
    }
}

/// In-order iterator over `(position, element)` pairs.
pub struct Iter<'a, T> {
    sequence: &'a MonoidSequence<T>,
    cursor: Cursor,
}

impl<'a, T: Monoid> Iterator for Iter<'a, T> {
    type Item = (Cursor, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor;
        let value = self.sequence.get(cursor)?;
        self.cursor = self.sequence.next(cursor);
        Some((cursor, value))
    }
}

#[cfg(test)]
mod tests;
