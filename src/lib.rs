//! An order-statistics AVL tree.
//!
//! Every node caches the height and the size of the subtree rooted at it. Heights keep the tree
//! balanced after every mutation; sizes let [`AvlTree::select`] find the `k`-th smallest key by
//! visiting a single node per level.

// Conventions used in comments:
// - The height `h(x)` of an absent subtree is 0; a leaf has height 1.
// - The count `c(x)` of a node is the number of nodes in the subtree rooted at `x`.
// - The balance of a node `x` is `h(right(x)) - h(left(x))`.
// - A node is `d`-heavy if its `d` child is strictly taller than its `!d` child.
//
// The invariants of the tree, restored before every public method returns:
// 1. The in-order key sequence is non-decreasing under the comparator. Equal keys are inserted to
//    the right, but rotations may later move one to the left of another.
// 2. Every node has balance -1, 0 or 1.
// 3. `c(x) = 1 + c(left(x)) + c(right(x))` and `h(x) = 1 + max(h(left(x)), h(right(x)))`.
//
// Corollary: a single insertion or removal changes the height of any subtree by at most one, so
// `rebalance` only ever sees balances in -2..=2.

use core::{cmp::Ordering, fmt, mem, ops::Not};

mod debug;
pub mod error;
pub mod harness;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
#[cfg(test)]
mod tests;

pub use error::{HarnessError, SelectError};
pub use iter::{Iter, PostOrder};

/// The comparator used by [`AvlTree::new`].
pub type DefaultComparator<K> = fn(&K, &K) -> Ordering;

/// An AVL tree augmented with subtree sizes.
///
/// Keys are ordered by a comparator supplied once at construction. The comparator must define a
/// total order; if it does not, the tree stays memory safe but lookups may give wrong answers.
///
/// Duplicate keys are allowed: inserting a key that compares equal to a stored key adds a second
/// occurrence.
pub struct AvlTree<K, C = DefaultComparator<K>>
where
    C: Fn(&K, &K) -> Ordering,
{
    root: Link<K>,
    cmp: C,
}

struct Node<K> {
    key: K,
    height: u8,
    count: usize,
    children: [Link<K>; 2],
}

type Link<K> = Option<Box<Node<K>>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

impl<K: Ord> AvlTree<K> {
    /// Returns a new empty tree ordered by [`Ord`].
    pub fn new() -> AvlTree<K> {
        AvlTree::with_comparator(<K as Ord>::cmp as DefaultComparator<K>)
    }
}

impl<K: Ord> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    /// Returns a new empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> AvlTree<K, C> {
        AvlTree { root: None, cmp }
    }

    /// Returns `true` if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree, counting duplicates.
    pub fn len(&self) -> usize {
        Node::count_of(self.root.as_deref())
    }

    /// Returns the height of the tree. An empty tree has height 0.
    pub fn height(&self) -> usize {
        Node::height_of(self.root.as_deref()).into()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Some(root) = self.root.as_deref() {
            self.assert_invariants_at(root);
        }

        let mut prev: Option<&K> = None;
        for key in self.iter() {
            if let Some(prev) = prev {
                assert_ne!(
                    (self.cmp)(prev, key),
                    Ordering::Greater,
                    "in-order keys must be non-decreasing"
                );
            }
            prev = Some(key);
        }
    }

    fn assert_invariants_at(&self, node: &Node<K>) {
        for dir in [Dir::Left, Dir::Right] {
            if let Some(child) = node.child(dir) {
                let ordering = (self.cmp)(&child.key, &node.key);
                match dir {
                    Dir::Left => assert_ne!(ordering, Ordering::Greater, "left child too large"),
                    Dir::Right => assert_ne!(ordering, Ordering::Less, "right child too small"),
                }

                self.assert_invariants_at(child);
            }
        }

        let left_height = Node::height_of(node.left());
        let right_height = Node::height_of(node.right());
        assert_eq!(node.height, 1 + left_height.max(right_height), "stale height");
        assert!((-1..=1).contains(&node.balance()), "unbalanced node");

        let count = 1 + Node::count_of(node.left()) + Node::count_of(node.right());
        assert_eq!(node.count, count, "stale count");
    }

    /// Returns `true` if the tree contains a key equal to `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn contains(&self, key: &K) -> bool {
        let mut opt_cur = self.root.as_deref();

        while let Some(cur) = opt_cur {
            opt_cur = match (self.cmp)(key, &cur.key) {
                Ordering::Less => cur.left(),
                Ordering::Equal => return true,
                Ordering::Greater => cur.right(),
            };
        }

        false
    }

    /// Returns the key at zero-based position `rank` in sorted order.
    ///
    /// Returns [`SelectError::OutOfRange`] if `rank >= self.len()`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn select(&self, rank: usize) -> Result<&K, SelectError> {
        let len = self.len();
        if rank >= len {
            return Err(SelectError::OutOfRange { rank, len });
        }

        let mut k = rank;
        let mut opt_cur = self.root.as_deref();

        while let Some(cur) = opt_cur {
            let left_count = Node::count_of(cur.left());

            match k.cmp(&left_count) {
                Ordering::Less => opt_cur = cur.left(),
                Ordering::Equal => return Ok(&cur.key),
                Ordering::Greater => {
                    k -= left_count + 1;
                    opt_cur = cur.right();
                }
            }
        }

        // Unreachable while the counts are consistent.
        Err(SelectError::OutOfRange { rank, len })
    }

    /// Returns the zero-based rank of the first occurrence of `key`, or `None` if the tree does not
    /// contain it.
    ///
    /// This is the inverse of [`select`](Self::select): if `rank_of(k) == Some(r)` then
    /// `select(r)` is equal to `k`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn rank_of(&self, key: &K) -> Option<usize> {
        let mut preceding = 0;
        let mut found = None;
        let mut opt_cur = self.root.as_deref();

        while let Some(cur) = opt_cur {
            let left_count = Node::count_of(cur.left());

            match (self.cmp)(key, &cur.key) {
                Ordering::Less => opt_cur = cur.left(),
                Ordering::Equal => {
                    // Earlier occurrences can only be in the left subtree.
                    found = Some(preceding + left_count);
                    opt_cur = cur.left();
                }
                Ordering::Greater => {
                    preceding += left_count + 1;
                    opt_cur = cur.right();
                }
            }
        }

        found
    }

    /// Returns the minimum key of the tree.
    pub fn first(&self) -> Option<&K> {
        self.extreme(Dir::Left)
    }

    /// Returns the maximum key of the tree.
    pub fn last(&self) -> Option<&K> {
        self.extreme(Dir::Right)
    }

    fn extreme(&self, dir: Dir) -> Option<&K> {
        let mut cur = self.root.as_deref()?;

        while let Some(child) = cur.child(dir) {
            cur = child;
        }

        Some(&cur.key)
    }

    /// Inserts a key into the tree.
    ///
    /// If the tree already contains keys equal to `key`, another occurrence is added.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K) {
        let root = self.root.take();
        self.root = Some(insert_at(root, key, &self.cmp));

        tracing::trace!(len = self.len(), "inserted key");
    }

    /// Removes one occurrence of `key` from the tree and returns it.
    ///
    /// Returns `None`, leaving the tree unchanged, if the tree does not contain `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove(&mut self, key: &K) -> Option<K> {
        let root = self.root.take();
        let (root, removed) = remove_at(root, key, &self.cmp);
        self.root = root;

        if removed.is_some() {
            tracing::trace!(len = self.len(), "removed key");
        }

        removed
    }

    /// Removes and returns the minimum key of the tree.
    pub fn pop_first(&mut self) -> Option<K> {
        self.pop_extreme(Dir::Left)
    }

    /// Removes and returns the maximum key of the tree.
    pub fn pop_last(&mut self) -> Option<K> {
        self.pop_extreme(Dir::Right)
    }

    fn pop_extreme(&mut self, dir: Dir) -> Option<K> {
        let root = self.root.take()?;
        let (extreme, rest) = remove_extreme(root, dir);
        self.root = rest;

        Some(extreme.key)
    }

    /// Clears the tree, removing all keys.
    pub fn clear(&mut self) {
        // Detach children before releasing a node so dropping never recurses.
        let mut stack: Vec<Box<Node<K>>> = self.root.take().into_iter().collect();

        while let Some(mut node) = stack.pop() {
            stack.extend(node.take_child(Dir::Left));
            stack.extend(node.take_child(Dir::Right));
        }

        debug_assert!(self.is_empty());
    }

    /// Returns an iterator over the keys of the tree in sorted order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self.root.as_deref())
    }

    /// Returns an iterator over the keys of the tree in post-order: both subtrees of a node are
    /// visited before the node itself.
    pub fn post_order(&self) -> PostOrder<'_, K> {
        PostOrder::new(self.root.as_deref())
    }
}

impl<K, C> Drop for AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: fmt::Debug, C> fmt::Debug for AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C> Extend<K> for AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'tree, K, C> IntoIterator for &'tree AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    type Item = &'tree K;
    type IntoIter = Iter<'tree, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Mutation ===================================================================
//
// Each of these consumes a subtree and returns the subtree that should take its place in the
// parent, so the path back to the root is the call stack.

fn insert_at<K, C>(link: Link<K>, key: K, cmp: &C) -> Box<Node<K>>
where
    C: Fn(&K, &K) -> Ordering,
{
    let Some(mut node) = link else {
        return Node::leaf(key);
    };

    let dir = match cmp(&key, &node.key) {
        Ordering::Less => Dir::Left,
        Ordering::Equal | Ordering::Greater => Dir::Right,
    };

    let child = node.take_child(dir);
    node.set_child(dir, Some(insert_at(child, key, cmp)));

    rebalance(node)
}

// Returns the replacement subtree and the removed key, if any.
fn remove_at<K, C>(link: Link<K>, key: &K, cmp: &C) -> (Link<K>, Option<K>)
where
    C: Fn(&K, &K) -> Ordering,
{
    let Some(mut node) = link else {
        return (None, None);
    };

    let dir = match cmp(key, &node.key) {
        Ordering::Less => Dir::Left,
        Ordering::Greater => Dir::Right,
        Ordering::Equal => {
            let Node {
                key: found,
                children: [left, right],
                ..
            } = *node;

            return (splice(left, right), Some(found));
        }
    };

    let child = node.take_child(dir);
    let (child, removed) = remove_at(child, key, cmp);
    node.set_child(dir, child);

    (Some(rebalance(node)), removed)
}

// Joins the subtrees of a removed node. If both are present, the in-order successor (the minimum
// of `right`) is detached and takes the removed node's place.
fn splice<K>(left: Link<K>, right: Link<K>) -> Link<K> {
    let Some(right) = right else {
        return left;
    };

    let Some(left) = left else {
        return Some(right);
    };

    let (mut successor, rest) = remove_extreme(right, Dir::Left);
    successor.set_child(Dir::Left, Some(left));
    successor.set_child(Dir::Right, rest);

    Some(rebalance(successor))
}

// Detaches the furthest node in direction `dir` (the minimum for `Dir::Left`).
//
// Returns the detached node, whose links are cleared but whose height and count are stale, and
// the rebalanced remainder of the subtree.
fn remove_extreme<K>(mut node: Box<Node<K>>, dir: Dir) -> (Box<Node<K>>, Link<K>) {
    match node.take_child(dir) {
        None => {
            let rest = node.take_child(!dir);
            (node, rest)
        }

        Some(child) => {
            let (extreme, rest) = remove_extreme(child, dir);
            node.set_child(dir, rest);
            (extreme, Some(rebalance(node)))
        }
    }
}

// Rebalancing ================================================================

// Restores the height, count and balance of `node`, whose subtrees are valid and differ in height
// by at most two. Returns the node that takes its place.
fn rebalance<K>(mut node: Box<Node<K>>) -> Box<Node<K>> {
    node.update();

    let heavy = match node.balance() {
        2 => Dir::Right,
        -2 => Dir::Left,
        balance => {
            debug_assert!((-1..=1).contains(&balance));
            return node;
        }
    };

    if let Some(child) = node.take_child(heavy) {
        // A child leaning away from its parent is first rotated to lean the same way.
        let child = if child.is_heavy(!heavy) {
            tracing::trace!(?heavy, "double rotation");
            rotate(child, heavy)
        } else {
            child
        };

        node.set_child(heavy, Some(child));
    }

    rotate(node, !heavy)
}

// Performs a rotation, moving `down` down in direction `dir` and its `!dir` child up in its place.
//
// Only `down` and the raised node have their height and count recomputed.
fn rotate<K>(mut down: Box<Node<K>>, dir: Dir) -> Box<Node<K>> {
    let Some(mut up) = down.take_child(!dir) else {
        return down;
    };

    // `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
    let across = up.take_child(dir);
    down.set_child(!dir, across);
    down.update();

    up.set_child(dir, Some(down));
    up.update();

    tracing::trace!(?dir, height = up.height, count = up.count, "rotated subtree");

    up
}

// Support methods ============================================================

impl<K> Node<K> {
    fn leaf(key: K) -> Box<Node<K>> {
        Box::new(Node {
            key,
            height: 1,
            count: 1,
            children: [None, None],
        })
    }

    #[inline]
    fn height_of(node: Option<&Node<K>>) -> u8 {
        node.map_or(0, |n| n.height)
    }

    #[inline]
    fn count_of(node: Option<&Node<K>>) -> usize {
        node.map_or(0, |n| n.count)
    }

    #[inline]
    fn child(&self, dir: Dir) -> Option<&Node<K>> {
        self.children[dir as usize].as_deref()
    }

    #[inline]
    fn left(&self) -> Option<&Node<K>> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Option<&Node<K>> {
        self.child(Dir::Right)
    }

    #[inline]
    fn take_child(&mut self, dir: Dir) -> Link<K> {
        self.children[dir as usize].take()
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<K>) -> Link<K> {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    fn balance(&self) -> i16 {
        i16::from(Self::height_of(self.right())) - i16::from(Self::height_of(self.left()))
    }

    #[inline]
    fn is_heavy(&self, dir: Dir) -> bool {
        Self::height_of(self.child(dir)) > Self::height_of(self.child(!dir))
    }

    fn update(&mut self) {
        let (left, right) = (self.left(), self.right());
        let height = 1 + Self::height_of(left).max(Self::height_of(right));
        let count = 1 + Self::count_of(left) + Self::count_of(right);

        self.height = height;
        self.count = count;
    }
}
