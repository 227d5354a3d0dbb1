use core::iter::FusedIterator;

use crate::{Dir, Node};

/// An iterator over the keys of an [`AvlTree`](crate::AvlTree) in sorted order.
pub struct Iter<'tree, K> {
    // The nodes whose left subtrees have been entered but which have not been yielded yet.
    stack: Vec<&'tree Node<K>>,
    len: usize,
}

impl<'tree, K> Iter<'tree, K> {
    pub(crate) fn new(root: Option<&'tree Node<K>>) -> Self {
        let mut iter = Iter {
            stack: Vec::new(),
            len: Node::count_of(root),
        };

        iter.descend(root);
        iter
    }

    // Upon entering a new subtree, push its left spine so the minimum is on top.
    fn descend(&mut self, mut opt_cur: Option<&'tree Node<K>>) {
        while let Some(cur) = opt_cur {
            self.stack.push(cur);
            opt_cur = cur.child(Dir::Left);
        }
    }
}

impl<'tree, K> Iterator for Iter<'tree, K> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.stack.pop()?;

        // The left subtree of `cur` has been exhausted, so its successor is the minimum of its
        // right subtree, or else the node below it on the stack.
        self.descend(cur.child(Dir::Right));
        self.len -= 1;

        Some(&cur.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

/// An iterator over the keys of an [`AvlTree`](crate::AvlTree) in post-order.
pub struct PostOrder<'tree, K> {
    // Each node is pushed twice: once to schedule its children, then once more to be yielded.
    stack: Vec<(&'tree Node<K>, bool)>,
    len: usize,
}

impl<'tree, K> PostOrder<'tree, K> {
    pub(crate) fn new(root: Option<&'tree Node<K>>) -> Self {
        PostOrder {
            stack: root.map(|r| (r, false)).into_iter().collect(),
            len: Node::count_of(root),
        }
    }
}

impl<'tree, K> Iterator for PostOrder<'tree, K> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (cur, expanded) = self.stack.pop()?;

            if expanded {
                self.len -= 1;
                return Some(&cur.key);
            }

            self.stack.push((cur, true));
            for dir in [Dir::Right, Dir::Left] {
                if let Some(child) = cur.child(dir) {
                    self.stack.push((child, false));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K> ExactSizeIterator for PostOrder<'_, K> {}

impl<K> FusedIterator for PostOrder<'_, K> {}
