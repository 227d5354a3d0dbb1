use core::{cmp::Ordering, fmt};
use std::collections::VecDeque;

use crate::{AvlTree, Dir, Node};

impl<K, C> AvlTree<K, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    /// Writes the shape of the tree as a Graphviz `digraph`, one rank per tree level.
    ///
    /// Each node is labelled `key:height/count`. Missing children are drawn as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        let root = match self.root.as_deref() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        // Keys may repeat, so nodes are identified by the order in which they are queued.
        enum Item<'a, K> {
            Node(usize, &'a Node<K>),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(0, root));
        let mut next_id = 1;

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let (id, node) = match queue.pop_front() {
                    Some(Item::Node(id, node)) => (id, node),
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                write!(
                    w,
                    "\"graph{name}-{id}\" [label=\"{}:{}/{}\"]; ",
                    node.key, node.height, node.count
                )?;

                for dir in [Dir::Left, Dir::Right] {
                    let child_id = next_id;
                    next_id += 1;

                    match node.child(dir) {
                        Some(child) => queue.push_back(Item::Node(child_id, child)),
                        None => queue.push_back(Item::Missing(child_id)),
                    }

                    writeln!(links, "\"graph{name}-{id}\" -> \"graph{name}-{child_id}\";")?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
