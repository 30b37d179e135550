extern crate std;

use core::ptr::NonNull;
use std::{collections::VecDeque, fmt, prelude::v1::*};

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>>,
{
    /// Writes the tree in Graphviz `dot` format, one rank per tree level.
    ///
    /// Nodes are labelled `key:balance`.
    pub fn dotgraph<'a, W, K>(&'a self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display + From<&'a T::Key>,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: TreeNode<Links<T>>> {
            Node(NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key: K = unsafe { node.as_ref().key().into() };
                let balance = unsafe { self.links(node).balance() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                for dir in [Dir::Left, Dir::Right] {
                    let target = match unsafe { self.links(node).child(dir) } {
                        Some(child) => {
                            queue.push_back(Item::Node(child));
                            let child_key: K = unsafe { child.as_ref().key().into() };
                            format!("{child_key}")
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            missing += 1;
                            format!("missing{}", missing - 1)
                        }
                    };

                    writeln!(edges, "\"graph{name}-{key}\" -> \"graph{name}-{target}\";")?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }

    /// Returns `true` if every leaf of the tree lies at the same depth.
    ///
    /// An empty tree trivially satisfies this. A node with a single child is not a leaf, and its
    /// missing child does not count as one.
    pub fn has_uniform_leaf_depth(&self) -> bool {
        let mut leaf_depth = None;

        match self.root {
            Some(root) => unsafe { self.leaf_depths_match(root, 0, &mut leaf_depth) },
            None => true,
        }
    }

    // `leaf_depth` records the depth of the first leaf found.
    unsafe fn leaf_depths_match(
        &self,
        node: NonNull<T>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> bool {
        let links = unsafe { self.links(node) };

        if links.is_leaf() {
            return *leaf_depth.get_or_insert(depth) == depth;
        }

        let mut matches = true;
        for child in [links.left(), links.right()].into_iter().flatten() {
            matches &= unsafe { self.leaf_depths_match(child, depth + 1, leaf_depth) };
        }

        matches
    }
}
