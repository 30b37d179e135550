use std::{fmt, ptr::NonNull};

use cordyceps::Linked;
use cordyceps_avl::{AvlMap, AvlTree, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
struct Node {
    links: Links<Node>,
    key: u32,
}

impl Node {
    fn new(key: u32) -> Box<Node> {
        Box::new(Node {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<Node>> for Node {
    type Handle = Box<Node>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Node>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<Node>> for Node {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

struct Label(u32);

impl From<&u32> for Label {
    fn from(key: &u32) -> Self {
        Label(*key)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn print_keys(tree: &AvlTree<Node>) {
    println!(
        "{:?} (height {})",
        tree.iter().map(|node| node.key).collect::<Vec<_>>(),
        tree.height()
    );
}

fn main() -> fmt::Result {
    let mut tree: AvlTree<Node> = AvlTree::new();

    for key in 1..=7 {
        tree.insert(Node::new(key));
        tree.assert_invariants();
        print_keys(&tree);
    }

    let mut graph = String::new();
    tree.dotgraph::<_, Label>("ascending", &mut graph)?;
    println!("{graph}");
    println!("uniform leaf depth: {}", tree.has_uniform_leaf_depth());

    tree.remove(&4);
    tree.assert_invariants();
    print_keys(&tree);

    let first = tree.pop_first().map(|node| node.key);
    assert_eq!(first, Some(1));
    tree.assert_invariants();
    print_keys(&tree);

    let map: AvlMap<&str, usize> = ["walnut", "acorn", "chestnut", "hazel"]
        .into_iter()
        .map(|name| (name, name.len()))
        .collect();
    println!("{map:?}");

    Ok(())
}
