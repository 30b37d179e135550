use core::ptr::NonNull;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Rotates the subtree rooted at `x` to the left and returns its new root, `x`'s former right
    // child `y`.
    //
    //       x                 y
    //      / \               / \
    //     a   y      =>     x   c
    //        / \           / \
    //       b   c         a   b
    //
    // Only `b(x)` and `b(y)` change, and they are derived from their old values alone:
    //
    //   b'(x) = b(x) + 1 - min(b(y), 0)
    //   b'(y) = b(y) + 1 + max(b'(x), 0)
    pub(crate) unsafe fn rotate_left(&mut self, x: NonNull<T>) -> NonNull<T> {
        unsafe {
            let y = self
                .links(x)
                .right()
                .expect("left rotation requires a right child");

            tracing::trace!(pivot = ?x.as_ref().key(), "rotating left");
            self.rotate_at(x, y, Dir::Left);

            let y_balance = self.links(y).balance();
            let x_balance = self.links(x).balance() + 1 - y_balance.min(0);
            self.links_mut(x).set_balance(x_balance);
            self.links_mut(y).set_balance(y_balance + 1 + x_balance.max(0));

            y
        }
    }

    // Rotates the subtree rooted at `y` to the right and returns its new root, `y`'s former left
    // child `x`. This is the mirror image of `rotate_left`:
    //
    //   b'(y) = b(y) - 1 - max(b(x), 0)
    //   b'(x) = b(x) - 1 + min(b'(y), 0)
    pub(crate) unsafe fn rotate_right(&mut self, y: NonNull<T>) -> NonNull<T> {
        unsafe {
            let x = self
                .links(y)
                .left()
                .expect("right rotation requires a left child");

            tracing::trace!(pivot = ?y.as_ref().key(), "rotating right");
            self.rotate_at(y, x, Dir::Right);

            let x_balance = self.links(x).balance();
            let y_balance = self.links(y).balance() - 1 - x_balance.max(0);
            self.links_mut(y).set_balance(y_balance);
            self.links_mut(x).set_balance(x_balance - 1 + y_balance.min(0));

            x
        }
    }

    // Performs a rotation, moving `up` up and its parent `down` down, so that `down` becomes the
    // `dir` child of `up`.
    //
    // The balance factors of affected nodes are not updated.
    unsafe fn rotate_at(&mut self, down: NonNull<T>, up: NonNull<T>, dir: Dir) {
        unsafe {
            // `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let across = self.links(up).child(dir);
            self.links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            self.links_mut(up).set_child(dir, Some(down));
            let parent = self.links_mut(down).set_parent(Some(up));
            self.links_mut(up).set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));
        }
    }

    // Restores the balance of `node`, whose balance factor must be 2 or -2, and returns the new
    // root of its subtree.
    //
    // If the heavy child leans the other way (a zigzag), it is first rotated so that the heavy
    // path is straight; a single rotation at `node` then balances the subtree.
    pub(crate) unsafe fn rebalance(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let balance = self.links(node).balance();
            tracing::trace!(key = ?node.as_ref().key(), balance, "rebalancing");

            match balance {
                2 => {
                    let left = self
                        .links(node)
                        .left()
                        .expect("left-heavy node must have a left child");

                    if self.links(left).balance() < 0 {
                        self.rotate_left(left);
                    }

                    self.rotate_right(node)
                }

                -2 => {
                    let right = self
                        .links(node)
                        .right()
                        .expect("right-heavy node must have a right child");

                    if self.links(right).balance() > 0 {
                        self.rotate_right(right);
                    }

                    self.rotate_left(node)
                }

                _ => unreachable!(
                    "rebalance of {:?} with balance factor {balance}",
                    node.as_ref().key()
                ),
            }
        }
    }
}
