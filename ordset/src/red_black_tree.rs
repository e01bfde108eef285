use core::fmt;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    fn is_black(self) -> bool {
        matches!(self, Self::Black)
    }
}

/// Color of an optional link.
///
/// The absent-child-counts-as-Black rule lives here and only here.
unsafe fn color_of<K>(link: Option<NodeRef<K>>) -> Color {
    link.map_or(Color::Black, |node| unsafe { node.color() })
}

struct Node<K> {
    // key is uninit only for the sentinel used by the delete routine,
    // every node reachable from the root holds a valid key
    key: MaybeUninit<K>,
    color: Color,
    parent: Option<NodeRef<K>>,
    left: Option<NodeRef<K>>,
    right: Option<NodeRef<K>>,
}

/// Copyable wrapper around `NonNull<Node<K>>` so that the rotation and
/// fixup code reads like the algorithm instead of raw pointer plumbing.
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
struct NodeRef<K> {
    ptr: NonNull<Node<K>>,
}

impl<K> Clone for NodeRef<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<K> {}

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Root,
    Left,
    Right,
}

impl<K> NodeRef<K> {
    fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
        }
    }

    fn from_node(node: Node<K>) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(node))) },
        }
    }

    #[inline]
    fn as_ptr(self) -> *mut Node<K> {
        self.ptr.as_ptr()
    }

    /// Pointer identity, not key equality.
    #[inline]
    fn is(self, other: NodeRef<K>) -> bool {
        ptr::eq(self.as_ptr(), other.as_ptr())
    }

    #[inline]
    unsafe fn key<'a>(self) -> &'a K {
        unsafe { (*self.as_ptr()).key.assume_init_ref() }
    }

    #[inline]
    unsafe fn color(self) -> Color {
        unsafe { (*self.as_ptr()).color }
    }

    #[inline]
    unsafe fn set_color(self, color: Color) {
        unsafe { (*self.as_ptr()).color = color }
    }

    #[inline]
    unsafe fn parent(self) -> Option<NodeRef<K>> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    unsafe fn set_parent(self, parent: Option<NodeRef<K>>) {
        unsafe { (*self.as_ptr()).parent = parent }
    }

    #[inline]
    unsafe fn left(self) -> Option<NodeRef<K>> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    unsafe fn set_left(self, left: Option<NodeRef<K>>) {
        unsafe { (*self.as_ptr()).left = left }
    }

    #[inline]
    unsafe fn right(self) -> Option<NodeRef<K>> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    unsafe fn set_right(self, right: Option<NodeRef<K>>) {
        unsafe { (*self.as_ptr()).right = right }
    }

    /// Which child slot of its parent this node occupies.
    ///
    /// The sentinel is never written into a child slot, so for the
    /// sentinel the answer names the slot the parent still has occupied,
    /// not the hole; `delete_fixup` accounts for that inversion.
    #[inline]
    unsafe fn branch(self) -> Branch {
        match unsafe { self.parent() } {
            None => Branch::Root,
            Some(parent) => match unsafe { (parent.left(), parent.right()) } {
                (None, None) => unreachable!(),
                (None, Some(_)) => Branch::Right,
                (Some(_), None) => Branch::Left,
                (Some(left), Some(right)) => {
                    if self.is(left) {
                        Branch::Left
                    } else {
                        debug_assert!(self.is(right));
                        Branch::Right
                    }
                }
            },
        }
    }
}

/// An ordered set of keys backed by a red-black tree.
///
/// Keys are kept in strictly ascending order; lookup, insertion and
/// deletion are O(log n) worst case. Duplicate keys are rejected, see
/// [`insert`](Self::insert).
///
/// The tree has no internal synchronization and holds raw pointers, so it
/// is neither `Send` nor `Sync`; callers confine an instance to one thread
/// or serialize access externally.
pub struct RedBlackTree<K> {
    // INVARIANTS:
    //  * if `len > 0` then `root` is a valid pointer to a `Node`
    //  * `sentinel` is always a valid pointer, its key stays uninit
    root: NodeRef<K>,
    len: usize,
    // Shared stand-in for the child slot vacated by a delete, so that
    // delete_fixup always has a parented node to start from.
    sentinel: NodeRef<K>,
    marker: PhantomData<Box<Node<K>>>,
}

impl<K> Drop for RedBlackTree<K> {
    fn drop(&mut self) {
        // Keys live behind `MaybeUninit`, so each reachable node is freed
        // explicitly, dropping its key along the way.
        unsafe fn free_subtree<K>(node: NodeRef<K>) {
            unsafe {
                if let Some(left) = node.left() {
                    free_subtree(left);
                }
                if let Some(right) = node.right() {
                    free_subtree(right);
                }
                let mut boxed = Box::from_raw(node.as_ptr());
                boxed.key.assume_init_drop();
            }
        }

        if self.len > 0 {
            self.len = 0;
            unsafe { free_subtree(self.root) };
        }
        // The sentinel never held a key; just free the node.
        let _: Box<Node<K>> = unsafe { Box::from_raw(self.sentinel.as_ptr()) };
    }
}

impl<K> fmt::Debug for RedBlackTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Keys<'a, K>(&'a RedBlackTree<K>);

        impl<K> fmt::Debug for Keys<'_, K>
        where
            K: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.0.iter()).finish()
            }
        }

        f.debug_struct("RedBlackTree")
            .field("len", &self.len)
            .field("keys", &Keys(self))
            .finish()
    }
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RedBlackTree<K> {
    /// Creates an empty set.
    ///
    /// The sentinel is allocated here and lives for the whole lifetime of
    /// the tree.
    pub fn new() -> Self {
        Self {
            root: NodeRef::dangling(),
            len: 0,
            sentinel: NodeRef::from_node(Node {
                key: MaybeUninit::uninit(),
                color: Color::Black,
                parent: None,
                left: None,
                right: None,
            }),
            marker: PhantomData,
        }
    }

    /// Number of keys in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the stored key equal to `key`, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        self.find(key).map(|node| unsafe { node.key() })
    }

    /// Returns `true` if an equal key is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        self.find(key).is_some()
    }

    fn find<Q>(&self, key: &Q) -> Option<NodeRef<K>>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        if self.is_empty() {
            return None;
        }

        let mut node = self.root;
        loop {
            match key.cmp(unsafe { node.key() }.borrow()) {
                Ordering::Less => match unsafe { node.left() } {
                    Some(left) => node = left,
                    None => return None,
                },
                Ordering::Equal => return Some(node),
                Ordering::Greater => match unsafe { node.right() } {
                    Some(right) => node = right,
                    None => return None,
                },
            }
        }
    }

    /// Smallest key in the set.
    pub fn min(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        Some(unsafe { Self::min_of(self.root).key() })
    }

    /// Largest key in the set.
    pub fn max(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        Some(unsafe { Self::max_of(self.root).key() })
    }

    /// Leftmost node of the subtree rooted at `subtree`.
    unsafe fn min_of(subtree: NodeRef<K>) -> NodeRef<K> {
        let mut node = subtree;
        while let Some(left) = unsafe { node.left() } {
            node = left;
        }
        node
    }

    unsafe fn max_of(subtree: NodeRef<K>) -> NodeRef<K> {
        let mut node = subtree;
        while let Some(right) = unsafe { node.right() } {
            node = right;
        }
        node
    }

    /// Smallest key strictly greater than `key`.
    ///
    /// `key` itself must be present for the walk to start; an absent key
    /// answers `None`.
    pub fn successor<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        let node = self.find(key)?;
        unsafe { Self::successor_of(node).map(|succ| succ.key()) }
    }

    /// Largest key strictly smaller than `key`.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        let node = self.find(key)?;
        unsafe { Self::predecessor_of(node).map(|pred| pred.key()) }
    }

    /// In-order successor of `node`.
    ///
    /// Either the minimum of the right subtree, or the first ancestor
    /// reached from inside its left subtree.
    unsafe fn successor_of(node: NodeRef<K>) -> Option<NodeRef<K>> {
        if let Some(right) = unsafe { node.right() } {
            return Some(unsafe { Self::min_of(right) });
        }

        let mut child = node;
        let mut parent = unsafe { child.parent() };
        while let Some(p) = parent {
            if matches!(unsafe { p.left() }, Some(left) if left.is(child)) {
                break;
            }
            child = p;
            parent = unsafe { child.parent() };
        }
        parent
    }

    unsafe fn predecessor_of(node: NodeRef<K>) -> Option<NodeRef<K>> {
        if let Some(left) = unsafe { node.left() } {
            return Some(unsafe { Self::max_of(left) });
        }

        let mut child = node;
        let mut parent = unsafe { child.parent() };
        while let Some(p) = parent {
            if matches!(unsafe { p.right() }, Some(right) if right.is(child)) {
                break;
            }
            child = p;
            parent = unsafe { child.parent() };
        }
        parent
    }

    /// Visits every key in ascending order.
    pub fn inorder_for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        if self.is_empty() {
            return;
        }
        unsafe { Self::inorder_core(self.root, &mut f) }
    }

    /// Visits every key parent-first.
    pub fn preorder_for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        if self.is_empty() {
            return;
        }
        unsafe { Self::preorder_core(self.root, &mut f) }
    }

    /// Visits every key children-first.
    pub fn postorder_for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        if self.is_empty() {
            return;
        }
        unsafe { Self::postorder_core(self.root, &mut f) }
    }

    unsafe fn inorder_core<F>(node: NodeRef<K>, f: &mut F)
    where
        F: FnMut(&K),
    {
        unsafe {
            if let Some(left) = node.left() {
                Self::inorder_core(left, f);
            }
            f(node.key());
            if let Some(right) = node.right() {
                Self::inorder_core(right, f);
            }
        }
    }

    unsafe fn preorder_core<F>(node: NodeRef<K>, f: &mut F)
    where
        F: FnMut(&K),
    {
        unsafe {
            f(node.key());
            if let Some(left) = node.left() {
                Self::preorder_core(left, f);
            }
            if let Some(right) = node.right() {
                Self::preorder_core(right, f);
            }
        }
    }

    unsafe fn postorder_core<F>(node: NodeRef<K>, f: &mut F)
    where
        F: FnMut(&K),
    {
        unsafe {
            if let Some(left) = node.left() {
                Self::postorder_core(left, f);
            }
            if let Some(right) = node.right() {
                Self::postorder_core(right, f);
            }
            f(node.key());
        }
    }

    /// Lazy ascending iterator over the keys.
    ///
    /// Every call starts a fresh, independent walk; iterating never
    /// mutates the tree.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            next: if self.is_empty() {
                None
            } else {
                Some(unsafe { Self::min_of(self.root) })
            },
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// Rotates `node` left: its right child takes its place and `node`
    /// becomes that child's left child.
    ///
    /// Preserves the in-order key sequence; colors are the caller's
    /// problem.
    fn rotate_left(&mut self, node: NodeRef<K>) {
        //    p                p
        //    |                |
        //   node            pivot
        //   /  \     -->    /  \
        //  a  pivot       node  c
        //     /  \        /  \
        //    b    c      a    b
        unsafe {
            debug_assert!(node.right().is_some());
            let Some(pivot) = node.right() else { return };

            // b moves under node
            node.set_right(pivot.left());
            if let Some(b) = node.right() {
                b.set_parent(Some(node));
            }

            // pivot replaces node in node's parent slot
            let parent = node.parent();
            pivot.set_parent(parent);
            match node.branch() {
                Branch::Root => self.root = pivot,
                Branch::Left => parent.unwrap().set_left(Some(pivot)),
                Branch::Right => parent.unwrap().set_right(Some(pivot)),
            }

            // node becomes pivot's left child
            pivot.set_left(Some(node));
            node.set_parent(Some(pivot));
        }
    }

    /// Mirror image of [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, node: NodeRef<K>) {
        //      p             p
        //      |             |
        //     node         pivot
        //     /  \   -->   /  \
        //  pivot  c       a   node
        //  /  \               /  \
        // a    b             b    c
        unsafe {
            debug_assert!(node.left().is_some());
            let Some(pivot) = node.left() else { return };

            node.set_left(pivot.right());
            if let Some(b) = node.left() {
                b.set_parent(Some(node));
            }

            let parent = node.parent();
            pivot.set_parent(parent);
            match node.branch() {
                Branch::Root => self.root = pivot,
                Branch::Left => parent.unwrap().set_left(Some(pivot)),
                Branch::Right => parent.unwrap().set_right(Some(pivot)),
            }

            pivot.set_right(Some(node));
            node.set_parent(Some(pivot));
        }
    }

    /// Adds a key to the set.
    ///
    /// Returns `false` if an equal key is already present; the tree is
    /// left untouched in that case and the given key is dropped. This is
    /// the crate's whole duplicate-key policy.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        // Descend to the slot the key belongs in, remembering which child
        // of the last visited node it will become.
        let mut parent = None;
        let mut branch = Branch::Root;
        let mut cursor = if self.is_empty() {
            None
        } else {
            Some(self.root)
        };
        while let Some(node) = cursor {
            parent = cursor;
            match key.cmp(unsafe { node.key() }) {
                Ordering::Less => {
                    cursor = unsafe { node.left() };
                    branch = Branch::Left;
                }
                Ordering::Equal => return false,
                Ordering::Greater => {
                    cursor = unsafe { node.right() };
                    branch = Branch::Right;
                }
            }
        }

        // New nodes start Red so that no black-height changes; only the
        // red-red case below needs repair.
        let node = NodeRef::from_node(Node {
            key: MaybeUninit::new(key),
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = node,
            Some(parent) => match branch {
                Branch::Left => unsafe { parent.set_left(Some(node)) },
                Branch::Right => unsafe { parent.set_right(Some(node)) },
                Branch::Root => unreachable!(),
            },
        }

        self.len += 1;
        self.insert_fixup(node);
        true
    }

    fn insert_fixup(&mut self, new_node: NodeRef<K>) {
        // The only possible violation is a red-red edge between `node` and
        // its parent; each round either pushes it two levels up (red
        // uncle) or ends it with at most two rotations.
        let mut node = new_node;
        unsafe {
            while let Some(mut parent) = node.parent() {
                if parent.color().is_black() {
                    break;
                }
                // A red parent cannot be the root, so the grandparent
                // exists, and it is black since the tree was valid before.
                let grand_parent = parent.parent().unwrap();
                debug_assert!(grand_parent.color().is_black());

                match parent.branch() {
                    Branch::Root => unreachable!(),
                    Branch::Left => {
                        let uncle = grand_parent.right();
                        if color_of(uncle).is_red() {
                            // Red uncle: recolor and move the violation up.
                            parent.set_color(Color::Black);
                            uncle.unwrap().set_color(Color::Black);
                            grand_parent.set_color(Color::Red);
                            node = grand_parent;
                        } else {
                            if let Branch::Right = node.branch() {
                                // Inner grandchild: rotate into the outer
                                // case, swapping roles on the way.
                                self.rotate_left(parent);
                                mem::swap(&mut parent, &mut node);
                            }
                            // Outer grandchild: one rotation terminates.
                            parent.set_color(Color::Black);
                            grand_parent.set_color(Color::Red);
                            self.rotate_right(grand_parent);
                        }
                    }
                    Branch::Right => {
                        // Mirror image of the branch above.
                        let uncle = grand_parent.left();
                        if color_of(uncle).is_red() {
                            parent.set_color(Color::Black);
                            uncle.unwrap().set_color(Color::Black);
                            grand_parent.set_color(Color::Red);
                            node = grand_parent;
                        } else {
                            if let Branch::Left = node.branch() {
                                self.rotate_right(parent);
                                mem::swap(&mut parent, &mut node);
                            }
                            parent.set_color(Color::Black);
                            grand_parent.set_color(Color::Red);
                            self.rotate_left(grand_parent);
                        }
                    }
                }
            }

            // Covers the loop ending because `node` reached the root.
            self.root.set_color(Color::Black);
        }
    }

    /// Removes the key equal to `key` and returns it.
    ///
    /// Fails with [`Error::NotFound`] and leaves the tree untouched when
    /// no equal key is present.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<K>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        match self.find(key) {
            Some(node) => Ok(unsafe { self.delete_node(node) }),
            None => Err(Error::NotFound),
        }
    }

    unsafe fn delete_node(&mut self, node: NodeRef<K>) -> K {
        unsafe {
            let (removed_color, hole, removed_key) = match (node.left(), node.right()) {
                (None, child) | (child @ Some(_), None) => {
                    // At most one child: splice it (or nothing) into the
                    // node's slot.
                    self.transplant(node, child);
                    let boxed = Box::from_raw(node.as_ptr());
                    (boxed.color, child, boxed.key.assume_init())
                }
                (Some(_), Some(right)) => {
                    // Two children: the in-order successor is the minimum
                    // of the right subtree and has no left child, so the
                    // one-child splice rule removes it. Its key then moves
                    // into this node, which stays in place with its own
                    // children and color; the successor's color is the one
                    // that structurally leaves the tree.
                    let successor = Self::min_of(right);
                    let successor_color = successor.color();
                    let hole = successor.right();
                    self.transplant(successor, hole);

                    let boxed = Box::from_raw(successor.as_ptr());
                    let removed = mem::replace(
                        &mut (*node.as_ptr()).key,
                        MaybeUninit::new(boxed.key.assume_init()),
                    )
                    .assume_init();
                    (successor_color, hole, removed)
                }
            };

            // Removing a red node changes no black count on any path; a
            // removed black leaves the hole's paths one black short.
            if removed_color.is_black() {
                self.delete_fixup(hole.unwrap_or(self.sentinel));
            }
            self.sentinel.set_parent(None);
            self.sentinel.set_color(Color::Black);

            self.len -= 1;
            removed_key
        }
    }

    /// Replaces the subtree rooted at `old` with the subtree rooted at
    /// `new` in `old`'s parent slot.
    ///
    /// When `new` is absent the sentinel records the vacated slot's parent
    /// so that `delete_fixup` can still walk upward from the hole. `old`'s
    /// own links are left untouched.
    unsafe fn transplant(&mut self, old: NodeRef<K>, new: Option<NodeRef<K>>) {
        unsafe {
            match old.branch() {
                Branch::Root => self.root = new.unwrap_or_else(NodeRef::dangling),
                Branch::Left => old.parent().unwrap().set_left(new),
                Branch::Right => old.parent().unwrap().set_right(new),
            }

            match new {
                Some(new) => new.set_parent(old.parent()),
                None => self.sentinel.set_parent(old.parent()),
            }
        }
    }

    fn delete_fixup(&mut self, hole: NodeRef<K>) {
        // `hole` sits where a black node used to be, so every path through
        // it is one black short. Each round either repays the deficit with
        // a recoloring plus at most two rotations, or moves it one level
        // up. A red (or root) `hole` absorbs the missing black by the
        // final recoloring.
        let mut x = hole;
        unsafe {
            while x.color().is_black() {
                let Some(parent) = x.parent() else { break };

                // The sentinel is never linked into a child slot, so its
                // side is the one the parent has empty, which is the
                // opposite of what `branch` reports.
                let is_hole_sentinel = x.is(self.sentinel);
                match (x.branch(), is_hole_sentinel) {
                    (Branch::Root, _) => unreachable!(),
                    (Branch::Left, false) | (Branch::Right, true) => {
                        // x occupies the left slot. The sibling must be a
                        // real node, otherwise the black counts through
                        // the parent could not have been equal before.
                        let mut sibling = parent.right().unwrap();
                        debug_assert!(!sibling.is(self.sentinel));
                        debug_assert!(!sibling.is(x));

                        if sibling.color().is_red() {
                            // Red sibling: rotate it above the parent; the
                            // new sibling is one of its black children.
                            debug_assert!(parent.color().is_black());
                            sibling.set_color(Color::Black);
                            parent.set_color(Color::Red);
                            self.rotate_left(parent);
                            sibling = parent.right().unwrap();
                        }

                        debug_assert!(sibling.color().is_black());
                        if color_of(sibling.left()).is_black()
                            && color_of(sibling.right()).is_black()
                        {
                            // Both nephews black: strip one black from
                            // both sides and push the deficit up.
                            sibling.set_color(Color::Red);
                            x = parent;
                        } else {
                            if color_of(sibling.right()).is_black() {
                                // Near nephew red, far one black: rotate
                                // the red nephew into the far position.
                                sibling.left().unwrap().set_color(Color::Black);
                                sibling.set_color(Color::Red);
                                self.rotate_right(sibling);
                                sibling = parent.right().unwrap();
                            }
                            // Far nephew red: one rotation repays the
                            // missing black on every path through x.
                            sibling.set_color(parent.color());
                            parent.set_color(Color::Black);
                            sibling.right().unwrap().set_color(Color::Black);
                            self.rotate_left(parent);
                            break;
                        }
                    }
                    (Branch::Right, false) | (Branch::Left, true) => {
                        // Mirror image: x occupies the right slot.
                        let mut sibling = parent.left().unwrap();
                        debug_assert!(!sibling.is(self.sentinel));
                        debug_assert!(!sibling.is(x));

                        if sibling.color().is_red() {
                            debug_assert!(parent.color().is_black());
                            sibling.set_color(Color::Black);
                            parent.set_color(Color::Red);
                            self.rotate_right(parent);
                            sibling = parent.left().unwrap();
                        }

                        debug_assert!(sibling.color().is_black());
                        if color_of(sibling.left()).is_black()
                            && color_of(sibling.right()).is_black()
                        {
                            sibling.set_color(Color::Red);
                            x = parent;
                        } else {
                            if color_of(sibling.left()).is_black() {
                                sibling.right().unwrap().set_color(Color::Black);
                                sibling.set_color(Color::Red);
                                self.rotate_left(sibling);
                                sibling = parent.left().unwrap();
                            }
                            sibling.set_color(parent.color());
                            parent.set_color(Color::Black);
                            sibling.left().unwrap().set_color(Color::Black);
                            self.rotate_right(parent);
                            break;
                        }
                    }
                }
            }
            x.set_color(Color::Black);
        }
    }
}

#[cfg(test)]
impl<K: Ord> RedBlackTree<K> {
    /// Plain BST insert without any rebalancing, colored Black. Lets tests
    /// shape a tree by hand before exercising the rotation primitives.
    fn insert_unbalanced(&mut self, key: K) {
        let mut parent = None;
        let mut branch = Branch::Root;
        let mut cursor = if self.is_empty() {
            None
        } else {
            Some(self.root)
        };
        while let Some(node) = cursor {
            parent = cursor;
            match key.cmp(unsafe { node.key() }) {
                Ordering::Less => {
                    cursor = unsafe { node.left() };
                    branch = Branch::Left;
                }
                Ordering::Equal => return,
                Ordering::Greater => {
                    cursor = unsafe { node.right() };
                    branch = Branch::Right;
                }
            }
        }

        let node = NodeRef::from_node(Node {
            key: MaybeUninit::new(key),
            color: Color::Black,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = node,
            Some(parent) => match branch {
                Branch::Left => unsafe { parent.set_left(Some(node)) },
                Branch::Right => unsafe { parent.set_right(Some(node)) },
                Branch::Root => unreachable!(),
            },
        }
        self.len += 1;
    }
}

/// Lazy ascending iterator over a tree's keys, created by
/// [`RedBlackTree::iter`].
///
/// Walks the parent links instead of keeping a stack, so it allocates
/// nothing and each iterator is independent of every other.
pub struct Iter<'a, K> {
    next: Option<NodeRef<K>>,
    remaining: usize,
    marker: PhantomData<&'a K>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = unsafe { RedBlackTree::successor_of(node) };
        self.remaining -= 1;
        Some(unsafe { node.key() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a RedBlackTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
