//! Intrusive red-black tree over external storage.
//!
//! The tree only tracks the root and the node count. Nodes live in storage
//! and embed their own parent/child links and color via [`TreeNode`].
//!
//! # Positional insertion
//!
//! The tree never compares nodes. Callers decide where a node goes by naming
//! its parent and the side to attach it on, which must be an empty child
//! slot. This keeps ordering policy out of the core: a caller that already
//! knows a node's in-order neighbour (for example from a parallel list) can
//! attach it in O(1) and only pay for the rebalance.
//!
//! # Augmentation
//!
//! Every node carries a [`TreeNode::Summary`] computed from its own data and
//! its children's summaries. The tree refreshes summaries on every
//! structural change (links, rotations). When a caller changes data a summary
//! depends on, it must call [`RbTree::ripple`] on that node.

use crate::{Index, Storage};

/// Node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red node. A red node never has a red child.
    Red,
    /// Black node. Every root-to-leaf path crosses the same number of these.
    Black,
}

/// Child side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Left child (smaller in-order position).
    Left,
    /// Right child (larger in-order position).
    Right,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Trait for types that can participate in a red-black tree.
///
/// # Example
///
/// A node that tracks the size of its subtree:
///
/// ```
/// use nexus_collections::{Color, Index, Side, TreeNode};
///
/// struct Node {
///     parent: u32,
///     left: u32,
///     right: u32,
///     color: Color,
///     size: usize,
/// }
///
/// impl TreeNode<u32> for Node {
///     type Summary = usize;
///
///     fn parent(&self) -> u32 { self.parent }
///     fn set_parent(&mut self, idx: u32) { self.parent = idx; }
///     fn child(&self, side: Side) -> u32 {
///         match side { Side::Left => self.left, Side::Right => self.right }
///     }
///     fn set_child(&mut self, side: Side, idx: u32) {
///         match side { Side::Left => self.left = idx, Side::Right => self.right = idx }
///     }
///     fn color(&self) -> Color { self.color }
///     fn set_color(&mut self, color: Color) { self.color = color; }
///     fn summary(&self) -> usize { self.size }
///     fn recompute(&mut self, left: Option<usize>, right: Option<usize>) {
///         self.size = 1 + left.unwrap_or(0) + right.unwrap_or(0);
///     }
/// }
/// ```
pub trait TreeNode<Idx: Index> {
    /// Subtree summary maintained by the tree.
    type Summary: Copy;

    /// Returns the parent's index, or `Idx::NONE` for the root.
    fn parent(&self) -> Idx;

    /// Sets the parent's index.
    fn set_parent(&mut self, idx: Idx);

    /// Returns the child on `side`, or `Idx::NONE`.
    fn child(&self, side: Side) -> Idx;

    /// Sets the child on `side`.
    fn set_child(&mut self, side: Side, idx: Idx);

    /// Returns the node's color.
    fn color(&self) -> Color;

    /// Sets the node's color.
    fn set_color(&mut self, color: Color);

    /// Returns the cached subtree summary.
    fn summary(&self) -> Self::Summary;

    /// Recomputes the cached summary from the node's own data and its
    /// children's summaries (`None` for a missing child).
    fn recompute(&mut self, left: Option<Self::Summary>, right: Option<Self::Summary>);
}

/// A red-black tree over external storage.
///
/// # Example
///
/// ```
/// use nexus_collections::{Color, Index, Pool, RbTree, Side, Storage, TreeNode};
///
/// # struct Node { parent: u32, left: u32, right: u32, color: Color }
/// # impl Node {
/// #     fn new() -> Self {
/// #         Self { parent: u32::NONE, left: u32::NONE, right: u32::NONE, color: Color::Red }
/// #     }
/// # }
/// # impl TreeNode<u32> for Node {
/// #     type Summary = ();
/// #     fn parent(&self) -> u32 { self.parent }
/// #     fn set_parent(&mut self, idx: u32) { self.parent = idx; }
/// #     fn child(&self, side: Side) -> u32 {
/// #         match side { Side::Left => self.left, Side::Right => self.right }
/// #     }
/// #     fn set_child(&mut self, side: Side, idx: u32) {
/// #         match side { Side::Left => self.left = idx, Side::Right => self.right = idx }
/// #     }
/// #     fn color(&self) -> Color { self.color }
/// #     fn set_color(&mut self, color: Color) { self.color = color; }
/// #     fn summary(&self) {}
/// #     fn recompute(&mut self, _: Option<()>, _: Option<()>) {}
/// # }
/// let mut storage: Pool<Node> = Pool::new();
/// let mut tree: RbTree<u32> = RbTree::new();
///
/// let a = storage.insert(Node::new());
/// tree.insert(&mut storage, u32::NONE, Side::Left, a);
///
/// // Append two nodes, each as the right child of the current last node.
/// let b = storage.insert(Node::new());
/// let last = tree.last(&storage);
/// tree.insert(&mut storage, last, Side::Right, b);
/// let c = storage.insert(Node::new());
/// let last = tree.last(&storage);
/// tree.insert(&mut storage, last, Side::Right, c);
///
/// // The rebalance rotated `b` up to the root.
/// assert_eq!(tree.root(), b);
/// assert_eq!(tree.first(&storage), a);
/// assert_eq!(tree.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RbTree<Idx: Index> {
    root: Idx,
    len: usize,
}

impl<Idx: Index> Default for RbTree<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn node<T, S, Idx>(storage: &S, idx: Idx) -> &T
where
    Idx: Index,
    S: Storage<T, Index = Idx>,
{
    storage.get(idx).expect("invalid tree link")
}

#[inline]
fn node_mut<T, S, Idx>(storage: &mut S, idx: Idx) -> &mut T
where
    Idx: Index,
    S: Storage<T, Index = Idx>,
{
    storage.get_mut(idx).expect("invalid tree link")
}

impl<Idx: Index> RbTree<Idx> {
    /// Creates an empty tree.
    #[inline]
    pub const fn new() -> Self {
        Self {
            root: Idx::NONE,
            len: 0,
        }
    }

    /// Returns the root's index, or `Idx::NONE` if empty.
    #[inline]
    pub const fn root(&self) -> Idx {
        self.root
    }

    /// Returns the number of nodes in the tree.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forgets every node without touching storage.
    #[inline]
    pub fn reset(&mut self) {
        self.root = Idx::NONE;
        self.len = 0;
    }

    /// Returns the leftmost node, or `Idx::NONE` if empty.
    pub fn first<T, S>(&self, storage: &S) -> Idx
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        extreme(storage, self.root, Side::Left)
    }

    /// Returns the rightmost node, or `Idx::NONE` if empty.
    pub fn last<T, S>(&self, storage: &S) -> Idx
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        extreme(storage, self.root, Side::Right)
    }

    /// Attaches `idx` as the `side` child of `parent` and rebalances.
    ///
    /// If the tree is empty, `parent` must be `Idx::NONE` and `idx` becomes
    /// the root. Otherwise the `side` child slot of `parent` must be empty.
    ///
    /// # Panics
    ///
    /// Panics if `idx` or `parent` is not valid in storage, or if the child
    /// slot is already occupied.
    pub fn insert<T, S>(&mut self, storage: &mut S, parent: Idx, side: Side, idx: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        {
            let n = node_mut(storage, idx);
            n.set_parent(parent);
            n.set_child(Side::Left, Idx::NONE);
            n.set_child(Side::Right, Idx::NONE);
            n.set_color(Color::Red);
        }

        if parent.is_none() {
            assert!(self.root.is_none(), "root insert into non-empty tree");
            self.root = idx;
        } else {
            let p = node_mut(storage, parent);
            assert!(p.child(side).is_none(), "child slot already occupied");
            p.set_child(side, idx);
        }
        self.len += 1;

        self.ripple(storage, idx);
        self.fix_insert(storage, idx);
    }

    /// Detaches `idx` from the tree and rebalances.
    ///
    /// The node stays in storage with its tree links cleared.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage.
    pub fn remove<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let (left, right, removed_color) = {
            let z = node(storage, idx);
            (z.child(Side::Left), z.child(Side::Right), z.color())
        };

        // `x` takes the place of the node that leaves its position; `xp` is
        // its parent, tracked separately because `x` may be NONE.
        let x;
        let xp;
        let mut color = removed_color;

        if left.is_none() || right.is_none() {
            x = if left.is_none() { right } else { left };
            xp = node(storage, idx).parent();
            self.transplant(storage, idx, x);
        } else {
            let y = extreme(storage, right, Side::Left);
            color = node(storage, y).color();
            x = node(storage, y).child(Side::Right);

            if node(storage, y).parent() == idx {
                xp = y;
            } else {
                xp = node(storage, y).parent();
                self.transplant(storage, y, x);
                node_mut(storage, y).set_child(Side::Right, right);
                node_mut(storage, right).set_parent(y);
            }

            self.transplant(storage, idx, y);
            node_mut(storage, y).set_child(Side::Left, left);
            node_mut(storage, left).set_parent(y);
            node_mut(storage, y).set_color(removed_color);
        }

        {
            let z = node_mut(storage, idx);
            z.set_parent(Idx::NONE);
            z.set_child(Side::Left, Idx::NONE);
            z.set_child(Side::Right, Idx::NONE);
        }
        self.len -= 1;

        if xp.is_some() {
            self.ripple(storage, xp);
        }
        if color == Color::Black {
            self.fix_remove(storage, x, xp);
        }
    }

    /// Recomputes summaries from `idx` up to the root.
    ///
    /// Call this after changing data that a node's summary depends on.
    pub fn ripple<T, S>(&self, storage: &mut S, idx: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut cur = idx;
        while cur.is_some() {
            refresh(storage, cur);
            cur = node(storage, cur).parent();
        }
    }

    fn fix_insert<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut z = idx;
        loop {
            let p = node(storage, z).parent();
            if !is_red(storage, p) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let g = node(storage, p).parent();
            let side = side_of(storage, g, p);
            let uncle = node(storage, g).child(side.flip());

            if is_red(storage, uncle) {
                node_mut(storage, p).set_color(Color::Black);
                node_mut(storage, uncle).set_color(Color::Black);
                node_mut(storage, g).set_color(Color::Red);
                z = g;
                continue;
            }

            let mut p = p;
            if node(storage, p).child(side.flip()) == z {
                z = p;
                self.rotate(storage, z, side);
                p = node(storage, z).parent();
            }
            node_mut(storage, p).set_color(Color::Black);
            node_mut(storage, g).set_color(Color::Red);
            self.rotate(storage, g, side.flip());
        }

        let root = self.root;
        node_mut(storage, root).set_color(Color::Black);
    }

    fn fix_remove<T, S>(&mut self, storage: &mut S, mut x: Idx, mut xp: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        while x != self.root && !is_red(storage, x) {
            let side = if node(storage, xp).child(Side::Left) == x {
                Side::Left
            } else {
                Side::Right
            };
            let mut w = node(storage, xp).child(side.flip());

            if is_red(storage, w) {
                node_mut(storage, w).set_color(Color::Black);
                node_mut(storage, xp).set_color(Color::Red);
                self.rotate(storage, xp, side);
                w = node(storage, xp).child(side.flip());
            }

            let near = node(storage, w).child(side);
            let far = node(storage, w).child(side.flip());
            if !is_red(storage, near) && !is_red(storage, far) {
                node_mut(storage, w).set_color(Color::Red);
                x = xp;
                xp = node(storage, x).parent();
                continue;
            }

            if !is_red(storage, far) {
                node_mut(storage, near).set_color(Color::Black);
                node_mut(storage, w).set_color(Color::Red);
                self.rotate(storage, w, side.flip());
                w = node(storage, xp).child(side.flip());
            }

            let parent_color = node(storage, xp).color();
            node_mut(storage, w).set_color(parent_color);
            node_mut(storage, xp).set_color(Color::Black);
            let far = node(storage, w).child(side.flip());
            node_mut(storage, far).set_color(Color::Black);
            self.rotate(storage, xp, side);
            x = self.root;
            break;
        }

        if x.is_some() {
            node_mut(storage, x).set_color(Color::Black);
        }
    }

    /// Rotates `x` down towards `side`; its child on the other side rises.
    fn rotate<T, S>(&mut self, storage: &mut S, x: Idx, side: Side)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let y = node(storage, x).child(side.flip());
        let inner = node(storage, y).child(side);
        let xp = node(storage, x).parent();

        node_mut(storage, x).set_child(side.flip(), inner);
        if inner.is_some() {
            node_mut(storage, inner).set_parent(x);
        }

        node_mut(storage, y).set_parent(xp);
        self.replace_child(storage, xp, x, y);

        node_mut(storage, y).set_child(side, x);
        node_mut(storage, x).set_parent(y);

        refresh(storage, x);
        refresh(storage, y);
    }

    /// Puts `v` where `u` hangs from its parent. `v` may be NONE.
    fn transplant<T, S>(&mut self, storage: &mut S, u: Idx, v: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let up = node(storage, u).parent();
        self.replace_child(storage, up, u, v);
        if v.is_some() {
            node_mut(storage, v).set_parent(up);
        }
    }

    fn replace_child<T, S>(&mut self, storage: &mut S, parent: Idx, old: Idx, new: Idx)
    where
        T: TreeNode<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if parent.is_none() {
            self.root = new;
        } else {
            let side = side_of(storage, parent, old);
            node_mut(storage, parent).set_child(side, new);
        }
    }
}

#[inline]
fn is_red<T, S, Idx>(storage: &S, idx: Idx) -> bool
where
    Idx: Index,
    T: TreeNode<Idx>,
    S: Storage<T, Index = Idx>,
{
    idx.is_some() && node(storage, idx).color() == Color::Red
}

#[inline]
fn side_of<T, S, Idx>(storage: &S, parent: Idx, child: Idx) -> Side
where
    Idx: Index,
    T: TreeNode<Idx>,
    S: Storage<T, Index = Idx>,
{
    if node(storage, parent).child(Side::Left) == child {
        Side::Left
    } else {
        Side::Right
    }
}

fn extreme<T, S, Idx>(storage: &S, from: Idx, side: Side) -> Idx
where
    Idx: Index,
    T: TreeNode<Idx>,
    S: Storage<T, Index = Idx>,
{
    let mut cur = from;
    if cur.is_none() {
        return cur;
    }
    loop {
        let next = node(storage, cur).child(side);
        if next.is_none() {
            return cur;
        }
        cur = next;
    }
}

fn refresh<T, S, Idx>(storage: &mut S, idx: Idx)
where
    Idx: Index,
    T: TreeNode<Idx>,
    S: Storage<T, Index = Idx>,
{
    let (l, r) = {
        let n = node(storage, idx);
        (n.child(Side::Left), n.child(Side::Right))
    };
    let left = l.into_option().map(|l| node(storage, l).summary());
    let right = r.into_option().map(|r| node(storage, r).summary());
    node_mut(storage, idx).recompute(left, right);
}
