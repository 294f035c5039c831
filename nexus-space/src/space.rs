//! Discrete range space: disjoint intervals mapped to payloads.
//!
//! A [`DiscreteSpace`] is a partial function from points of a
//! [`DiscreteMetric`] to payloads, stored as the set of maximal intervals of
//! equal payload. Every node sits in two structures at once:
//!
//! ```text
//! RbTree  - balanced search, each node caches the hull of its subtree
//! List    - the same nodes in ascending order, for O(1) neighbours
//! ```
//!
//! Both structures link nodes by index into a [`Storage`] pool, so nodes are
//! never moved and removed slots are recycled by the next insert.
//!
//! After every public call the nodes are disjoint, ascending, and maximally
//! coalesced: no two adjacent nodes carry equal payloads.

use core::fmt;
use core::marker::PhantomData;

use nexus_collections::{
    Color, Index, Indices, Linked, List, Pool, RbTree, Side, Storage, TreeNode,
};

use crate::{DiscreteMetric, Interval};

/// Storage node of a [`DiscreteSpace`].
///
/// Exposed only so callers can name storage types such as
/// `Pool<Node<M, P>>` or `slab::Slab<Node<M, P, usize>>`.
pub struct Node<M, P, Idx = u32> {
    range: Interval<M>,
    hull: Interval<M>,
    payload: P,
    parent: Idx,
    left: Idx,
    right: Idx,
    color: Color,
    next: Idx,
    prev: Idx,
}

impl<M: DiscreteMetric, P, Idx: Index> Node<M, P, Idx> {
    fn new(range: Interval<M>, payload: P) -> Self {
        Self {
            range,
            hull: range,
            payload,
            parent: Idx::NONE,
            left: Idx::NONE,
            right: Idx::NONE,
            color: Color::Red,
            next: Idx::NONE,
            prev: Idx::NONE,
        }
    }

    /// The interval this node maps.
    #[inline]
    pub fn range(&self) -> Interval<M> {
        self.range
    }

    /// The payload of every point in [`range`](Self::range).
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<M: DiscreteMetric, P, Idx: Index> Linked<Idx> for Node<M, P, Idx> {
    #[inline]
    fn next(&self) -> Idx {
        self.next
    }

    #[inline]
    fn prev(&self) -> Idx {
        self.prev
    }

    #[inline]
    fn set_next(&mut self, idx: Idx) {
        self.next = idx;
    }

    #[inline]
    fn set_prev(&mut self, idx: Idx) {
        self.prev = idx;
    }
}

impl<M: DiscreteMetric, P, Idx: Index> TreeNode<Idx> for Node<M, P, Idx> {
    type Summary = Interval<M>;

    #[inline]
    fn parent(&self) -> Idx {
        self.parent
    }

    #[inline]
    fn set_parent(&mut self, idx: Idx) {
        self.parent = idx;
    }

    #[inline]
    fn child(&self, side: Side) -> Idx {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn set_child(&mut self, side: Side, idx: Idx) {
        match side {
            Side::Left => self.left = idx,
            Side::Right => self.right = idx,
        }
    }

    #[inline]
    fn color(&self) -> Color {
        self.color
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    fn summary(&self) -> Interval<M> {
        self.hull
    }

    fn recompute(&mut self, left: Option<Interval<M>>, right: Option<Interval<M>>) {
        let mut hull = self.range;
        if let Some(left) = left {
            hull.extend(&left);
        }
        if let Some(right) = right {
            hull.extend(&right);
        }
        self.hull = hull;
    }
}

/// A map from disjoint intervals of `M` to payloads of type `P`.
///
/// Three bulk mutators change the map over a whole interval at once:
///
/// - [`mark`](Self::mark) overwrites every point in the interval.
/// - [`fill`](Self::fill) only maps points that are not mapped yet.
/// - [`blend`](Self::blend) merges a color into each point's payload.
///
/// Lookups are `O(log n)` and bulk updates `O(k + log n)`, where `k` is the
/// number of existing intervals the update touches. The size of the metric
/// never matters.
///
/// # Example
///
/// ```
/// use nexus_space::{DiscreteSpace, Interval};
///
/// let mut space: DiscreteSpace<u32, &str> = DiscreteSpace::new();
/// space.mark(Interval::new(0, 99), "low");
/// space.mark(Interval::new(40, 59), "mid");
///
/// assert_eq!(space.count(), 3);
/// assert_eq!(space.find(50), Some(&"mid"));
/// assert_eq!(space.find(60), Some(&"low"));
/// assert_eq!(space.find(100), None);
///
/// let ranges: Vec<_> = space.iter().map(|(r, _)| (r.min(), r.max())).collect();
/// assert_eq!(ranges, [(0, 39), (40, 59), (60, 99)]);
/// ```
///
/// # Storage
///
/// Nodes live in `S`, [`Pool`] by default. Any [`Storage`] works, for example
/// `slab::Slab` with the `slab` feature:
///
/// ```ignore
/// let space: DiscreteSpace<u32, u8, slab::Slab<Node<u32, u8, usize>>, usize> =
///     DiscreteSpace::with_storage(slab::Slab::new());
/// ```
pub struct DiscreteSpace<M, P, S = Pool<Node<M, P>>, Idx = u32>
where
    Idx: Index,
{
    tree: RbTree<Idx>,
    list: List<Idx>,
    storage: S,
    _marker: PhantomData<fn() -> (M, P)>,
}

impl<M, P> DiscreteSpace<M, P>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
{
    /// Creates an empty space backed by a [`Pool`].
    pub fn new() -> Self {
        Self::with_storage(Pool::new())
    }

    /// Creates an empty space with room for `capacity` intervals.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_storage(Pool::with_capacity(capacity))
    }
}

impl<M, P> Default for DiscreteSpace<M, P>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, P, S, Idx> DiscreteSpace<M, P, S, Idx>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
    Idx: Index,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    /// Creates an empty space over caller-provided storage.
    ///
    /// `storage` must be empty. The space owns it from here on.
    pub fn with_storage(storage: S) -> Self {
        debug_assert!(storage.is_empty(), "range space storage must start empty");
        Self {
            tree: RbTree::new(),
            list: List::new(),
            storage,
            _marker: PhantomData,
        }
    }

    /// Returns the number of maximal intervals.
    #[inline]
    pub fn count(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if no point is mapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the payload of `point`, if it is mapped.
    ///
    /// Descends from the root and only enters a subtree whose hull contains
    /// `point`, so a miss is as cheap as a hit.
    pub fn find(&self, point: M) -> Option<&P> {
        self.find_entry(point).map(|(_, payload)| payload)
    }

    /// Returns the maximal interval containing `point` and its payload.
    pub fn find_entry(&self, point: M) -> Option<(Interval<M>, &P)> {
        let mut cur = self.tree.root();
        while cur.is_some() {
            let n = self.node(cur);
            if n.range.contains(point) {
                return Some((n.range, &n.payload));
            }
            let side = if point < n.range.min() {
                Side::Left
            } else {
                Side::Right
            };
            let child = n.child(side);
            if child.is_none() || !self.node(child).hull.contains(point) {
                return None;
            }
            cur = child;
        }
        None
    }

    /// Returns the lowest interval and its payload.
    pub fn first(&self) -> Option<(Interval<M>, &P)> {
        self.list.head().into_option().map(|idx| self.entry(idx))
    }

    /// Returns the highest interval and its payload.
    pub fn last(&self) -> Option<(Interval<M>, &P)> {
        self.list.tail().into_option().map(|idx| self.entry(idx))
    }

    /// Returns an iterator over `(interval, payload)` in ascending order.
    pub fn iter(&self) -> Iter<'_, M, P, S, Idx> {
        Iter {
            storage: &self.storage,
            indices: self.list.indices(&self.storage),
        }
    }

    /// Maps every point in `range` to `payload`, replacing what was there.
    ///
    /// Neighbours that end up adjacent with an equal payload are merged. An
    /// empty `range` is a no-op.
    pub fn mark(&mut self, range: Interval<M>, payload: P) -> &mut Self {
        if !range.is_empty() {
            self.mark_span(range, payload);
            tracing::trace!(?range, count = self.count(), "mark");
        }
        self
    }

    /// Maps the unmapped points in `range` to `payload`.
    ///
    /// Points that already have a payload keep it, whatever it is.
    pub fn fill(&mut self, range: Interval<M>, payload: P) -> &mut Self {
        if !range.is_empty() {
            self.fill_span(range, payload);
            tracing::trace!(?range, count = self.count(), "fill");
        }
        self
    }

    /// Blends `color` into the payload of every point in `range`.
    ///
    /// `blender` updates a payload in place and returns whether the result
    /// is kept. Unmapped points start from `P::default()`; that default is
    /// blended once up front to decide how gaps are colored. A `false`
    /// result unmaps the affected points.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_space::{DiscreteSpace, Interval};
    ///
    /// let or = |acc: &mut u8, bits: &u8| {
    ///     *acc |= *bits;
    ///     true
    /// };
    ///
    /// let mut space: DiscreteSpace<u16, u8> = DiscreteSpace::new();
    /// space.blend(Interval::new(0, 9), &0b01, or);
    /// space.blend(Interval::new(5, 14), &0b10, or);
    ///
    /// assert_eq!(space.find(2), Some(&0b01));
    /// assert_eq!(space.find(7), Some(&0b11));
    /// assert_eq!(space.find(12), Some(&0b10));
    /// assert_eq!(space.count(), 3);
    /// ```
    pub fn blend<U, F>(&mut self, range: Interval<M>, color: &U, blender: F) -> &mut Self
    where
        U: ?Sized,
        F: FnMut(&mut P, &U) -> bool,
    {
        if !range.is_empty() {
            self.blend_span(range, color, blender);
            tracing::trace!(?range, count = self.count(), "blend");
        }
        self
    }

    /// Unmaps every point in `range`.
    pub fn erase(&mut self, range: Interval<M>) -> &mut Self {
        if !range.is_empty() {
            self.blend_span(range, &(), |_, _| false);
            tracing::trace!(?range, count = self.count(), "erase");
        }
        self
    }

    /// Unmaps every point, dropping all payloads and releasing all storage.
    pub fn clear(&mut self) {
        let dropped = self.count();
        self.storage.clear();
        self.tree.reset();
        self.list.reset();
        tracing::debug!(dropped, "range space cleared");
    }

    /// Walks the whole structure and reports the first broken invariant.
    ///
    /// Checks ordering, disjointness, coalescing, cached hulls, red-black
    /// balance and that the tree and the list hold the same sequence. This
    /// is `O(n)` and meant for tests and debugging.
    pub fn validate(&self) -> Result<(), String> {
        let order: Vec<Idx> = self.list.indices(&self.storage).collect();
        if order.len() != self.tree.len() || order.len() != self.storage.len() {
            return Err(format!(
                "size mismatch: list {} tree {} storage {}",
                order.len(),
                self.tree.len(),
                self.storage.len()
            ));
        }

        for pair in order.windows(2) {
            let (a, b) = (self.node(pair[0]), self.node(pair[1]));
            if a.range.max() >= b.range.min() {
                return Err(format!("{:?} is not below {:?}", a.range, b.range));
            }
            if a.payload == b.payload && a.range.is_adjacent_to(&b.range) {
                return Err(format!("{:?} and {:?} not coalesced", a.range, b.range));
            }
        }

        let mut in_order = Vec::with_capacity(order.len());
        let root = self.tree.root();
        if root.is_some() && self.node(root).color != Color::Black {
            return Err("red root".to_string());
        }
        self.check_subtree(root, Idx::NONE, &mut in_order)?;
        if in_order != order {
            return Err("tree order differs from list order".to_string());
        }
        Ok(())
    }

    /// Returns the black height of the subtree at `idx`.
    fn check_subtree(&self, idx: Idx, parent: Idx, out: &mut Vec<Idx>) -> Result<usize, String> {
        if idx.is_none() {
            return Ok(1);
        }
        let n = self.node(idx);
        if n.range.is_empty() {
            return Err("empty interval stored".to_string());
        }
        if n.parent != parent {
            return Err(format!("bad parent link at {:?}", n.range));
        }
        let red = |i: Idx| i.is_some() && self.node(i).color == Color::Red;
        if n.color == Color::Red && (red(n.left) || red(n.right)) {
            return Err(format!("red-red at {:?}", n.range));
        }

        let lbh = self.check_subtree(n.left, idx, out)?;
        out.push(idx);
        let rbh = self.check_subtree(n.right, idx, out)?;
        if lbh != rbh {
            return Err(format!("black height mismatch at {:?}", n.range));
        }

        let mut hull = n.range;
        for child in [n.left, n.right] {
            if child.is_some() {
                hull.extend(&self.node(child).hull);
            }
        }
        if hull != n.hull {
            return Err(format!("stale hull {:?} at {:?}, want {:?}", n.hull, n.range, hull));
        }
        Ok(lbh + usize::from(n.color == Color::Black))
    }

    // ------------------------------------------------------------------
    // Bulk update walks
    // ------------------------------------------------------------------

    fn mark_span(&mut self, range: Interval<M>, payload: P) {
        let (lo, hi) = (range.min(), range.max());
        let n = self.lower_bound(lo);

        // Node that ends up holding `range`, if an existing one can.
        let mut carrier = Idx::NONE;
        let mut cursor;

        if n.is_some() && self.range_of(n).min() < lo && self.range_of(n).max() >= lo {
            let span = self.range_of(n);
            if self.node(n).payload == payload {
                if span.max() >= hi {
                    return;
                }
                carrier = n;
            } else if span.max() > hi {
                // Strictly inside a differently colored node: split it in three.
                let rest = self.node(n).payload.clone();
                self.set_max(n, lo.pred());
                let mid = self.place_after(n, range, payload);
                self.place_after(mid, Interval::new(hi.succ(), span.max()), rest);
                return;
            } else {
                self.set_max(n, lo.pred());
            }
            cursor = self.next_of(n);
        } else {
            let (left, start) = if n.is_none() {
                (Idx::NONE, self.list.head())
            } else if self.range_of(n).min() == lo {
                (self.prev_of(n), n)
            } else {
                (n, self.next_of(n))
            };
            if left.is_some() && self.node(left).payload == payload && self.touches(left, lo) {
                carrier = left;
            }
            cursor = start;
        }

        while cursor.is_some() {
            let span = self.range_of(cursor);
            if span.min() > hi {
                break;
            }
            let next = self.next_of(cursor);

            if span.max() <= hi {
                if carrier.is_none() {
                    self.node_mut(cursor).payload = payload.clone();
                    self.set_range(cursor, range);
                    carrier = cursor;
                } else {
                    self.unlink(cursor);
                }
                cursor = next;
                continue;
            }

            // `cursor` runs past `hi`.
            if self.node(cursor).payload == payload {
                if carrier.is_none() {
                    self.set_min(cursor, lo);
                    carrier = cursor;
                } else {
                    self.unlink(cursor);
                    self.set_max(carrier, span.max());
                }
            } else {
                self.set_min(cursor, hi.succ());
            }
            break;
        }

        if carrier.is_none() {
            carrier = self.place_before(cursor, range, payload);
        } else if self.range_of(carrier).max() < hi {
            self.set_max(carrier, hi);
        }
        self.absorb_next(carrier);
    }

    fn fill_span(&mut self, range: Interval<M>, payload: P) {
        let (lo, hi) = (range.min(), range.max());
        let n = self.lower_bound(lo);

        // `pos` is the first point not yet known to be mapped, `prev` the
        // node right before it and `cursor` the node after `prev`.
        let (mut prev, mut cursor, mut pos) = if n.is_none() {
            (Idx::NONE, self.list.head(), lo)
        } else if self.range_of(n).max() >= lo {
            let max = self.range_of(n).max();
            if max >= hi {
                return;
            }
            (n, self.next_of(n), max.succ())
        } else {
            (n, self.next_of(n), lo)
        };

        loop {
            let seg;
            if cursor.is_some() && self.range_of(cursor).min() == pos {
                seg = cursor;
            } else {
                let bounded = cursor.is_some() && self.range_of(cursor).min() <= hi;
                let gap_max = if bounded {
                    self.range_of(cursor).min().pred()
                } else {
                    hi
                };

                let joins_prev =
                    prev.is_some() && self.node(prev).payload == payload && self.touches(prev, pos);
                let joins_next = cursor.is_some()
                    && self.node(cursor).payload == payload
                    && gap_max.succ() == self.range_of(cursor).min();

                if joins_prev && joins_next {
                    let max = self.range_of(cursor).max();
                    self.unlink(cursor);
                    self.set_max(prev, max);
                    seg = prev;
                } else if joins_prev {
                    self.set_max(prev, gap_max);
                    seg = cursor;
                } else if joins_next {
                    self.set_min(cursor, pos);
                    seg = cursor;
                } else {
                    self.place_before(cursor, Interval::new(pos, gap_max), payload.clone());
                    seg = cursor;
                }

                if !bounded {
                    return;
                }
            }

            let max = self.range_of(seg).max();
            if max >= hi {
                return;
            }
            pos = max.succ();
            prev = seg;
            cursor = self.next_of(seg);
        }
    }

    fn blend_span<U, F>(&mut self, range: Interval<M>, color: &U, mut blender: F)
    where
        U: ?Sized,
        F: FnMut(&mut P, &U) -> bool,
    {
        let (lo, hi) = (range.min(), range.max());

        let mut plain = P::default();
        let plain = blender(&mut plain, color).then_some(plain);

        // Cut off the part of a node hanging over `lo`, so every node the
        // walk meets starts inside `range`.
        let n = self.lower_bound(lo);
        let mut cursor = if n.is_none() {
            self.list.head()
        } else if self.range_of(n).min() == lo {
            n
        } else if self.range_of(n).max() >= lo {
            self.split(n, lo)
        } else {
            self.next_of(n)
        };
        let before = if cursor.is_some() {
            self.prev_of(cursor)
        } else {
            self.list.tail()
        };

        let mut pos = Some(lo);
        while let Some(at) = pos {
            if cursor.is_none() || self.range_of(cursor).min() > hi {
                if let Some(plain) = &plain {
                    self.place_before(cursor, Interval::new(at, hi), plain.clone());
                }
                break;
            }

            let span = self.range_of(cursor);
            if span.min() > at {
                if let Some(plain) = &plain {
                    self.place_before(cursor, Interval::new(at, span.min().pred()), plain.clone());
                }
            }
            if span.max() > hi {
                self.split(cursor, hi.succ());
            }

            let end = span.max().min(hi);
            let next = self.next_of(cursor);
            if !blender(&mut self.node_mut(cursor).payload, color) {
                self.unlink(cursor);
            }
            pos = (end < hi).then(|| end.succ());
            cursor = next;
        }

        // Merge equal neighbours from the node left of `range` through the
        // first node past it.
        let stop = cursor;
        let mut cur = if before.is_some() {
            before
        } else {
            self.list.head()
        };
        while cur.is_some() && cur != stop {
            let next = self.next_of(cur);
            if next.is_none() {
                break;
            }
            if self.node(cur).payload == self.node(next).payload
                && self.touches(cur, self.range_of(next).min())
            {
                let max = self.range_of(next).max();
                self.unlink(next);
                self.set_max(cur, max);
                if next == stop {
                    break;
                }
                continue;
            }
            if next == stop {
                break;
            }
            cur = next;
        }
    }

    // ------------------------------------------------------------------
    // Node plumbing
    // ------------------------------------------------------------------

    #[inline]
    fn node(&self, idx: Idx) -> &Node<M, P, Idx> {
        self.storage.get(idx).expect("invalid range node")
    }

    #[inline]
    fn node_mut(&mut self, idx: Idx) -> &mut Node<M, P, Idx> {
        self.storage.get_mut(idx).expect("invalid range node")
    }

    #[inline]
    fn entry(&self, idx: Idx) -> (Interval<M>, &P) {
        let n = self.node(idx);
        (n.range, &n.payload)
    }

    #[inline]
    fn range_of(&self, idx: Idx) -> Interval<M> {
        self.node(idx).range
    }

    #[inline]
    fn next_of(&self, idx: Idx) -> Idx {
        self.node(idx).next
    }

    #[inline]
    fn prev_of(&self, idx: Idx) -> Idx {
        self.node(idx).prev
    }

    /// `idx` ends right before `point`. Requires `idx.max < point`.
    #[inline]
    fn touches(&self, idx: Idx, point: M) -> bool {
        self.range_of(idx).max().succ() == point
    }

    /// Node with the greatest `min <= target`, or NONE.
    fn lower_bound(&self, target: M) -> Idx {
        let mut best = Idx::NONE;
        let mut cur = self.tree.root();
        while cur.is_some() {
            let n = self.node(cur);
            if n.range.min() <= target {
                best = cur;
                if n.range.max() >= target {
                    break;
                }
                cur = n.right;
            } else {
                cur = n.left;
            }
        }
        best
    }

    fn set_range(&mut self, idx: Idx, range: Interval<M>) {
        self.node_mut(idx).range = range;
        self.tree.ripple(&mut self.storage, idx);
    }

    fn set_min(&mut self, idx: Idx, min: M) {
        let mut range = self.range_of(idx);
        range.set_min(min);
        self.set_range(idx, range);
    }

    fn set_max(&mut self, idx: Idx, max: M) {
        let mut range = self.range_of(idx);
        range.set_max(max);
        self.set_range(idx, range);
    }

    /// Links a new node right after `spot`.
    ///
    /// The in-order successor of `spot` is either its free right slot or the
    /// free left slot of its list successor.
    fn place_after(&mut self, spot: Idx, range: Interval<M>, payload: P) -> Idx {
        let idx = self.storage.insert(Node::new(range, payload));
        let (parent, side) = if self.node(spot).right.is_none() {
            (spot, Side::Right)
        } else {
            (self.next_of(spot), Side::Left)
        };
        self.tree.insert(&mut self.storage, parent, side, idx);
        self.list.insert_after(&mut self.storage, spot, idx);
        idx
    }

    /// Links a new node right before `spot`, or at the end if `spot` is NONE.
    fn place_before(&mut self, spot: Idx, range: Interval<M>, payload: P) -> Idx {
        let idx = self.storage.insert(Node::new(range, payload));
        if spot.is_none() {
            let tail = self.list.tail();
            self.tree.insert(&mut self.storage, tail, Side::Right, idx);
            self.list.push_back(&mut self.storage, idx);
        } else {
            let (parent, side) = if self.node(spot).left.is_none() {
                (spot, Side::Left)
            } else {
                (self.prev_of(spot), Side::Right)
            };
            self.tree.insert(&mut self.storage, parent, side, idx);
            self.list.insert_before(&mut self.storage, spot, idx);
        }
        idx
    }

    /// Splits `idx` so that `at` starts a new node with a copy of the
    /// payload. Returns the new node. Requires `min < at <= max`.
    fn split(&mut self, idx: Idx, at: M) -> Idx {
        let span = self.range_of(idx);
        let payload = self.node(idx).payload.clone();
        self.set_max(idx, at.pred());
        self.place_after(idx, Interval::new(at, span.max()), payload)
    }

    /// Merges the successor of `idx` into it if they touch with equal payloads.
    fn absorb_next(&mut self, idx: Idx) {
        let next = self.next_of(idx);
        if next.is_some()
            && self.node(next).payload == self.node(idx).payload
            && self.touches(idx, self.range_of(next).min())
        {
            let max = self.range_of(next).max();
            self.unlink(next);
            self.set_max(idx, max);
        }
    }

    fn unlink(&mut self, idx: Idx) {
        self.tree.remove(&mut self.storage, idx);
        self.list.remove(&mut self.storage, idx);
        self.storage.remove(idx);
    }
}

impl<M, P, S, Idx> Extend<(Interval<M>, P)> for DiscreteSpace<M, P, S, Idx>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
    Idx: Index,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    /// Marks each pair in turn.
    fn extend<I: IntoIterator<Item = (Interval<M>, P)>>(&mut self, iter: I) {
        for (range, payload) in iter {
            self.mark(range, payload);
        }
    }
}

impl<M, P> FromIterator<(Interval<M>, P)> for DiscreteSpace<M, P>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
{
    fn from_iter<I: IntoIterator<Item = (Interval<M>, P)>>(iter: I) -> Self {
        let mut space = Self::new();
        space.extend(iter);
        space
    }
}

impl<M, P, S, Idx> fmt::Debug for DiscreteSpace<M, P, S, Idx>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default + fmt::Debug,
    Idx: Index,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, M, P, S, Idx> IntoIterator for &'a DiscreteSpace<M, P, S, Idx>
where
    M: DiscreteMetric,
    P: Clone + PartialEq + Default,
    Idx: Index,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    type Item = (Interval<M>, &'a P);
    type IntoIter = Iter<'a, M, P, S, Idx>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the intervals of a [`DiscreteSpace`], in ascending order.
pub struct Iter<'a, M: 'a, P: 'a, S, Idx: Index + 'a> {
    storage: &'a S,
    indices: Indices<'a, Node<M, P, Idx>, S, Idx>,
}

impl<'a, M, P, S, Idx> Iter<'a, M, P, S, Idx>
where
    M: DiscreteMetric + 'a,
    P: 'a,
    Idx: Index + 'a,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    #[inline]
    fn entry(&self, idx: Idx) -> (Interval<M>, &'a P) {
        let storage: &'a S = self.storage;
        let n = storage.get(idx).expect("invalid range node");
        (n.range, &n.payload)
    }
}

impl<'a, M, P, S, Idx> Iterator for Iter<'a, M, P, S, Idx>
where
    M: DiscreteMetric + 'a,
    P: 'a,
    Idx: Index + 'a,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    type Item = (Interval<M>, &'a P);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.indices.next()?;
        Some(self.entry(idx))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl<'a, M, P, S, Idx> DoubleEndedIterator for Iter<'a, M, P, S, Idx>
where
    M: DiscreteMetric + 'a,
    P: 'a,
    Idx: Index + 'a,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let idx = self.indices.next_back()?;
        Some(self.entry(idx))
    }
}

impl<'a, M, P, S, Idx> ExactSizeIterator for Iter<'a, M, P, S, Idx>
where
    M: DiscreteMetric + 'a,
    P: 'a,
    Idx: Index + 'a,
    S: Storage<Node<M, P, Idx>, Index = Idx>,
{
}

/// Iterators are equal when they are at the same position of the same space.
impl<'a, M: 'a, P: 'a, S, Idx: Index + 'a> PartialEq for Iter<'a, M, P, S, Idx> {
    fn eq(&self, other: &Self) -> bool {
        self.indices == other.indices
    }
}

impl<'a, M: 'a, P: 'a, S, Idx: Index + 'a> Eq for Iter<'a, M, P, S, Idx> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    type Space = DiscreteSpace<u32, u32>;

    fn iv(min: u32, max: u32) -> Interval<u32> {
        Interval::new(min, max)
    }

    fn layout(space: &Space) -> Vec<(u32, u32, u32)> {
        space.iter().map(|(r, &p)| (r.min(), r.max(), p)).collect()
    }

    fn check(space: &Space) {
        if let Err(e) = space.validate() {
            panic!("broken range space: {e}\n{space:?}");
        }
    }

    #[test]
    fn empty_space() {
        let space = Space::new();
        assert!(space.is_empty());
        assert_eq!(space.count(), 0);
        assert_eq!(space.find(0), None);
        assert_eq!(space.first(), None);
        assert_eq!(space.last(), None);
        assert_eq!(space.iter().next(), None);
        check(&space);
    }

    #[test]
    fn empty_range_is_noop() {
        let mut space = Space::new();
        space.mark(iv(10, 20), 1);
        space
            .mark(Interval::empty(), 2)
            .fill(Interval::empty(), 3)
            .erase(Interval::empty())
            .blend(Interval::empty(), &4, |p, c| {
                *p = *c;
                true
            });
        assert_eq!(layout(&space), [(10, 20, 1)]);
    }

    #[test]
    fn mark_splits_containing_node() {
        let mut space = Space::new();
        space.mark(iv(0, 255), 1);
        space.mark(iv(12, 25), 2);
        check(&space);
        assert_eq!(layout(&space), [(0, 11, 1), (12, 25, 2), (26, 255, 1)]);
        assert_eq!(space.find(21), Some(&2));
    }

    #[test]
    fn mark_coalesces_both_sides() {
        let mut space = Space::new();
        space.mark(iv(0, 9), 1).mark(iv(20, 29), 1).mark(iv(10, 19), 1);
        check(&space);
        assert_eq!(layout(&space), [(0, 29, 1)]);

        // Overlapping same-payload marks collapse as well.
        space.mark(iv(25, 40), 1).mark(iv(35, 50), 1);
        assert_eq!(layout(&space), [(0, 50, 1)]);
    }

    #[test]
    fn mark_swallows_covered_nodes() {
        let mut space = Space::new();
        for i in 0..10 {
            space.mark(iv(i * 10, i * 10 + 4), i);
        }
        assert_eq!(space.count(), 10);

        space.mark(iv(3, 72), 99);
        check(&space);
        assert_eq!(
            layout(&space),
            [(0, 2, 0), (3, 72, 99), (73, 74, 7), (80, 84, 8), (90, 94, 9)]
        );
    }

    #[test]
    fn mark_absorbs_right_straddler_with_same_payload() {
        let mut space = Space::new();
        space.mark(iv(0, 4), 1).mark(iv(10, 30), 2).mark(iv(40, 50), 3);
        space.mark(iv(2, 20), 2);
        check(&space);
        assert_eq!(layout(&space), [(0, 1, 1), (2, 30, 2), (40, 50, 3)]);
    }

    #[test]
    fn mark_at_metric_bounds() {
        let mut space: DiscreteSpace<u8, u8> = DiscreteSpace::new();
        space.mark(Interval::ALL, 1);
        space.mark(Interval::new(0, 0), 2);
        space.mark(Interval::new(255, 255), 3);
        assert!(space.validate().is_ok());
        let got: Vec<_> = space.iter().map(|(r, &p)| (r.min(), r.max(), p)).collect();
        assert_eq!(got, [(0, 0, 2), (1, 254, 1), (255, 255, 3)]);

        space.mark(Interval::ALL, 1);
        assert_eq!(space.count(), 1);
        assert_eq!(space.find(255), Some(&1));
    }

    #[test]
    fn fill_only_touches_gaps() {
        let mut space = Space::new();
        space.mark(iv(10, 19), 1).mark(iv(30, 39), 2);
        space.fill(iv(0, 50), 9);
        check(&space);
        assert_eq!(
            layout(&space),
            [(0, 9, 9), (10, 19, 1), (20, 29, 9), (30, 39, 2), (40, 50, 9)]
        );
    }

    #[test]
    fn fill_joins_equal_neighbours() {
        let mut space = Space::new();
        space.mark(iv(0, 9), 5).mark(iv(20, 29), 5).mark(iv(40, 49), 6);
        space.fill(iv(5, 45), 5);
        check(&space);
        assert_eq!(layout(&space), [(0, 39, 5), (40, 49, 6)]);
    }

    #[test]
    fn fill_inside_mapped_range_is_noop() {
        let mut space = Space::new();
        space.mark(iv(0, 100), 1);
        space.fill(iv(10, 20), 2);
        assert_eq!(layout(&space), [(0, 100, 1)]);
    }

    #[test]
    fn fill_skips_touching_nodes() {
        let mut space = Space::new();
        space.mark(iv(0, 9), 1).mark(iv(10, 19), 2).mark(iv(25, 29), 3);
        space.fill(iv(5, 27), 4);
        check(&space);
        assert_eq!(
            layout(&space),
            [(0, 9, 1), (10, 19, 2), (20, 24, 4), (25, 29, 3)]
        );
    }

    #[test]
    fn blend_or_bits() {
        let or = |p: &mut u32, c: &u32| {
            *p |= *c;
            true
        };
        let mut space = Space::new();
        space.blend(iv(10, 19), &0x1, or);
        space.blend(iv(30, 39), &0x2, or);
        space.blend(iv(0, 50), &0x4, or);
        check(&space);
        assert_eq!(
            layout(&space),
            [(0, 9, 4), (10, 19, 5), (20, 29, 4), (30, 39, 6), (40, 50, 4)]
        );

        // Blending the mixed nodes back to a common value collapses them.
        space.blend(iv(0, 50), &0x7, or);
        check(&space);
        assert_eq!(layout(&space), [(0, 50, 7)]);
    }

    #[test]
    fn blend_collapses_into_left_neighbour() {
        let set = |p: &mut u32, c: &u32| {
            *p = *c;
            true
        };
        let mut space = Space::new();
        space.mark(iv(0, 9), 1).mark(iv(10, 19), 2).mark(iv(20, 29), 3);

        // Right-extending blend that turns the middle node into its left
        // neighbour's payload.
        space.blend(iv(10, 25), &1, set);
        check(&space);
        assert_eq!(layout(&space), [(0, 25, 1), (26, 29, 3)]);
    }

    #[test]
    fn blend_false_uncolors() {
        let clear_bits = |p: &mut u32, c: &u32| {
            *p &= !*c;
            *p != 0
        };
        let mut space = Space::new();
        space.mark(iv(0, 9), 0x3).mark(iv(10, 19), 0x1).mark(iv(20, 29), 0x2);
        space.blend(iv(5, 24), &0x1, clear_bits);
        check(&space);
        assert_eq!(layout(&space), [(0, 4, 3), (5, 9, 2), (20, 29, 2)]);
    }

    #[test]
    fn erase_trims_and_removes() {
        let mut space = Space::new();
        space.mark(iv(0, 9), 1).mark(iv(10, 19), 2).mark(iv(20, 29), 3);
        space.erase(iv(5, 24));
        check(&space);
        assert_eq!(layout(&space), [(0, 4, 1), (25, 29, 3)]);

        space.erase(iv(0, 100));
        assert!(space.is_empty());
        check(&space);
    }

    #[test]
    fn erase_inside_node_splits_it() {
        let mut space = Space::new();
        space.mark(iv(0, 100), 1);
        space.erase(iv(40, 60));
        check(&space);
        assert_eq!(layout(&space), [(0, 39, 1), (61, 100, 1)]);
        assert_eq!(space.find(50), None);
    }

    #[test]
    fn clear_releases_and_allows_reuse() {
        let mut space = Space::with_capacity(8);
        for i in 0..8 {
            space.mark(iv(i * 4, i * 4 + 1), i);
        }
        space.clear();
        assert!(space.is_empty());
        assert_eq!(space.find(4), None);
        check(&space);

        space.mark(iv(1, 2), 7);
        assert_eq!(layout(&space), [(1, 2, 7)]);
    }

    #[test]
    fn iteration_both_ways() {
        let mut space = Space::new();
        space.mark(iv(0, 1), 1).mark(iv(5, 6), 2).mark(iv(9, 9), 3);

        let fwd: Vec<u32> = space.iter().map(|(_, &p)| p).collect();
        let rev: Vec<u32> = space.iter().rev().map(|(_, &p)| p).collect();
        assert_eq!(fwd, [1, 2, 3]);
        assert_eq!(rev, [3, 2, 1]);
        assert_eq!(space.iter().len(), 3);

        let mut it = space.iter();
        assert_eq!(it.next().map(|(r, _)| r), Some(iv(0, 1)));
        assert_eq!(it.next_back().map(|(r, _)| r), Some(iv(9, 9)));
        assert_eq!(it.next().map(|(r, _)| r), Some(iv(5, 6)));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);

        assert_eq!(space.first(), Some((iv(0, 1), &1)));
        assert_eq!(space.last(), Some((iv(9, 9), &3)));
        assert_eq!((&space).into_iter().count(), space.count());
    }

    #[test]
    fn iteration_over_borrowed_payloads() {
        let names = [String::from("lan"), String::from("dmz")];
        let mut space: DiscreteSpace<u16, &str> = DiscreteSpace::new();
        space.mark(Interval::new(0, 99), &names[0]);
        space.mark(Interval::new(50, 59), &names[1]);

        let fwd: Vec<&str> = space.iter().map(|(_, &p)| p).collect();
        assert_eq!(fwd, ["lan", "dmz", "lan"]);
        let last = space.iter().next_back().map(|(r, &p)| (r, p));
        assert_eq!(last, Some((Interval::new(60, 99), "lan")));
        assert_eq!(space.iter().len(), 3);
    }

    #[test]
    fn find_entry_returns_maximal_interval() {
        let space: Space = [(iv(0, 9), 1), (iv(10, 19), 1), (iv(30, 39), 2)]
            .into_iter()
            .collect();
        assert_eq!(space.find_entry(15), Some((iv(0, 19), &1)));
        assert_eq!(space.find_entry(25), None);
    }

    #[cfg(feature = "slab")]
    #[test]
    fn slab_storage() {
        let mut space: DiscreteSpace<u32, u32, slab::Slab<Node<u32, u32, usize>>, usize> =
            DiscreteSpace::with_storage(slab::Slab::new());
        space.mark(iv(0, 99), 1).mark(iv(20, 29), 2).erase(iv(50, 59));
        assert!(space.validate().is_ok());
        assert_eq!(space.count(), 4);
        assert_eq!(space.find(25), Some(&2));
    }

    #[test]
    fn random_ops_match_model() {
        const SIZE: usize = 512;
        let mut rng = SmallRng::seed_from_u64(0xd15c);
        let mut space = Space::new();
        let mut model: Vec<Option<u32>> = vec![None; SIZE];

        for step in 0..3000 {
            let a = rng.random_range(0..SIZE as u32);
            let b = rng.random_range(a..(a + 40).min(SIZE as u32));
            let payload = rng.random_range(0..4u32);
            let points = a as usize..=b as usize;

            match rng.random_range(0..4) {
                0 => {
                    space.mark(iv(a, b), payload);
                    model[points].iter_mut().for_each(|p| *p = Some(payload));
                }
                1 => {
                    space.fill(iv(a, b), payload);
                    model[points]
                        .iter_mut()
                        .filter(|p| p.is_none())
                        .for_each(|p| *p = Some(payload));
                }
                2 => {
                    space.blend(iv(a, b), &payload, |p, c| {
                        *p ^= *c;
                        *p != 0
                    });
                    for p in &mut model[points] {
                        let v = p.unwrap_or(0) ^ payload;
                        *p = (v != 0).then_some(v);
                    }
                }
                _ => {
                    space.erase(iv(a, b));
                    model[points].iter_mut().for_each(|p| *p = None);
                }
            }

            if step % 100 == 0 {
                check(&space);
            }
        }

        check(&space);
        for (point, want) in model.iter().enumerate() {
            assert_eq!(space.find(point as u32), want.as_ref(), "point {point}");
        }
    }

    #[test]
    #[ignore]
    fn bench_find_and_mark() {
        use hdrhistogram::Histogram;
        use std::time::Instant;

        const RANGES: u32 = 10_000;
        const ITERATIONS: usize = 100_000;

        let mut space = Space::with_capacity(RANGES as usize * 2);
        for i in 0..RANGES {
            space.mark(iv(i * 16, i * 16 + 7), i % 7);
        }
        let mut rng = SmallRng::seed_from_u64(7);

        let mut find_hist = Histogram::<u64>::new(3).unwrap();
        let mut mark_hist = Histogram::<u64>::new(3).unwrap();

        for _ in 0..ITERATIONS {
            let point = rng.random_range(0..RANGES * 16);

            let start = Instant::now();
            let _ = std::hint::black_box(space.find(point));
            find_hist.record(start.elapsed().as_nanos() as u64).unwrap();

            let start = Instant::now();
            space.mark(iv(point, point + 3), point % 7);
            mark_hist.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        println!("\nDiscreteSpace<u32, u32> ({ITERATIONS} iterations)");
        println!("---------------------------------------------------------");
        for (name, hist) in [("find", &find_hist), ("mark", &mark_hist)] {
            println!(
                "{:8} | p50: {:4} ns | p99: {:4} ns | p999: {:5} ns",
                name,
                hist.value_at_quantile(0.50),
                hist.value_at_quantile(0.99),
                hist.value_at_quantile(0.999),
            );
        }
        assert!(space.validate().is_ok());
    }
}
