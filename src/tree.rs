use crate::allocator::SiblingGroupAllocator;
use crate::relations::no_nodes_until_uniform_level;
use crate::{ChildPos, LevelIdx, Location, NodeIdx, SiblingsIdx, TreeError};

/// A contiguous run of `2^ND` sibling nodes (or just the root), as created by one [`Tree::refine`].
///
/// This is what [`Tree::refine`] and [`Tree::coarsen`] hand back so that callers can interpolate or restrict their own
/// per-node payload between the parent and its children.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SiblingGroup {
    /// The node the group belongs to. Invalid for the root group.
    pub parent: NodeIdx,
    pub group: SiblingsIdx,
    first: NodeIdx,
    len: u32,
}

impl SiblingGroup {
    #[inline]
    pub fn first(&self) -> NodeIdx {
        self.first
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`: every group holds at least one node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The sibling at `position`.
    #[inline]
    pub fn get(&self, position: ChildPos) -> NodeIdx {
        assert!(
            (position.get() as u32) < self.len,
            "child position {:?} out of bounds for a group of {} nodes",
            position,
            self.len
        );
        self.first.offset(position.get() as u32)
    }

    #[inline]
    pub fn contains(&self, n: NodeIdx) -> bool {
        n >= self.first && n < self.first.offset(self.len)
    }

    /// The nodes of the group in Morton order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = NodeIdx> + Clone {
        let first = self.first;
        (0..self.len).map(move |i| first.offset(i))
    }
}

/// An index-based orthtree: a binary tree (`ND = 1`), quadtree (`ND = 2`) or octree (`ND = 3`).
///
/// The tree only stores topology. Each node knows its first child, and the `2^ND` children of a node are stored
/// contiguously in Morton order, so a single index per node plus a single parent index per sibling group is enough to
/// walk the tree in both directions. Payload lives in caller-owned arrays indexed by [`NodeIdx`].
///
/// The node array has a fixed capacity. Nodes are created in sibling groups by [`Tree::refine`] and destroyed by
/// [`Tree::coarsen`]; freed groups are reused lowest-index first. [`Tree::dfs_sort`](crate::Tree::dfs_sort) packs the
/// groups back into depth-first order.
#[derive(Clone, Debug)]
pub struct Tree<const ND: usize> {
    /// Index of the first child of each node. Invalid for leaves and for the nodes of free sibling groups.
    first_children: Vec<NodeIdx>,
    /// Parent links of the sibling groups and the free watermark.
    groups: SiblingGroupAllocator<ND>,
    /// Number of nodes in use.
    size: u32,
}

impl<const ND: usize> Tree<ND> {
    /// Number of children of every non-leaf node.
    pub const CHILDREN: u32 = 1 << ND;

    const DIMENSION_CHECK: () = assert!(ND >= 1 && ND <= 3, "orthtrees are only supported in 1, 2 and 3 dimensions");

    /// Creates a tree holding only the root node, with room for at least `capacity` nodes.
    ///
    /// The capacity is rounded up to a whole number of sibling groups.
    pub fn new(capacity: u32) -> Self {
        let () = Self::DIMENSION_CHECK;

        let num_groups = SiblingGroupAllocator::<ND>::groups_for_nodes(capacity);
        assert!(num_groups > 0, "cannot construct a tree with zero capacity");
        let capacity = SiblingGroupAllocator::<ND>::nodes_in_groups(num_groups);

        Self {
            first_children: vec![NodeIdx::INVALID; capacity as usize],
            groups: SiblingGroupAllocator::new(num_groups),
            size: 1,
        }
    }

    /// Creates a tree with room for at least `capacity` nodes and refines it uniformly down to `level`.
    ///
    /// Nodes are created breadth-first, so the children of the root are `1..=2^ND` and so on.
    pub fn uniformly_refined(level: LevelIdx, capacity: u32) -> Result<Self, TreeError> {
        let mut tree = Self::new(capacity);
        let mut frontier = vec![NodeIdx::ROOT];
        for _ in 0..level.index() {
            let mut next = Vec::with_capacity(frontier.len() * Self::CHILDREN as usize);
            for n in frontier {
                next.extend(tree.refine(n)?.iter());
            }
            frontier = next;
        }
        Ok(tree)
    }

    /// Number of nodes in a tree uniformly refined down to `level`.
    ///
    /// Panics if that many nodes cannot be addressed by a [`NodeIdx`].
    pub fn uniform_capacity(level: LevelIdx) -> u32 {
        no_nodes_until_uniform_level(ND, level)
            .and_then(|nodes| u32::try_from(nodes).ok())
            .filter(|&nodes| nodes < u32::MAX)
            .unwrap_or_else(|| panic!("a tree uniformly refined to level {} exceeds the node index range", level))
    }

    /// Maximum number of nodes the tree can hold.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.first_children.len() as u32
    }

    /// Number of nodes in use.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of nodes that can still be created.
    #[inline]
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity() - self.size
    }

    /// Maximum number of sibling groups the tree can hold.
    #[inline]
    pub fn sibling_group_capacity(&self) -> u32 {
        self.groups.num_groups()
    }

    #[inline]
    pub fn is_root(&self, n: NodeIdx) -> bool {
        n == NodeIdx::ROOT
    }

    /// Is `n` part of a sibling group that is not in use?
    #[inline]
    pub fn is_free(&self, n: NodeIdx) -> bool {
        self.assert_in_bounds(n);
        self.groups.is_free(Self::sibling_group(n))
    }

    #[inline]
    pub fn is_leaf(&self, n: NodeIdx) -> bool {
        self.assert_in_bounds(n);
        !self.first_children[n.index()].is_valid()
    }

    /// The sibling group that holds node `n`.
    #[inline]
    pub fn sibling_group(n: NodeIdx) -> SiblingsIdx {
        SiblingGroupAllocator::<ND>::group_of(n)
    }

    /// The first node of sibling group `s`.
    #[inline]
    pub fn first_node(s: SiblingsIdx) -> NodeIdx {
        SiblingGroupAllocator::<ND>::first_node(s)
    }

    /// Position of `n` among its siblings.
    ///
    /// Panics if `n` is the root.
    #[inline]
    pub fn position_in_parent(&self, n: NodeIdx) -> ChildPos {
        assert!(!self.is_root(n), "the root node has no position in a parent");
        ChildPos::from_bits(((n.index() as u32 - 1) % Self::CHILDREN) as u8)
    }

    /// The parent of node `n`.
    ///
    /// Panics if `n` is the root.
    #[inline]
    pub fn parent(&self, n: NodeIdx) -> NodeIdx {
        assert!(!self.is_root(n), "the root node has no parent");
        self.groups.parent(Self::sibling_group(n))
    }

    /// The parent node of sibling group `s`. Invalid for free groups and for the root group.
    #[inline]
    pub fn parent_of_group(&self, s: SiblingsIdx) -> NodeIdx {
        self.groups.parent(s)
    }

    /// The child of `n` at `position`, or [`NodeIdx::INVALID`] if `n` is a leaf.
    #[inline]
    pub fn child(&self, n: NodeIdx, position: ChildPos) -> NodeIdx {
        self.assert_in_bounds(n);
        debug_assert!(
            (position.get() as u32) < Self::CHILDREN,
            "child position {:?} out of bounds [0, {})",
            position,
            Self::CHILDREN
        );
        let first = self.first_children[n.index()];
        if first.is_valid() {
            first.offset(position.get() as u32)
        } else {
            NodeIdx::INVALID
        }
    }

    /// The sibling group holding the children of `n`, or [`SiblingsIdx::INVALID`] if `n` is a leaf.
    #[inline]
    pub fn children_group(&self, n: NodeIdx) -> SiblingsIdx {
        self.assert_in_bounds(n);
        let first = self.first_children[n.index()];
        if first.is_valid() {
            Self::sibling_group(first)
        } else {
            SiblingsIdx::INVALID
        }
    }

    /// The children of `n`, or `None` if `n` is a leaf.
    #[inline]
    pub fn children(&self, n: NodeIdx) -> Option<SiblingGroup> {
        let s = self.children_group(n);
        s.is_valid().then(|| self.group(s))
    }

    /// The sibling group of `n`, which includes `n` itself.
    #[inline]
    pub fn siblings(&self, n: NodeIdx) -> SiblingGroup {
        self.group(Self::sibling_group(n))
    }

    /// A handle over the nodes of sibling group `s`.
    #[inline]
    pub fn group(&self, s: SiblingsIdx) -> SiblingGroup {
        assert!(
            (s.index() as u32) < self.sibling_group_capacity(),
            "sibling group {:?} is out of bounds [0, {})",
            s,
            self.sibling_group_capacity()
        );
        SiblingGroup {
            parent: self.groups.parent(s),
            group: s,
            first: Self::first_node(s),
            len: SiblingGroupAllocator::<ND>::group_len(s),
        }
    }

    /// Distance from the root to `n`. Never deeper than [`Location::max_level`].
    pub fn level(&self, n: NodeIdx) -> LevelIdx {
        let mut level = 0u8;
        let mut n = n;
        while !self.is_root(n) {
            n = self.parent(n);
            level += 1;
        }
        LevelIdx::new(level)
    }

    /// All nodes in use, in storage order. Works on trees that are not compact.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.groups
            .groups_in_use()
            .flat_map(move |s| self.group(s).iter())
    }

    /// All leaves in use, in storage order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes().filter(move |&n| self.is_leaf(n))
    }

    /// The lowest sibling group that is not in use.
    #[inline]
    pub fn first_free_sibling_group(&self) -> SiblingsIdx {
        self.groups.first_free()
    }

    /// Overrides the free watermark. Every group below `s` must be in use.
    pub fn set_first_free_sibling_group(&mut self, s: SiblingsIdx) {
        self.groups.set_first_free(s);
    }

    /// Are the sibling groups in use packed at the front of the node array, without gaps?
    pub fn is_compact(&self) -> bool {
        let result = self.groups.first_free() == Self::sibling_group(NodeIdx::new(self.size));
        debug_assert_eq!(
            result,
            self.groups.groups_in_use().count() as u32 == self.groups.first_free().index() as u32,
            "free watermark {:?} is inconsistent with the groups in use",
            self.groups.first_free()
        );
        result
    }

    /// Creates the `2^ND` children of leaf `n`, reusing the lowest free sibling group.
    ///
    /// The new children are leaves. The returned group lets the caller initialize their payload from the parent.
    ///
    /// Fails if the capacity is exhausted; the tree never grows on its own. Panics if `n` is free, not a leaf, or
    /// already at [`Location::max_level`].
    pub fn refine(&mut self, n: NodeIdx) -> Result<SiblingGroup, TreeError> {
        assert!(!self.is_free(n), "node {}: is free and cannot be refined", n);
        assert!(self.is_leaf(n), "node {}: is not a leaf and cannot be refined", n);
        assert!(
            self.level(n) < Location::<ND>::max_level(),
            "node {}: is at the maximum level {} and cannot be refined",
            n,
            Location::<ND>::max_level()
        );

        let Some(s) = self.groups.allocate(n) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(node = %n, capacity = self.capacity(), "tree capacity exhausted");
            return Err(TreeError::CapacityExhausted {
                node: n,
                capacity: self.capacity(),
            });
        };

        let children = self.group(s);
        debug_assert!(
            children.iter().all(|c| self.is_leaf(c)),
            "node {}: reused sibling group {:?} still has children",
            n,
            s
        );
        self.first_children[n.index()] = children.first();
        self.size += Self::CHILDREN;
        Ok(children)
    }

    /// Removes the children of `n`, which must all be leaves, and returns their sibling group to the free pool.
    ///
    /// The returned group can still be read to restrict payload onto `n`, but its slots will be reused by the next
    /// [`Tree::refine`].
    pub fn coarsen(&mut self, n: NodeIdx) -> SiblingGroup {
        assert!(!self.is_free(n), "node {}: is free and cannot be coarsened", n);
        assert!(!self.is_leaf(n), "node {}: is a leaf and cannot be coarsened", n);

        let children = self.group(self.children_group(n));
        assert!(
            children.iter().all(|c| self.is_leaf(c)),
            "node {}: cannot be coarsened because some of its children have children",
            n
        );

        self.groups.free(children.group);
        self.first_children[n.index()] = NodeIdx::INVALID;
        self.size -= Self::CHILDREN;
        children
    }

    /// Swaps the storage location of sibling groups `a` and `b`, relinking their parents and children.
    ///
    /// Node handles inside both groups change meaning; callers keeping payload must swap it node by node.
    pub fn swap(&mut self, a: SiblingsIdx, b: SiblingsIdx) {
        self.swap_groups(a, b);
        self.groups.swapped(a, b);
    }

    /// Same as [`Tree::swap`] but leaves the free watermark stale.
    pub(crate) fn swap_groups(&mut self, a: SiblingsIdx, b: SiblingsIdx) {
        assert!(
            a.index() != 0 && b.index() != 0,
            "the root sibling group cannot be swapped"
        );
        assert_ne!(a, b, "cannot swap sibling group {:?} with itself", a);

        if self.groups.is_free(a) && self.groups.is_free(b) {
            return;
        }

        // Children -> sibling edges.
        let (first_a, first_b) = (Self::first_node(a), Self::first_node(b));
        for i in 0..Self::CHILDREN {
            let (l, r) = (first_a.offset(i), first_b.offset(i));
            self.first_children.swap(l.index(), r.index());
            self.adopt_children(l);
            self.adopt_children(r);
        }

        // Parent -> sibling edges.
        let (parent_a, parent_b) = (self.groups.parent(a), self.groups.parent(b));
        self.link(parent_a, b);
        self.link(parent_b, a);
    }

    fn adopt_children(&mut self, n: NodeIdx) {
        let s = self.children_group(n);
        if s.is_valid() {
            self.groups.set_parent(s, n);
        }
    }

    fn link(&mut self, parent: NodeIdx, s: SiblingsIdx) {
        if parent.is_valid() {
            self.first_children[parent.index()] = Self::first_node(s);
        }
        self.groups.set_parent(s, parent);
    }

    #[inline]
    fn assert_in_bounds(&self, n: NodeIdx) {
        assert!(
            n.is_valid() && n.index() < self.first_children.len(),
            "node {:?} is out of bounds [0, {})",
            n,
            self.capacity()
        );
    }
}

/// Graph equality: both trees link the same parents and children, node by node in storage order.
impl<const ND: usize> PartialEq for Tree<ND> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        self.nodes().zip(other.nodes()).all(|(a, b)| {
            let same_parent = match (self.is_root(a), other.is_root(b)) {
                (true, true) => true,
                (false, false) => self.parent(a) == other.parent(b),
                _ => false,
            };
            same_parent && self.first_children[a.index()] == other.first_children[b.index()]
        })
    }
}

impl<const ND: usize> Eq for Tree<ND> {}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use crate::{BinaryTree, OctTree, QuadTree};

    fn n(i: u32) -> NodeIdx {
        NodeIdx::new(i)
    }

    #[test]
    fn construction() {
        let tree = QuadTree::new(1);
        assert_eq!(tree.capacity(), 1);
        assert_eq!(tree.size(), 1);
        assert!(tree.is_leaf(NodeIdx::ROOT));
        assert!(tree.is_root(NodeIdx::ROOT));
        assert!(!tree.is_free(NodeIdx::ROOT));
        assert!(tree.is_compact());
        assert_eq!(tree.level(NodeIdx::ROOT), LevelIdx::new(0));
    }

    #[test]
    fn capacity_is_rounded_to_sibling_groups() {
        let capacities: Vec<_> = (1..=13).map(|c| QuadTree::new(c).capacity()).collect();
        assert_eq!(capacities, [1, 5, 5, 5, 5, 9, 9, 9, 9, 13, 13, 13, 13]);
        assert_eq!(OctTree::new(10).capacity(), 17);
        assert_eq!(BinaryTree::new(4).capacity(), 5);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        let _ = QuadTree::new(0);
    }

    #[test]
    fn refine_creates_leaf_children() {
        let mut tree = QuadTree::new(5);
        let children = tree.refine(NodeIdx::ROOT).unwrap();

        assert_eq!(children.parent, NodeIdx::ROOT);
        assert_eq!(children.group, SiblingsIdx::new(1));
        assert_eq!(children.iter().collect::<Vec<_>>(), [n(1), n(2), n(3), n(4)]);
        assert_eq!(children.get(ChildPos::new::<2>(2)), n(3));
        assert!(children.contains(n(4)) && !children.contains(n(5)));
        assert_eq!(tree.parent_of_group(children.group), NodeIdx::ROOT);
        assert_eq!(QuadTree::first_node(children.group), n(1));
        assert_eq!(QuadTree::sibling_group(n(4)), children.group);
        assert_eq!(tree.size(), 5);
        assert!(!tree.is_leaf(NodeIdx::ROOT));
        for (i, c) in children.iter().enumerate() {
            assert!(tree.is_leaf(c));
            assert_eq!(tree.parent(c), NodeIdx::ROOT);
            assert_eq!(tree.position_in_parent(c).get() as usize, i);
            assert_eq!(tree.child(NodeIdx::ROOT, tree.position_in_parent(c)), c);
            assert_eq!(tree.level(c), LevelIdx::new(1));
        }
        assert_eq!(tree.child(n(1), ChildPos::new::<2>(0)), NodeIdx::INVALID);
        assert_eq!(tree.children_group(n(1)), SiblingsIdx::INVALID);
        assert!(tree.children(n(1)).is_none());
        assert_eq!(tree.siblings(n(3)), children);
    }

    #[test]
    fn refine_fails_when_capacity_is_exhausted() {
        let mut tree = QuadTree::new(5);
        tree.refine(NodeIdx::ROOT).unwrap();
        assert_eq!(tree.remaining_capacity(), 0);
        assert_eq!(
            tree.refine(n(1)),
            Err(TreeError::CapacityExhausted {
                node: n(1),
                capacity: 5
            })
        );
        assert_eq!(tree.size(), 5);
        assert!(tree.is_leaf(n(1)));
    }

    #[test]
    #[should_panic]
    fn refine_non_leaf_panics() {
        let mut tree = QuadTree::new(9);
        tree.refine(NodeIdx::ROOT).unwrap();
        let _ = tree.refine(NodeIdx::ROOT);
    }

    /// Refines the first child of every level until a leaf at the maximum level is reached.
    fn deepest_quadtree(spare_groups: u32) -> (QuadTree, NodeIdx) {
        let max_level = Location::<2>::max_level();
        let mut tree = QuadTree::new(1 + 4 * (max_level.index() as u32 + spare_groups));
        let mut leaf = NodeIdx::ROOT;
        for _ in 0..max_level.index() {
            leaf = tree.refine(leaf).unwrap().first();
        }
        assert_eq!(tree.remaining_capacity(), 4 * spare_groups);
        (tree, leaf)
    }

    #[test]
    fn refine_down_to_the_maximum_level() {
        let (tree, leaf) = deepest_quadtree(0);
        assert_eq!(tree.level(leaf), LevelIdx::new(30));
        assert_eq!(tree.node_location(leaf).level(), Location::<2>::max_level());
        assert_eq!(tree.unique_node_neighbors(leaf).len(), 3);
    }

    #[test]
    #[should_panic(expected = "maximum level")]
    fn refine_past_the_maximum_level_panics() {
        let (mut tree, leaf) = deepest_quadtree(1);
        let _ = tree.refine(leaf);
    }

    #[test]
    fn uniform_capacity_at_the_node_index_limit() {
        assert_eq!(QuadTree::uniform_capacity(LevelIdx::new(15)), 1_431_655_765);
        assert_eq!(OctTree::uniform_capacity(LevelIdx::new(10)), 1_227_133_513);
    }

    #[test]
    #[should_panic(expected = "exceeds the node index range")]
    fn uniform_capacity_past_the_node_index_limit_panics() {
        let _ = QuadTree::uniform_capacity(LevelIdx::new(16));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "child position")]
    fn child_position_of_a_higher_dimension_panics() {
        let mut tree = QuadTree::new(5);
        tree.refine(NodeIdx::ROOT).unwrap();
        let _ = tree.child(NodeIdx::ROOT, ChildPos::new::<3>(7));
    }

    #[test]
    #[should_panic(expected = "exceed the node index range")]
    fn capacity_past_node_indices_panics() {
        let _ = QuadTree::new(u32::MAX);
    }

    #[test]
    #[should_panic]
    fn coarsen_with_grandchildren_panics() {
        let mut tree = QuadTree::new(9);
        tree.refine(NodeIdx::ROOT).unwrap();
        tree.refine(n(2)).unwrap();
        tree.coarsen(NodeIdx::ROOT);
    }

    #[test]
    fn uniform_sizes() {
        for level in 0..4 {
            let level = LevelIdx::new(level);
            let tree = QuadTree::uniformly_refined(level, QuadTree::uniform_capacity(level)).unwrap();
            assert_eq!(Some(tree.size() as usize), no_nodes_until_uniform_level(2, level));
            assert_eq!(tree.remaining_capacity(), 0);
            assert!(tree.is_compact());
        }
        let tree = QuadTree::uniformly_refined(LevelIdx::new(2), 21).unwrap();
        assert_eq!(tree.size(), 21);
        assert_eq!(tree.leaves().count(), 16);
        assert!(tree.leaves().all(|l| tree.level(l) == LevelIdx::new(2)));

        let tree = OctTree::uniformly_refined(LevelIdx::new(2), 73).unwrap();
        assert_eq!(tree.size(), 73);

        assert!(QuadTree::uniformly_refined(LevelIdx::new(2), 17).is_err());
    }

    #[test]
    fn refine_and_coarsen_sequence() {
        let mut tree = QuadTree::new(29);
        assert_eq!(tree.capacity(), 29);
        tree.refine(NodeIdx::ROOT).unwrap();
        for i in 1..=4 {
            tree.refine(n(i)).unwrap();
        }
        assert_eq!(tree.size(), 21);
        assert_eq!(tree, QuadTree::uniformly_refined(LevelIdx::new(2), 29).unwrap());

        tree.refine(n(8)).unwrap();
        tree.refine(n(17)).unwrap();
        assert_eq!(tree.size(), 29);
        assert!(tree.is_compact());
        assert_eq!(tree.parent(n(21)), n(8));
        assert_eq!(tree.parent(n(25)), n(17));
        assert_eq!(tree.level(n(25)), LevelIdx::new(3));
        assert_ne!(tree, QuadTree::uniformly_refined(LevelIdx::new(2), 29).unwrap());

        let freed = tree.coarsen(n(2));
        assert_eq!(freed.group, SiblingsIdx::new(3));
        assert_eq!(freed.parent, n(2));
        assert_eq!(tree.size(), 25);
        assert!(!tree.is_compact());
        assert!(tree.is_free(n(9)));

        tree.coarsen(n(3));
        assert_eq!(tree.size(), 21);
        assert!(!tree.is_compact());
        assert_eq!(tree.first_free_sibling_group(), SiblingsIdx::new(3));
        assert_eq!(tree.nodes().count(), 21);

        let copy = tree.clone();
        assert_eq!(tree, copy);
    }

    #[test]
    fn coarsen_then_refine_reuses_the_freed_group() {
        let mut tree = QuadTree::uniformly_refined(LevelIdx::new(1), 13).unwrap();
        let before = tree.clone();

        let children = tree.refine(n(3)).unwrap();
        assert_eq!(children.group, SiblingsIdx::new(2));
        let freed = tree.coarsen(n(3));
        assert_eq!(freed, children);
        assert_eq!(tree, before);
        assert_eq!(tree.first_free_sibling_group(), SiblingsIdx::new(2));

        let again = tree.refine(n(3)).unwrap();
        assert_eq!(again.group, children.group);
    }

    #[test]
    fn swap_relinks_parents_and_children() {
        let mut tree = QuadTree::new(17);
        tree.refine(NodeIdx::ROOT).unwrap(); // group 1
        tree.refine(n(1)).unwrap(); // group 2
        tree.refine(n(5)).unwrap(); // group 3
        tree.coarsen(n(5)); // group 3 free again
        tree.refine(n(4)).unwrap(); // group 3, children of 4

        tree.swap(SiblingsIdx::new(2), SiblingsIdx::new(3));
        assert_eq!(tree.children_group(n(1)), SiblingsIdx::new(3));
        assert_eq!(tree.children_group(n(4)), SiblingsIdx::new(2));
        assert_eq!(tree.parent(n(9)), n(1));
        assert_eq!(tree.parent(n(5)), n(4));
        assert!(tree.is_compact());

        tree.swap(SiblingsIdx::new(3), SiblingsIdx::new(4));
        assert_eq!(tree.children_group(n(1)), SiblingsIdx::new(4));
        assert!(tree.is_free(n(9)));
        assert!(!tree.is_compact());
        assert_eq!(tree.first_free_sibling_group(), SiblingsIdx::new(3));
    }
}
