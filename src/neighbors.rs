//! Neighbor search across faces, edges and corners.
//!
//! A [`Manifold`] picks which neighbors to look for: those sharing a face (`rank = ND - 1`), an edge, or a corner
//! (`rank = 0`). For each same-level offset of the manifold the search finds either the same-level neighbor, the
//! coarser leaf that covers it, or the finer children of the same-level neighbor that touch the shared feature.

use crate::relations::{max_no_neighbors, no_faces, no_nodes_sharing_face};
use crate::{ChildPos, LevelIdx, Location, NodeAt, NodeIdx, Tree};

use smallvec::SmallVec;

/// Upper bound on the neighbors of a node across all manifolds, for every supported dimension.
pub const MAX_NEIGHBORS: usize = max_no_neighbors(3);

/// Neighbor query results. Never spills to the heap.
pub type Neighbors = SmallVec<[NodeIdx; MAX_NEIGHBORS]>;

/// Same-level offsets and, per offset, the children of that neighbor touching the shared feature.
struct Stencil {
    offsets: &'static [&'static [i32]],
    children: &'static [&'static [u8]],
}

const STENCIL_1D_CORNER: Stencil = Stencil {
    offsets: &[&[-1], &[1]],
    children: &[&[1], &[0]],
};

const STENCIL_2D_FACE: Stencil = Stencil {
    offsets: &[&[-1, 0], &[1, 0], &[0, -1], &[0, 1]],
    children: &[&[1, 3], &[0, 2], &[2, 3], &[0, 1]],
};

const STENCIL_2D_CORNER: Stencil = Stencil {
    offsets: &[&[-1, -1], &[1, -1], &[-1, 1], &[1, 1]],
    children: &[&[3], &[2], &[1], &[0]],
};

const STENCIL_3D_FACE: Stencil = Stencil {
    offsets: &[
        &[-1, 0, 0],
        &[1, 0, 0],
        &[0, -1, 0],
        &[0, 1, 0],
        &[0, 0, -1],
        &[0, 0, 1],
    ],
    children: &[
        &[1, 3, 5, 7],
        &[0, 2, 4, 6],
        &[2, 3, 6, 7],
        &[0, 1, 4, 5],
        &[4, 5, 6, 7],
        &[0, 1, 2, 3],
    ],
};

const STENCIL_3D_EDGE: Stencil = Stencil {
    offsets: &[
        &[-1, -1, 0],
        &[1, -1, 0],
        &[-1, 1, 0],
        &[1, 1, 0],
        &[-1, 0, -1],
        &[1, 0, -1],
        &[0, -1, -1],
        &[0, 1, -1],
        &[-1, 0, 1],
        &[1, 0, 1],
        &[0, -1, 1],
        &[0, 1, 1],
    ],
    children: &[
        &[3, 7],
        &[2, 6],
        &[1, 5],
        &[0, 4],
        &[5, 7],
        &[4, 6],
        &[6, 7],
        &[4, 5],
        &[1, 3],
        &[0, 2],
        &[2, 3],
        &[0, 1],
    ],
};

const STENCIL_3D_CORNER: Stencil = Stencil {
    offsets: &[
        &[-1, -1, -1],
        &[1, -1, -1],
        &[-1, 1, -1],
        &[1, 1, -1],
        &[-1, -1, 1],
        &[1, -1, 1],
        &[-1, 1, 1],
        &[1, 1, 1],
    ],
    children: &[&[7], &[6], &[5], &[4], &[3], &[2], &[1], &[0]],
};

/// The kind of feature two neighbors share: a face, an edge or a corner of some dimension.
///
/// `rank` is the dimension of the shared feature, so `rank = dimension - 1` selects face neighbors and `rank = 0`
/// selects corner neighbors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Manifold {
    dimension: usize,
    rank: usize,
}

impl Manifold {
    pub fn new(dimension: usize, rank: usize) -> Self {
        assert!(
            (1..=3).contains(&dimension),
            "manifolds are only supported in 1, 2 and 3 dimensions, got {}",
            dimension
        );
        assert!(rank < dimension, "rank {} must be below the dimension {}", rank, dimension);
        Self { dimension, rank }
    }

    /// Neighbors sharing a face.
    pub fn face(dimension: usize) -> Self {
        Self::new(dimension, dimension - 1)
    }

    /// Neighbors sharing only a corner.
    pub fn corner(dimension: usize) -> Self {
        Self::new(dimension, 0)
    }

    /// Every manifold of `dimension`, faces first.
    pub fn all(dimension: usize) -> impl Iterator<Item = Self> + Clone {
        (0..dimension).rev().map(move |rank| Self::new(dimension, rank))
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of same-level neighbors across this manifold.
    #[inline]
    pub fn no_same_level_neighbors(&self) -> usize {
        no_faces(self.dimension, self.rank)
    }

    /// Number of neighbors across this manifold when every same-level neighbor is refined one level further.
    #[inline]
    pub fn no_child_level_neighbors(&self) -> usize {
        no_nodes_sharing_face(self.dimension, self.rank) * self.no_same_level_neighbors()
    }

    /// The indices of the same-level offsets.
    #[inline]
    pub fn positions(&self) -> std::ops::Range<usize> {
        0..self.no_same_level_neighbors()
    }

    /// Relative offset of the same-level neighbor `p`, in units of the node's size.
    #[inline]
    pub fn offset(&self, p: usize) -> &'static [i32] {
        self.stencil().offsets[p]
    }

    /// Child positions of neighbor `p` that touch the shared feature.
    #[inline]
    pub fn children_sharing_face(&self, p: usize) -> &'static [u8] {
        self.stencil().children[p]
    }

    /// The position whose offset points the other way.
    pub fn opposite(&self, p: usize) -> usize {
        let offset = self.offset(p);
        self.stencil()
            .offsets
            .iter()
            .position(|o| o.iter().zip(offset).all(|(a, b)| *a == -b))
            .unwrap_or_else(|| unreachable!("every stencil is symmetric"))
    }

    fn offset_array<const ND: usize>(&self, p: usize) -> [i32; ND] {
        let offset = self.offset(p);
        std::array::from_fn(|d| offset[d])
    }

    fn stencil(&self) -> &'static Stencil {
        match (self.dimension, self.rank) {
            (1, 0) => &STENCIL_1D_CORNER,
            (2, 1) => &STENCIL_2D_FACE,
            (2, 0) => &STENCIL_2D_CORNER,
            (3, 2) => &STENCIL_3D_FACE,
            (3, 1) => &STENCIL_3D_EDGE,
            (3, 0) => &STENCIL_3D_CORNER,
            _ => unreachable!("invalid manifold {:?}", self),
        }
    }
}

impl<const ND: usize> Tree<ND> {
    /// Neighbors of node `n` across `manifold`, in offset order.
    pub fn node_neighbors(&self, n: NodeIdx, manifold: Manifold) -> Neighbors {
        self.location_neighbors(self.node_location(n), manifold)
    }

    /// Neighbors of node `n` across `manifold` accepted by `predicate`.
    ///
    /// When a coarser leaf neighbor is rejected, its parent is tried instead.
    pub fn node_neighbors_filtered(
        &self,
        n: NodeIdx,
        manifold: Manifold,
        predicate: impl FnMut(NodeIdx) -> bool,
    ) -> Neighbors {
        self.location_neighbors_filtered(self.node_location(n), manifold, predicate)
    }

    /// Neighbors of the node at `location` across `manifold`. The location does not need to exist in the tree.
    pub fn location_neighbors(&self, location: Location<ND>, manifold: Manifold) -> Neighbors {
        let mut out = Neighbors::new();
        self.push_neighbors(location, manifold, &mut |_| true, false, &mut out);
        out
    }

    /// See [`Tree::node_neighbors_filtered`].
    pub fn location_neighbors_filtered(
        &self,
        location: Location<ND>,
        manifold: Manifold,
        mut predicate: impl FnMut(NodeIdx) -> bool,
    ) -> Neighbors {
        let mut out = Neighbors::new();
        self.push_neighbors(location, manifold, &mut predicate, true, &mut out);
        out
    }

    /// Neighbors of node `n` across every manifold, sorted and without duplicates.
    pub fn unique_node_neighbors(&self, n: NodeIdx) -> Neighbors {
        self.unique_location_neighbors(self.node_location(n))
    }

    pub fn unique_node_neighbors_filtered(&self, n: NodeIdx, predicate: impl FnMut(NodeIdx) -> bool) -> Neighbors {
        self.unique_location_neighbors_filtered(self.node_location(n), predicate)
    }

    pub fn unique_location_neighbors(&self, location: Location<ND>) -> Neighbors {
        let mut out = Neighbors::new();
        for manifold in Manifold::all(ND) {
            self.push_neighbors(location, manifold, &mut |_| true, false, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn unique_location_neighbors_filtered(
        &self,
        location: Location<ND>,
        mut predicate: impl FnMut(NodeIdx) -> bool,
    ) -> Neighbors {
        let mut out = Neighbors::new();
        for manifold in Manifold::all(ND) {
            self.push_neighbors(location, manifold, &mut predicate, true, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// The same-level neighbor of `n` at offset `p` of `manifold`, or the coarser leaf covering it.
    ///
    /// The result is invalid if the offset leaves the root cell.
    pub fn node_neighbor(&self, n: NodeIdx, manifold: Manifold, p: usize) -> NodeAt {
        self.location_neighbor(self.node_location(n), manifold, p)
    }

    pub(crate) fn location_neighbor(&self, location: Location<ND>, manifold: Manifold, p: usize) -> NodeAt {
        assert_eq!(manifold.dimension(), ND, "manifold {:?} does not match the tree", manifold);
        match location.shift(manifold.offset_array::<ND>(p)) {
            Some(shifted) => self.node_or_parent_at(shifted),
            None => NodeAt {
                idx: NodeIdx::INVALID,
                level: LevelIdx::INVALID,
            },
        }
    }

    fn push_neighbors<F>(
        &self,
        location: Location<ND>,
        manifold: Manifold,
        predicate: &mut F,
        parent_fallback: bool,
        out: &mut Neighbors,
    ) where
        F: FnMut(NodeIdx) -> bool,
    {
        if location.is_root() {
            return;
        }
        let level = location.level();

        for p in manifold.positions() {
            let found = self.location_neighbor(location, manifold, p);
            if !found.is_valid() {
                continue;
            }
            debug_assert!(
                found.level == level || found.level == level.up(),
                "neighbor {:?} of {:?} is on level {}; the tree is not balanced",
                found.idx,
                location,
                found.level
            );

            if self.is_leaf(found.idx) {
                if predicate(found.idx) {
                    out.push(found.idx);
                } else if parent_fallback && !self.is_root(found.idx) {
                    let parent = self.parent(found.idx);
                    if predicate(parent) {
                        out.push(parent);
                    }
                }
            } else {
                for &c in manifold.children_sharing_face(p) {
                    let child = self.child(found.idx, ChildPos::from_bits(c));
                    if predicate(child) {
                        out.push(child);
                    }
                }
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
