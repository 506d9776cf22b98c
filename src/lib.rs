//! Index-based orthtrees: binary trees, quadtrees and octrees for adaptive Cartesian grids.
//!
//! A [`Tree`] only stores topology. Nodes are addressed by [`NodeIdx`] and payload lives in caller-owned arrays
//! indexed by those handles. Use the [`BinaryTree`], [`QuadTree`] or [`OctTree`] aliases of the generic [`Tree`].
//!
//! - [`Tree::refine`] and [`Tree::coarsen`] create and destroy the `2^ND` children of a node as one contiguous
//!   sibling group, returning the group so payload can be interpolated or restricted.
//! - [`Location`] encodes the root-to-node path as a Morton code. [`Location::shift`] finds same-level neighbor
//!   locations without touching the tree, and [`Tree::node_or_parent_at`] resolves them.
//! - [`Tree::node_neighbors`] finds the neighbors across the faces, edges or corners selected by a [`Manifold`],
//!   whether they are on the same level, coarser or finer.
//! - [`Tree::dfs_sort`] packs the sibling groups in depth-first order and reports every move so payload can follow.
//!
//! # Handle invalidation
//!
//! [`NodeIdx`] values are plain indices. They are invalidated by [`Tree::coarsen`] (for the removed children) and by
//! [`Tree::dfs_sort`] (for every node whose group moved, as reported through its callback).
//!
//! # Performance
//!
//! - parent, child and sibling access: O(1)
//! - location of a node, lookup by location: O(depth)
//! - neighbor query: O(depth) per manifold offset, without heap allocation
//! - [`Tree::dfs_sort`]: O(nodes) with O(depth) auxiliary space
//! - memory usage per node: 4 bytes, plus 4 bytes per sibling group

mod allocator;
mod balance;
mod dfs_sort;
mod error;
mod index;
mod location;
mod neighbors;
mod tree;

pub mod relations;

pub use error::*;
pub use index::*;
pub use location::*;
pub use neighbors::*;
pub use tree::*;

#[cfg(feature = "glam")]
mod impl_glam;

#[cfg(feature = "glam")]
pub use glam;

/// A 1-dimensional [`Tree`].
pub type BinaryTree = Tree<1>;

/// A 2-dimensional [`Tree`].
pub type QuadTree = Tree<2>;

/// A 3-dimensional [`Tree`].
pub type OctTree = Tree<3>;
