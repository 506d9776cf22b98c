//! Refinement and coarsening that keep adjacent leaves within one level of each other.

use crate::{Manifold, NodeIdx, SiblingGroup, Tree, TreeError};

impl<const ND: usize> Tree<ND> {
    /// Refines leaf `n`, first refining every coarser neighbor (recursively) so that the tree stays 2:1 balanced
    /// across faces, edges and corners.
    ///
    /// `on_refine` is called right after each refinement, with the new children, so that payload can be interpolated
    /// before the next one happens. The last call is for `n` itself, whose children are also returned.
    ///
    /// If the capacity runs out, the refinements done so far are kept; the tree is still balanced.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "orthtree::balanced_refine", fields(node = %n)))]
    pub fn balanced_refine(
        &mut self,
        n: NodeIdx,
        mut on_refine: impl FnMut(SiblingGroup),
    ) -> Result<SiblingGroup, TreeError> {
        self.balanced_refine_recursive(n, &mut on_refine)
    }

    fn balanced_refine_recursive<F>(&mut self, n: NodeIdx, on_refine: &mut F) -> Result<SiblingGroup, TreeError>
    where
        F: FnMut(SiblingGroup),
    {
        let location = self.node_location(n);
        let level = location.level();
        for manifold in Manifold::all(ND) {
            for p in manifold.positions() {
                // Refinements of earlier neighbors change what the later offsets find.
                let found = self.location_neighbor(location, manifold, p);
                if found.is_valid() && found.level < level {
                    self.balanced_refine_recursive(found.idx, on_refine)?;
                }
            }
        }

        let children = self.refine(n)?;
        on_refine(children);
        Ok(children)
    }

    /// Coarsens `n` unless that would leave one of its neighbors two levels finer.
    ///
    /// Requires all children of `n` to be leaves and every same-level neighbor of those children to be a leaf.
    /// `restrict` is called with the children before they are freed. Returns whether `n` was coarsened.
    pub fn balanced_coarsen(&mut self, n: NodeIdx, restrict: impl FnOnce(SiblingGroup)) -> bool {
        let Some(children) = self.children(n) else {
            return false;
        };
        if !children.iter().all(|c| self.is_leaf(c)) {
            return false;
        }

        for c in children.iter() {
            let location = self.node_location(c);
            for manifold in Manifold::all(ND) {
                for p in manifold.positions() {
                    let found = self.location_neighbor(location, manifold, p);
                    if found.is_valid() && found.level == location.level() && !self.is_leaf(found.idx) {
                        return false;
                    }
                }
            }
        }

        restrict(children);
        self.coarsen(n);
        true
    }

    /// Do all adjacent leaves differ by at most one level?
    pub fn is_balanced(&self) -> bool {
        self.leaves().all(|leaf| {
            let location = self.node_location(leaf);
            let level = location.level().index();
            Manifold::all(ND).all(|manifold| {
                manifold.positions().all(|p| {
                    let found = self.location_neighbor(location, manifold, p);
                    !found.is_valid() || found.level.index() + 1 >= level
                })
            })
        })
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use crate::{LevelIdx, OctTree, QuadTree};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn n(i: u32) -> NodeIdx {
        NodeIdx::new(i)
    }

    fn quad_with_refined_corner(capacity: u32) -> QuadTree {
        let mut tree = QuadTree::new(capacity);
        tree.refine(NodeIdx::ROOT).unwrap();
        tree.refine(n(1)).unwrap();
        tree
    }

    #[test]
    fn plain_refine_can_unbalance() {
        let mut tree = quad_with_refined_corner(25);
        assert!(tree.is_balanced());
        tree.refine(n(8)).unwrap();
        assert!(!tree.is_balanced());
    }

    #[test]
    fn balanced_refine_refines_coarser_neighbors_first() {
        let mut tree = quad_with_refined_corner(25);
        let mut refined = Vec::new();
        let children = tree.balanced_refine(n(8), |g| refined.push(g.parent)).unwrap();

        assert_eq!(refined, [n(2), n(3), n(4), n(8)]);
        assert_eq!(children.parent, n(8));
        assert_eq!(tree.size(), 25);
        assert!(tree.is_balanced());
        assert!(tree.leaves().all(|l| tree.level(l) >= LevelIdx::new(2)));
    }

    #[test]
    fn balanced_refine_reports_exhausted_capacity() {
        let mut tree = quad_with_refined_corner(13);
        let result = tree.balanced_refine(n(8), |_| {});
        assert!(matches!(result, Err(TreeError::CapacityExhausted { .. })));
        assert!(tree.is_balanced());
        assert!(tree.is_leaf(n(8)));
    }

    #[test]
    fn balanced_coarsen_keeps_balance() {
        let mut tree = quad_with_refined_corner(25);
        tree.balanced_refine(n(8), |_| {}).unwrap();

        // Children of 1 are not all leaves.
        assert!(!tree.balanced_coarsen(n(1), |_| panic!()));
        // One child of 2 touches node 8, which has children.
        assert!(!tree.balanced_coarsen(n(2), |_| panic!()));
        // Leaves cannot be coarsened.
        assert!(!tree.balanced_coarsen(n(5), |_| panic!()));

        let mut restricted = None;
        assert!(tree.balanced_coarsen(n(8), |g| restricted = Some(g)));
        assert_eq!(restricted.map(|g| g.parent), Some(n(8)));
        assert!(tree.is_leaf(n(8)));
        assert!(tree.is_balanced());

        assert!(tree.balanced_coarsen(n(2), |_| {}));
        assert!(tree.is_balanced());
        assert_eq!(tree.size(), 17);
    }

    #[test]
    fn random_balanced_octree() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tree = OctTree::new(1 + 8 * 60);

        loop {
            let leaves: Vec<_> = tree.leaves().collect();
            let leaf = leaves[rng.random_range(0..leaves.len())];
            if tree.balanced_refine(leaf, |_| {}).is_err() {
                break;
            }
            assert!(tree.is_balanced());
        }
        assert!(tree.is_balanced());

        // In a balanced tree, neighborhood is symmetric.
        for a in tree.leaves() {
            for b in tree.unique_node_neighbors(a) {
                assert!(tree.is_leaf(b));
                assert!(tree.unique_node_neighbors(b).contains(&a), "{:?} does not see {:?}", b, a);
            }
        }

        for _ in 0..200 {
            let nodes: Vec<_> = tree.nodes().filter(|&m| !tree.is_leaf(m)).collect();
            if nodes.is_empty() {
                break;
            }
            tree.balanced_coarsen(nodes[rng.random_range(0..nodes.len())], |_| {});
            assert!(tree.is_balanced());
        }
    }
}
