use crate::{NodeIdx, SiblingsIdx, Tree};

use smallvec::SmallVec;

/// Explicit stack of `(sibling group, next position to visit)`. One entry per level.
type GroupStack = SmallVec<[(SiblingsIdx, u32); 32]>;

impl<const ND: usize> Tree<ND> {
    /// Moves the sibling groups into depth-first order, siblings in Morton order, with no gaps.
    ///
    /// Whenever two groups trade places, `data_swap(a, b)` is called for each pair of nodes that traded places, so
    /// that payload arrays indexed by [`NodeIdx`] can follow along. Returns the number of groups that were swapped,
    /// which is zero for a tree that is already sorted.
    ///
    /// Afterwards the tree [is compact](Tree::is_compact) and [sorted](Tree::is_dfs_sorted).
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "orthtree::dfs_sort"))]
    pub fn dfs_sort(&mut self, mut data_swap: impl FnMut(NodeIdx, NodeIdx)) -> usize {
        let mut swaps = 0;
        let mut should = SiblingsIdx::new(0);
        let mut stack: GroupStack = SmallVec::new();
        stack.push((should, 0));

        while let Some(top) = stack.last_mut() {
            let (group, next) = *top;
            if next == self.group(group).len() as u32 {
                stack.pop();
                continue;
            }
            top.1 += 1;

            let children = self.children_group(Self::first_node(group).offset(next));
            if !children.is_valid() {
                continue;
            }
            should = should.next();
            if children != should {
                self.swap_groups(children, should);
                let (a, b) = (self.group(children), self.group(should));
                for (a, b) in a.iter().zip(b.iter()) {
                    data_swap(a, b);
                }
                swaps += 1;
            }
            stack.push((should, 0));
        }

        // Every group below the cursor is in use now.
        self.set_first_free_sibling_group(should.next());

        #[cfg(feature = "tracing")]
        tracing::debug!(swaps, size = self.size(), "sorted sibling groups");

        debug_assert!(self.is_compact(), "tree is not compact after sorting");
        debug_assert!(self.is_dfs_sorted(), "tree is not sorted after sorting");
        swaps
    }

    /// Are the sibling groups in depth-first order without gaps?
    ///
    /// Walks the tree like [`Tree::dfs_sort`] without moving anything.
    pub fn is_dfs_sorted(&self) -> bool {
        let mut should = SiblingsIdx::new(0);
        let mut stack: GroupStack = SmallVec::new();
        stack.push((should, 0));

        while let Some(top) = stack.last_mut() {
            let (group, next) = *top;
            if next == self.group(group).len() as u32 {
                stack.pop();
                continue;
            }
            top.1 += 1;

            let children = self.children_group(Self::first_node(group).offset(next));
            if !children.is_valid() {
                continue;
            }
            should = should.next();
            if children != should {
                return false;
            }
            stack.push((should, 0));
        }
        true
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
