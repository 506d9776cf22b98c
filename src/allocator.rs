use crate::{NodeIdx, SiblingsIdx};

/// Allocates sibling groups.
///
/// One [`SiblingsIdx`] corresponds to `2^ND` contiguous node slots, except for group 0 which only holds the root. A
/// group is free iff it has no parent. The watermark `first_free` is always the lowest free group (or the capacity if
/// every group is in use), so allocation keeps the in-use groups packed towards the front of the array.
#[derive(Clone, Debug)]
pub struct SiblingGroupAllocator<const ND: usize> {
    /// The parent node of each sibling group. Invalid for free groups and for the root group.
    parents: Vec<NodeIdx>,
    /// The lowest free sibling group.
    first_free: SiblingsIdx,
}

impl<const ND: usize> SiblingGroupAllocator<ND> {
    const CHILDREN: u32 = 1 << ND;

    /// An allocator for `num_groups` groups where only the root group is in use.
    pub fn new(num_groups: u32) -> Self {
        assert!(num_groups > 0, "a tree needs at least the root sibling group");
        Self {
            parents: vec![NodeIdx::INVALID; num_groups as usize],
            first_free: SiblingsIdx::new(1),
        }
    }

    /// Number of sibling groups required to hold `num_nodes` nodes.
    #[inline]
    pub fn groups_for_nodes(num_nodes: u32) -> u32 {
        if num_nodes == 0 {
            0
        } else {
            Self::group_of(NodeIdx::new(num_nodes - 1)).get().unwrap_or(0) + 1
        }
    }

    /// Number of nodes held by `num_groups` sibling groups.
    ///
    /// Panics if the node indices of that many groups would not stay below [`NodeIdx::INVALID`].
    #[inline]
    pub fn nodes_in_groups(num_groups: u32) -> u32 {
        match num_groups {
            0 => 0,
            n => (n - 1)
                .checked_mul(Self::CHILDREN)
                .and_then(|nodes| nodes.checked_add(1))
                .filter(|&nodes| nodes < u32::MAX)
                .unwrap_or_else(|| panic!("{} sibling groups exceed the node index range", n)),
        }
    }

    /// The sibling group that contains node `n`.
    #[inline]
    pub fn group_of(n: NodeIdx) -> SiblingsIdx {
        let n = n.index() as u32;
        SiblingsIdx::new(n.div_ceil(Self::CHILDREN))
    }

    /// The first node of sibling group `s`.
    #[inline]
    pub fn first_node(s: SiblingsIdx) -> NodeIdx {
        match s.index() as u32 {
            0 => NodeIdx::ROOT,
            s => NodeIdx::new(1 + Self::CHILDREN * (s - 1)),
        }
    }

    /// Number of nodes in sibling group `s`.
    #[inline]
    pub fn group_len(s: SiblingsIdx) -> u32 {
        if s.index() == 0 {
            1
        } else {
            Self::CHILDREN
        }
    }

    #[inline]
    pub fn num_groups(&self) -> u32 {
        self.parents.len() as u32
    }

    #[inline]
    pub fn first_free(&self) -> SiblingsIdx {
        self.first_free
    }

    #[inline]
    pub fn parent(&self, s: SiblingsIdx) -> NodeIdx {
        self.parents[s.index()]
    }

    #[inline]
    pub fn set_parent(&mut self, s: SiblingsIdx, parent: NodeIdx) {
        self.parents[s.index()] = parent;
    }

    /// The root group is never free.
    #[inline]
    pub fn is_free(&self, s: SiblingsIdx) -> bool {
        s.index() != 0 && !self.parent(s).is_valid()
    }

    /// Claims the lowest free group for `parent`. Returns `None` if every group is in use.
    pub fn allocate(&mut self, parent: NodeIdx) -> Option<SiblingsIdx> {
        let s = self.first_free;
        if s.index() as u32 >= self.num_groups() {
            return None;
        }
        debug_assert!(self.is_free(s), "watermark {:?} points at a group in use", s);

        self.set_parent(s, parent);
        self.first_free = self.next_free_after(s);
        Some(s)
    }

    /// Returns group `s` to the pool.
    pub fn free(&mut self, s: SiblingsIdx) {
        assert!(!self.is_free(s), "sibling group {:?} is already free", s);
        assert!(s.index() != 0, "the root sibling group cannot be freed");
        self.set_parent(s, NodeIdx::INVALID);
        if s < self.first_free {
            self.first_free = s;
        }
    }

    /// Overrides the watermark, e.g. after a pass that compacted the groups.
    pub fn set_first_free(&mut self, s: SiblingsIdx) {
        assert!(
            s.index() as u32 == self.num_groups() || self.is_free(s),
            "sibling group {:?} is not free",
            s
        );
        debug_assert!(
            (0..s.index() as u32).all(|i| !self.is_free(SiblingsIdx::new(i))),
            "found free sibling groups below {:?}",
            s
        );
        self.first_free = s;
    }

    /// Fixes the watermark after groups `a` and `b` exchanged their parents.
    pub fn swapped(&mut self, a: SiblingsIdx, b: SiblingsIdx) {
        let (freed, claimed) = match (self.is_free(a), self.is_free(b)) {
            (true, false) => (a, b),
            (false, true) => (b, a),
            _ => return,
        };
        if claimed == self.first_free {
            self.first_free = self.next_free_after(claimed);
        }
        if freed < self.first_free {
            self.first_free = freed;
        }
    }

    /// All sibling groups that are in use, in storage order.
    pub fn groups_in_use(&self) -> impl Iterator<Item = SiblingsIdx> + '_ {
        (0..self.num_groups())
            .map(SiblingsIdx::new)
            .filter(move |&s| !self.is_free(s))
    }

    fn next_free_after(&self, s: SiblingsIdx) -> SiblingsIdx {
        (s.index() as u32 + 1..self.num_groups())
            .map(SiblingsIdx::new)
            .find(|&i| self.is_free(i))
            .unwrap_or(SiblingsIdx::new(self.num_groups()))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
