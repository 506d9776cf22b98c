use crate::{ChildPos, LevelIdx, NodeIdx, Tree};

use std::fmt;

/// The path from the root to a node, as one child position per level.
///
/// Stored as an interleaved Morton code with a leading sentinel bit: the root is `0b1`, and each level appends `ND`
/// bits holding the [`ChildPos`] of that level. Locations can describe nodes that do not exist (yet), which is how
/// neighbors are found without touching the tree.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Location<const ND: usize> {
    code: u64,
}

impl<const ND: usize> Default for Location<ND> {
    fn default() -> Self {
        Self::root()
    }
}

impl<const ND: usize> Location<ND> {
    const DIMENSION_CHECK: () = assert!(ND >= 1 && ND <= 3, "locations are only supported in 1, 2 and 3 dimensions");

    const DIGIT_MASK: u64 = (1 << ND) - 1;

    /// The location of the root node: level 0, no digits.
    #[inline]
    pub fn root() -> Self {
        let () = Self::DIMENSION_CHECK;
        Self { code: 1 }
    }

    /// The deepest level a location can encode.
    #[inline]
    pub const fn max_level() -> LevelIdx {
        LevelIdx::new(((64 - ND) / ND - 1) as u8)
    }

    /// Builds the location at `level` from per-axis integer coordinates in `[0, 2^level)`.
    pub fn from_morton_coordinates(coordinates: [u64; ND], level: LevelIdx) -> Self {
        let levels = level.index();
        assert!(level <= Self::max_level(), "level {} exceeds the maximum level {}", level, Self::max_level());
        debug_assert!(coordinates.iter().all(|&c| c >> levels == 0), "coordinates {:?} out of bounds at level {}", coordinates, level);

        let mut code = 1;
        for bit in (0..levels).rev() {
            let digit = (0..ND).fold(0, |acc, d| acc | (((coordinates[d] >> bit) & 1) << d));
            code = (code << ND) | digit;
        }
        Self { code }
    }

    /// Builds the location of the node at `level` that contains `point`, where the root cell is `[0, 1]^ND`.
    ///
    /// Returns `None` if the point lies outside of the root cell.
    pub fn from_normalized_point(point: [f64; ND], level: LevelIdx) -> Option<Self> {
        if point.iter().any(|&x| !(0.0..=1.0).contains(&x)) {
            return None;
        }
        let cells = 1u64 << level.index();
        let coordinates = point.map(|x| ((x * cells as f64) as u64).min(cells - 1));
        Some(Self::from_morton_coordinates(coordinates, level))
    }

    /// Number of digits, i.e. the distance from the root.
    #[inline]
    pub fn level(self) -> LevelIdx {
        LevelIdx::new(((63 - self.code.leading_zeros()) as usize / ND) as u8)
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self.code == 1
    }

    /// Appends one level.
    #[inline]
    pub fn push(&mut self, position: ChildPos) {
        assert!(self.level() < Self::max_level(), "cannot push past the maximum level {}", Self::max_level());
        self.code = (self.code << ND) | position.get() as u64;
    }

    /// Removes the deepest level and returns its digit.
    #[inline]
    pub fn pop(&mut self) -> ChildPos {
        assert!(!self.is_root(), "cannot pop from the root location");
        let digit = ChildPos::from_bits((self.code & Self::DIGIT_MASK) as u8);
        self.code >>= ND;
        digit
    }

    /// The digit of `level`, where level 1 is the first child below the root.
    #[inline]
    pub fn get(self, level: LevelIdx) -> ChildPos {
        let own = self.level();
        assert!(
            level.index() >= 1 && level <= own,
            "level {} out of bounds [1, {}]",
            level,
            own
        );
        let shift = ND * (own.index() - level.index());
        ChildPos::from_bits(((self.code >> shift) & Self::DIGIT_MASK) as u8)
    }

    /// The digits from the root down.
    pub fn digits(self) -> impl Iterator<Item = ChildPos> {
        (1..=self.level().index() as u8).map(move |l| self.get(LevelIdx::new(l)))
    }

    #[inline]
    pub fn parent(self) -> Self {
        let mut parent = self;
        parent.pop();
        parent
    }

    #[inline]
    pub fn child(self, position: ChildPos) -> Self {
        let mut child = self;
        child.push(position);
        child
    }

    /// The Morton index of the location among all `2^(ND * level)` locations of its level.
    #[inline]
    pub fn morton_idx(self) -> u64 {
        self.code ^ (1 << (ND * self.level().index()))
    }

    /// Per-axis integer coordinates in `[0, 2^level)`.
    pub fn morton_coordinates(self) -> [u64; ND] {
        let levels = self.level().index();
        let morton = self.morton_idx();
        let mut coordinates = [0; ND];
        for bit in 0..levels {
            for (d, c) in coordinates.iter_mut().enumerate() {
                *c |= ((morton >> (bit * ND + d)) & 1) << bit;
            }
        }
        coordinates
    }

    /// Moves the location by `offset` nodes of its own size, staying on the same level.
    ///
    /// Returns `None` if the shifted location would leave the root cell.
    pub fn shift(self, offset: [i32; ND]) -> Option<Self> {
        let level = self.level();
        let cells = 1i64 << level.index();
        let mut coordinates = self.morton_coordinates();
        for (c, &o) in coordinates.iter_mut().zip(offset.iter()) {
            let shifted = *c as i64 + o as i64;
            if shifted < 0 || shifted >= cells {
                return None;
            }
            *c = shifted as u64;
        }
        Some(Self::from_morton_coordinates(coordinates, level))
    }

    /// The center of the location's cell, where the root cell is `[0, 1]^ND`.
    pub fn normalized_center(self) -> [f64; ND] {
        let length = crate::relations::node_length_at_level(self.level());
        self.morton_coordinates().map(|c| (c as f64 + 0.5) * length)
    }
}

impl<const ND: usize> fmt::Debug for Location<ND> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("level", &self.level().index())
            .field("digits", &self.digits().map(ChildPos::get).collect::<Vec<_>>())
            .finish()
    }
}

/// Result of a location lookup: the deepest existing node on the path and its level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeAt {
    pub idx: NodeIdx,
    pub level: LevelIdx,
}

impl NodeAt {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.idx.is_valid()
    }
}

impl<const ND: usize> Tree<ND> {
    /// The location of node `n`, found by walking up to the root.
    pub fn node_location(&self, n: NodeIdx) -> Location<ND> {
        let max_level = Location::<ND>::max_level().index();
        let mut code = 0;
        let mut depth = 0;
        let mut n = n;
        while !self.is_root(n) {
            assert!(depth < max_level, "node {} is deeper than the maximum location level", n);
            code |= (self.position_in_parent(n).get() as u64) << (ND * depth);
            depth += 1;
            n = self.parent(n);
        }
        let location = Location {
            code: code | (1 << (ND * depth)),
        };
        debug_assert_eq!(location.level().index(), depth);
        location
    }

    /// Follows `location` down from the root, stopping early at leaves.
    ///
    /// Returns the node at `location` if it exists, otherwise its deepest existing ancestor, which is a leaf on a
    /// coarser level.
    pub fn node_or_parent_at(&self, location: Location<ND>) -> NodeAt {
        let mut idx = NodeIdx::ROOT;
        let mut level = 0;
        for position in location.digits() {
            let child = self.child(idx, position);
            if !child.is_valid() {
                break;
            }
            idx = child;
            level += 1;
        }
        NodeAt {
            idx,
            level: LevelIdx::new(level),
        }
    }

    /// The node at exactly `location`, or [`NodeIdx::INVALID`] if it does not exist.
    pub fn node_at(&self, location: Location<ND>) -> NodeIdx {
        let found = self.node_or_parent_at(location);
        if found.level == location.level() {
            found.idx
        } else {
            NodeIdx::INVALID
        }
    }

    /// The center of node `n`, where the root cell is `[0, 1]^ND`.
    pub fn normalized_node_center(&self, n: NodeIdx) -> [f64; ND] {
        self.node_location(n).normalized_center()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
