use std::fmt;

macro_rules! optional_index {
    ($(#[$meta:meta])* $name:ident, $int:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name($int);

        impl $name {
            /// The sentinel value that denotes absence.
            pub const INVALID: Self = Self(<$int>::MAX);

            #[inline]
            pub const fn new(value: $int) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != <$int>::MAX
            }

            /// `None` for [`Self::INVALID`].
            #[inline]
            pub const fn get(self) -> Option<$int> {
                if self.is_valid() {
                    Some(self.0)
                } else {
                    None
                }
            }

            /// The raw value as an array index.
            ///
            /// Panics on [`Self::INVALID`].
            #[inline]
            pub fn index(self) -> usize {
                assert!(self.is_valid(), "tried to index with an invalid {}", stringify!($name));
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl From<$int> for $name {
            #[inline]
            fn from(value: $int) -> Self {
                Self(value)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.get() {
                    Some(value) => write!(f, "{}({})", stringify!($name), value),
                    None => write!(f, "{}(invalid)", stringify!($name)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.get() {
                    Some(value) => write!(f, "{}", value),
                    None => f.write_str("invalid"),
                }
            }
        }
    };
}

optional_index!(
    /// Index of a node slot in a [`Tree`](crate::Tree).
    ///
    /// Handles are invalidated by [`Tree::coarsen`](crate::Tree::coarsen) and by
    /// [`Tree::dfs_sort`](crate::Tree::dfs_sort) unless tracked through their callbacks.
    NodeIdx,
    u32
);

optional_index!(
    /// Index of a sibling group: `2^ND` contiguous node slots created by one refinement.
    SiblingsIdx,
    u32
);

optional_index!(
    /// Distance from the root node (which is at level 0).
    LevelIdx,
    u8
);

impl NodeIdx {
    /// The root node is always the first slot.
    pub const ROOT: Self = Self(0);

    #[inline]
    pub(crate) fn offset(self, by: u32) -> Self {
        Self(self.0 + by)
    }
}

impl SiblingsIdx {
    #[inline]
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl LevelIdx {
    #[inline]
    pub(crate) fn up(self) -> Self {
        assert!(self.0 > 0, "the root level has no parent level");
        Self(self.0 - 1)
    }
}

/// Position of a child among its `2^ND` siblings.
///
/// Bit `d` encodes whether the child lies on the positive (`+1`) or negative (`-1`) side of its parent's center along
/// axis `d`. In 2D the positions go counter-clockwise starting from the bottom-left corner:
///
/// ```text
///  ___________
/// |  2  |  3  |     ^ d1
/// |_____|_____|     |
/// |  0  |  1  |     |
/// |_____|_____|     o----> d0
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChildPos(u8);

impl ChildPos {
    #[inline]
    pub fn new<const ND: usize>(position: u8) -> Self {
        assert!(
            (position as usize) < (1 << ND),
            "child position {} out of bounds [0, {})",
            position,
            1 << ND
        );
        Self(position)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All positions `[0, 2^ND)` in Morton order.
    #[inline]
    pub fn all<const ND: usize>() -> impl Iterator<Item = Self> + Clone {
        (0..(1u8 << ND)).map(Self)
    }

    /// The `±1` offsets of this child relative to its parent's center.
    #[inline]
    pub fn relative_position<const ND: usize>(self) -> [i32; ND] {
        crate::relations::relative_child_position::<ND>(self)
    }

    /// Builds a position from per-axis sides, where `true` means the positive side.
    #[inline]
    pub fn from_sides<const ND: usize>(positive: [bool; ND]) -> Self {
        let bits = positive
            .iter()
            .enumerate()
            .fold(0u8, |acc, (d, &p)| acc | ((p as u8) << d));
        Self(bits)
    }

    #[inline]
    pub(crate) const fn from_bits(bits: u8) -> Self {
        Self(bits)
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

    #[test]
    fn invalid_is_default_and_sorts_last() {
        assert_eq!(NodeIdx::default(), NodeIdx::INVALID);
        assert!(!NodeIdx::INVALID.is_valid());
        assert_eq!(NodeIdx::INVALID.get(), None);
        assert_eq!(NodeIdx::new(3).get(), Some(3));
        assert!(NodeIdx::new(u32::MAX - 1) < NodeIdx::INVALID);

        let mut v = vec![NodeIdx::INVALID, NodeIdx::new(2), NodeIdx::ROOT];
        v.sort();
        assert_eq!(v, [NodeIdx::ROOT, NodeIdx::new(2), NodeIdx::INVALID]);
    }

    #[test]
    fn debug_shows_sentinel() {
        assert_eq!(format!("{:?}", SiblingsIdx::new(4)), "SiblingsIdx(4)");
        assert_eq!(format!("{:?}", LevelIdx::INVALID), "LevelIdx(invalid)");
        assert_eq!(format!("{}", NodeIdx::new(7)), "7");
    }

    #[test]
    #[should_panic]
    fn indexing_with_invalid_panics() {
        let _ = NodeIdx::INVALID.index();
    }

    #[test]
    fn child_pos_from_sides() {
        assert_eq!(ChildPos::from_sides([false, false]), ChildPos::new::<2>(0));
        assert_eq!(ChildPos::from_sides([true, false]), ChildPos::new::<2>(1));
        assert_eq!(ChildPos::from_sides([false, true]), ChildPos::new::<2>(2));
        assert_eq!(ChildPos::from_sides([true, true, true]), ChildPos::new::<3>(7));
        assert_eq!(ChildPos::all::<3>().count(), 8);
    }

    #[test]
    #[should_panic]
    fn child_pos_out_of_bounds() {
        let _ = ChildPos::new::<2>(4);
    }
}
