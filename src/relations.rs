//! Counting formulas and child-position stencils shared by the tree, the location codec and the neighbor search.

use crate::{ChildPos, LevelIdx};

/// Number of children of a node: `2^nd`.
#[inline]
pub const fn no_children(nd: usize) -> usize {
    1 << nd
}

/// Number of nodes of a sibling group that touch one `rank`-dimensional face of their parent: `2^rank`.
#[inline]
pub const fn no_nodes_sharing_face(nd: usize, rank: usize) -> usize {
    if rank <= nd {
        1 << rank
    } else {
        0
    }
}

/// Number of `rank`-dimensional faces of an `nd`-dimensional cube: `2^(nd - rank) * binomial(nd, rank)`.
///
/// This is also the number of same-level neighbors across that manifold.
#[inline]
pub const fn no_faces(nd: usize, rank: usize) -> usize {
    if rank <= nd {
        (1 << (nd - rank)) * binomial(nd, rank)
    } else {
        0
    }
}

/// Number of nodes at a uniformly refined `level`: `(2^nd)^level`, or `None` if that overflows `usize`.
#[inline]
pub fn no_nodes_at_uniform_level(nd: usize, level: LevelIdx) -> Option<usize> {
    no_children(nd).checked_pow(level.index() as u32)
}

/// Number of nodes in a tree uniformly refined down to `level`: `Σ_{l=0}^{level} (2^nd)^l`, or `None` if that
/// overflows `usize`.
pub fn no_nodes_until_uniform_level(nd: usize, level: LevelIdx) -> Option<usize> {
    (0..=level.index() as u8).try_fold(0usize, |sum, l| {
        no_nodes_at_uniform_level(nd, LevelIdx::new(l)).and_then(|count| sum.checked_add(count))
    })
}

/// Length of a node at `level` for a root node of length 1.
#[inline]
pub fn node_length_at_level(level: LevelIdx) -> f64 {
    1.0 / (1u64 << level.index()) as f64
}

/// Upper bound on the neighbors found across all manifolds of an `nd`-dimensional node when every same-level neighbor
/// is refined one level further.
pub const fn max_no_neighbors(nd: usize) -> usize {
    let mut sum = 0;
    let mut rank = 0;
    while rank < nd {
        sum += no_nodes_sharing_face(nd, rank) * no_faces(nd, rank);
        rank += 1;
    }
    sum
}

const fn binomial(n: usize, k: usize) -> usize {
    let mut result = 1;
    let mut i = 0;
    while i < k {
        result = result * (n - i) / (i + 1);
        i += 1;
    }
    result
}

const RELATIVE_CHILD_POSITIONS_1D: [[i32; 1]; 2] = [[-1], [1]];
const RELATIVE_CHILD_POSITIONS_2D: [[i32; 2]; 4] = [[-1, -1], [1, -1], [-1, 1], [1, 1]];
const RELATIVE_CHILD_POSITIONS_3D: [[i32; 3]; 8] = [
    [-1, -1, -1],
    [1, -1, -1],
    [-1, 1, -1],
    [1, 1, -1],
    [-1, -1, 1],
    [1, -1, 1],
    [-1, 1, 1],
    [1, 1, 1],
];

/// The `±1` offsets of child `position` relative to its parent's center.
///
/// ```text
///              __________________________
///            /|   pos: 6   |   pos: 7  /|
///           / | (-1,+1,+1) | (+1,+1,+1) |
///          /  |____________|____________|
///         /   |   pos: 4   |   pos: 5   |
///        /    | (-1,-1,+1) | (+1,-1,+1) |
///       /     |____________|____________|
///      /     /                   /     /
///     /_____/___________________/     /
///    |   pos: 2   |   pos: 3   |     /    d1 ^
///    | (-1,+1,-1) | (+1,+1,-1) |    /        |     ^ d2
///    |____________|____________|   /         |    /
///    |   pos: 0   |   pos: 1   |  /          |  /
///    | (-1,-1,-1) | (+1,-1,-1) | /           |/
///    |____________|____________|/            o-------> d0
/// ```
#[inline]
pub fn relative_child_position<const ND: usize>(position: ChildPos) -> [i32; ND] {
    let p = position.get() as usize;
    let table: &[i32] = match ND {
        1 => &RELATIVE_CHILD_POSITIONS_1D[p],
        2 => &RELATIVE_CHILD_POSITIONS_2D[p],
        3 => &RELATIVE_CHILD_POSITIONS_3D[p],
        _ => return std::array::from_fn(|d| if (p >> d) & 1 == 1 { 1 } else { -1 }),
    };
    std::array::from_fn(|d| table[d])
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
