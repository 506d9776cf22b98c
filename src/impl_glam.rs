use crate::relations::node_length_at_level;
use crate::{Location, NodeIdx, OctTree, QuadTree};

use glam::{DVec2, DVec3};

macro_rules! impl_glam_geometry {
    ($tree:ty, $vector:ty, $nd:literal) => {
        impl $tree {
            /// Center of node `n`, where the root cell is the unit square (cube).
            #[inline]
            pub fn node_center(&self, n: NodeIdx) -> $vector {
                <$vector>::from_array(self.normalized_node_center(n))
            }

            /// Minimum and maximum corners of node `n`, where the root cell is the unit square (cube).
            pub fn node_bounds(&self, n: NodeIdx) -> ($vector, $vector) {
                let half = 0.5 * node_length_at_level(self.level(n));
                let center = self.node_center(n);
                (center - half, center + half)
            }

            /// The leaf that contains `point`, or `None` if `point` is outside of the root cell.
            ///
            /// Points on a shared boundary belong to the node on the positive side.
            pub fn leaf_at_point(&self, point: $vector) -> Option<NodeIdx> {
                let location = Location::<$nd>::from_normalized_point(point.to_array(), Location::<$nd>::max_level())?;
                Some(self.node_or_parent_at(location).idx)
            }
        }
    };
}

impl_glam_geometry!(QuadTree, DVec2, 2);
impl_glam_geometry!(OctTree, DVec3, 3);

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
