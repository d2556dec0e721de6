//! Hit testing against scene geometry
//!
//! An [`Intersector`] holds the query shape and collects [`Intersection`]s.
//! The [`IntersectionVisitor`] walks the graph with a matrix stack, asks the
//! intersector whether each subtree can contain hits and hands it every
//! drawable that survives the pruning.
//!
//! ```ignore
//! let intersector = LineSegmentIntersector::new(start, end, IntersectionLimit::LimitNearest);
//! let mut visitor = IntersectionVisitor::new(intersector);
//! graph.accept(root, &mut visitor);
//! let nearest = visitor.intersector().first();
//! ```

pub mod line_segment;
pub mod visitor;

pub use line_segment::LineSegmentIntersector;
pub use visitor::IntersectionVisitor;

use serde::{Deserialize, Serialize};

use crate::bounds::BoundingSphere;
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::SceneGraph;
use crate::visitor::NodePath;

/// How many hits an intersector keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntersectionLimit {
    /// Every hit, nearest first
    #[default]
    NoLimit,
    /// The first hit found in traversal order; traversal stops after it
    LimitOne,
    /// Only the nearest hit; every candidate is considered
    LimitNearest,
    /// The nearest hit of each drawable
    LimitOnePerDrawable,
}

/// One hit of an intersection query
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Drawable that was hit
    pub drawable: DrawableId,
    /// Nodes from the traversal root down to the drawable's geode
    pub node_path: NodePath,
    /// Parameter along the query segment, `0` at its start and `1` at its end
    pub ratio: f32,
    /// Hit point in the drawable's frame
    pub local_point: Vec3,
    /// Hit point in the traversal root's frame
    pub world_point: Vec3,
    /// Face normal in the drawable's frame
    pub local_normal: Vec3,
    /// Face normal in the traversal root's frame
    pub world_normal: Vec3,
    /// Triangle index within the drawable
    pub primitive_index: usize,
    /// Local-to-world matrix of the drawable
    pub matrix: Mat4,
}

impl Intersection {
    /// Whether `node` lies on the path to the hit
    pub fn passes_through(&self, node: NodeId) -> bool {
        self.node_path.contains(&node)
    }
}

/// Query shape driven by an [`IntersectionVisitor`]
pub trait Intersector {
    /// Hit retention policy
    fn limit(&self) -> IntersectionLimit;

    /// Whether a subtree whose bound, transformed by `local_to_world`, is
    /// `bound` can hold a hit worth keeping
    fn enter(&self, bound: &BoundingSphere, local_to_world: &Mat4) -> bool;

    /// Test a drawable whose geode sits at the end of `node_path`
    fn intersect(
        &mut self,
        graph: &SceneGraph,
        drawable: DrawableId,
        node_path: &[NodeId],
        local_to_world: &Mat4,
    );

    /// Whether traversal may stop because no further hit can be kept
    fn reached_limit(&self) -> bool;

    /// Hits collected so far, nearest first
    fn intersections(&self) -> &[Intersection];

    /// Drop every collected hit
    fn reset(&mut self);

    /// Nearest hit, if any
    fn first(&self) -> Option<&Intersection> {
        self.intersections().first()
    }

    /// Whether anything was hit
    fn contains_intersections(&self) -> bool {
        !self.intersections().is_empty()
    }
}
