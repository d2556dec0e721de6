//! Traversal driving an intersector

use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::Mat4;
use crate::intersect::Intersector;
use crate::scene::node::{NodeKind, NodeMask};
use crate::scene::SceneGraph;
use crate::visitor::{NodeVisitor, TraversalMode, VisitorState, VisitorType};

/// Walks the graph on behalf of an [`Intersector`], pruning subtrees whose
/// bounds the query cannot reach
#[derive(Debug)]
pub struct IntersectionVisitor<I: Intersector> {
    state: VisitorState,
    intersector: I,
    matrix_stack: Vec<Mat4>,
}

impl<I: Intersector> IntersectionVisitor<I> {
    /// Visitor that accepts every node
    pub fn new(intersector: I) -> Self {
        Self {
            state: VisitorState::new(VisitorType::Intersection, TraversalMode::TraverseAllChildren),
            intersector,
            matrix_stack: vec![Mat4::identity()],
        }
    }

    /// Restrict the traversal to nodes matching `mask`
    pub fn with_traversal_mask(mut self, mask: NodeMask) -> Self {
        self.state.traversal_mask = mask;
        self
    }

    /// The driven intersector
    pub fn intersector(&self) -> &I {
        &self.intersector
    }

    /// The driven intersector, mutably
    pub fn intersector_mut(&mut self) -> &mut I {
        &mut self.intersector
    }

    /// Consume the visitor and return its intersector
    pub fn into_intersector(self) -> I {
        self.intersector
    }

    fn model(&self) -> Mat4 {
        self.matrix_stack.last().copied().unwrap_or_else(Mat4::identity)
    }
}

impl<I: Intersector> NodeVisitor for IntersectionVisitor<I> {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn apply(&mut self, graph: &SceneGraph, node: NodeId) {
        // Node bounds already include the node's own transform
        if !self.intersector.enter(&graph.get_bound(node), &self.model()) {
            return;
        }

        match graph.node(node).map(|n| n.kind()) {
            Some(NodeKind::Transform(local)) => {
                let world = self.model() * local;
                self.matrix_stack.push(world);
                self.traverse(graph, node);
                self.matrix_stack.pop();
            }
            Some(_) => self.traverse(graph, node),
            None => {}
        }
    }

    fn apply_drawable(&mut self, graph: &SceneGraph, _geode: NodeId, drawable: DrawableId) {
        let Some(payload) = graph.drawable(drawable) else {
            return;
        };
        let model = self.model();
        if !self.intersector.enter(&payload.get_bound(), &model) {
            return;
        }
        self.intersector
            .intersect(graph, drawable, &self.state.node_path, &model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::intersect::{IntersectionLimit, LineSegmentIntersector};
    use crate::scene::{Shape, TessellationHints};

    fn two_cubes() -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.create_group("root");
        let mut placed = Vec::new();
        for z in [-2.0, 2.0] {
            let transform = graph.create_transform("placement", Mat4::new_translation(&Vec3::new(0.0, 0.0, z)));
            let geode = graph.create_geode("cube");
            let cube = Shape::cube(Vec3::zeros(), 1.0)
                .build_drawable("cube", &TessellationHints::default(), &[[1.0; 3]])
                .unwrap();
            graph.add_drawable(geode, cube).unwrap();
            graph.add_child(transform, geode).unwrap();
            graph.add_child(root, transform).unwrap();
            placed.push(transform);
        }
        (graph, root, placed[0], placed[1])
    }

    fn run(graph: &SceneGraph, root: NodeId, limit: IntersectionLimit) -> LineSegmentIntersector {
        let intersector = LineSegmentIntersector::new(Vec3::new(0.1, 0.2, -10.0), Vec3::new(0.1, 0.2, 10.0), limit);
        let mut visitor = IntersectionVisitor::new(intersector);
        graph.accept(root, &mut visitor);
        visitor.into_intersector()
    }

    #[test]
    fn test_no_limit_collects_entry_and_exit_of_both() {
        let (graph, root, near, far) = two_cubes();
        let intersector = run(&graph, root, IntersectionLimit::NoLimit);
        let hits = intersector.intersections();

        assert_eq!(hits.len(), 4);
        assert!(hits.windows(2).all(|w| w[0].ratio <= w[1].ratio));
        assert!(hits[0].passes_through(near));
        assert!(hits[3].passes_through(far));
        assert!((hits[0].world_point.z + 2.5).abs() < 1.0e-5);
    }

    #[test]
    fn test_limit_one_stops_traversal() {
        let (graph, root, near, _) = two_cubes();
        let intersector = run(&graph, root, IntersectionLimit::LimitOne);
        assert_eq!(intersector.intersections().len(), 1);
        assert!(intersector.intersections()[0].passes_through(near));
    }

    #[test]
    fn test_masked_subtree_is_not_hit() {
        let (mut graph, root, near, far) = two_cubes();
        graph.node_mut(near).unwrap().set_node_mask(0b10);

        let intersector = LineSegmentIntersector::new(
            Vec3::new(0.1, 0.2, -10.0),
            Vec3::new(0.1, 0.2, 10.0),
            IntersectionLimit::LimitNearest,
        );
        let mut visitor = IntersectionVisitor::new(intersector).with_traversal_mask(0b01);
        graph.accept(root, &mut visitor);

        let hit = visitor.intersector().first().unwrap();
        assert!(hit.passes_through(far));
    }
}
