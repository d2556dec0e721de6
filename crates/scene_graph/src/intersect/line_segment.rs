//! Line segment intersector

use crate::bounds::BoundingSphere;
use crate::core::config::IntersectionConfig;
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3};
use crate::intersect::{Intersection, IntersectionLimit, Intersector};
use crate::scene::SceneGraph;

/// Hits on one drawable closer than this along the segment are the same
/// crossing reported by neighbouring triangles (an edge or a shared vertex)
const COINCIDENT_RATIO: f32 = 1.0e-5;

/// Tests a world-space segment against every triangle it reaches.
///
/// Triangles are two-sided. Hits are kept sorted by their ratio along the
/// segment.
#[derive(Debug, Clone)]
pub struct LineSegmentIntersector {
    start: Vec3,
    end: Vec3,
    limit: IntersectionLimit,
    epsilon: f32,
    intersections: Vec<Intersection>,
}

impl LineSegmentIntersector {
    /// Segment from `start` to `end` in the traversal root's frame
    pub fn new(start: Vec3, end: Vec3, limit: IntersectionLimit) -> Self {
        Self {
            start,
            end,
            limit,
            epsilon: constants::EPSILON,
            intersections: Vec::new(),
        }
    }

    /// Segment using the limit and tolerance of `config`
    pub fn with_config(start: Vec3, end: Vec3, config: &IntersectionConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            ..Self::new(start, end, config.limit)
        }
    }

    /// Start of the segment
    pub fn start(&self) -> Vec3 {
        self.start
    }

    /// End of the segment
    pub fn end(&self) -> Vec3 {
        self.end
    }

    fn is_degenerate(&self) -> bool {
        (self.end - self.start).norm_squared() <= self.epsilon * self.epsilon
    }

    /// Segment-triangle test (Möller-Trumbore) returning `(t, u, v)` with `t`
    /// in `[0, 1]` along `start -> end`
    fn intersect_triangle(&self, start: Vec3, end: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, f32, f32)> {
        let direction = end - start;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = direction.cross(&edge2);
        let a = edge1.dot(&h);
        if a.abs() < f32::EPSILON * edge1.norm() * edge2.norm() * direction.norm() {
            return None;
        }

        let f = 1.0 / a;
        let s = start - v0;
        let u = f * s.dot(&h);
        if u < -self.epsilon || u > 1.0 + self.epsilon {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * direction.dot(&q);
        if v < -self.epsilon || u + v > 1.0 + self.epsilon {
            return None;
        }

        let t = f * edge2.dot(&q);
        if (-self.epsilon..=1.0 + self.epsilon).contains(&t) {
            Some((t.clamp(0.0, 1.0), u, v))
        } else {
            None
        }
    }

    fn record(&mut self, hit: Intersection) {
        let duplicate = self.intersections.iter().any(|existing| {
            existing.drawable == hit.drawable
                && (existing.ratio - hit.ratio).abs() <= COINCIDENT_RATIO
                && existing.node_path == hit.node_path
        });
        if duplicate {
            return;
        }

        match self.limit {
            IntersectionLimit::NoLimit => {}
            IntersectionLimit::LimitOne => {
                if !self.intersections.is_empty() {
                    return;
                }
            }
            IntersectionLimit::LimitNearest => {
                if self.intersections.first().is_some_and(|best| best.ratio <= hit.ratio) {
                    return;
                }
                self.intersections.clear();
            }
            IntersectionLimit::LimitOnePerDrawable => {
                if let Some(index) = self.intersections.iter().position(|i| i.drawable == hit.drawable) {
                    if self.intersections[index].ratio <= hit.ratio {
                        return;
                    }
                    self.intersections.remove(index);
                }
            }
        }

        let index = self.intersections.partition_point(|i| i.ratio <= hit.ratio);
        self.intersections.insert(index, hit);
    }
}

impl Intersector for LineSegmentIntersector {
    fn limit(&self) -> IntersectionLimit {
        self.limit
    }

    fn enter(&self, bound: &BoundingSphere, local_to_world: &Mat4) -> bool {
        if self.reached_limit() || self.is_degenerate() {
            return false;
        }
        let world = bound.transformed(local_to_world);
        if !world.valid() {
            return false;
        }
        if !world.intersects_segment(self.start, self.end) {
            return false;
        }

        // A subtree entered beyond the nearest hit cannot improve on it
        if self.limit == IntersectionLimit::LimitNearest {
            if let (Some(best), Some((entry, _))) =
                (self.intersections.first(), world.intersect_line(self.start, self.end))
            {
                return entry <= best.ratio;
            }
        }
        true
    }

    fn intersect(
        &mut self,
        graph: &SceneGraph,
        drawable: DrawableId,
        node_path: &[NodeId],
        local_to_world: &Mat4,
    ) {
        let Some(payload) = graph.drawable(drawable) else {
            return;
        };
        let Some(world_to_local) = local_to_world.inverse_or_none() else {
            log::warn!("Skipping drawable {:?} under a singular transform", drawable);
            return;
        };
        let local_start = world_to_local.pre_multiply(&self.start);
        let local_end = world_to_local.pre_multiply(&self.end);
        let normal_matrix = world_to_local.transpose();

        let mut hits = Vec::new();
        payload.for_each_triangle(|primitive_index, v0, v1, v2| {
            if self.limit == IntersectionLimit::LimitOne && !hits.is_empty() {
                return;
            }
            if let Some((ratio, _, _)) = self.intersect_triangle(local_start, local_end, v0, v1, v2) {
                let local_point = local_start + (local_end - local_start) * ratio;
                let local_normal = (v1 - v0).cross(&(v2 - v0)).normalize();
                hits.push(Intersection {
                    drawable,
                    node_path: node_path.to_vec(),
                    ratio,
                    local_point,
                    world_point: local_to_world.pre_multiply(&local_point),
                    local_normal,
                    world_normal: normal_matrix.transform_direction(&local_normal).normalize(),
                    primitive_index,
                    matrix: *local_to_world,
                });
            }
        });

        for hit in hits {
            self.record(hit);
        }
    }

    fn reached_limit(&self) -> bool {
        self.limit == IntersectionLimit::LimitOne && !self.intersections.is_empty()
    }

    fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    fn reset(&mut self) {
        self.intersections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Drawable, PrimitiveSet, PrimitiveTopology, Vertex};
    use approx::assert_relative_eq;

    /// Unit quad in the z = `z` plane made of two triangles
    fn quad(graph: &mut SceneGraph, z: f32) -> (NodeId, DrawableId) {
        let geode = graph.create_geode("quad");
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let vertices = corners
            .iter()
            .map(|(x, y)| Vertex::colored(Vec3::new(*x, *y, z), [1.0; 3]))
            .collect();
        let drawable = Drawable::with_geometry(
            "quad",
            vertices,
            vec![0, 1, 2, 0, 2, 3],
            PrimitiveSet::draw_elements(PrimitiveTopology::TriangleList, 6, 1, 0, 0, 0),
        );
        let id = graph.add_drawable(geode, drawable).unwrap();
        (geode, id)
    }

    #[test]
    fn test_hit_reports_ratio_point_and_normal() {
        let mut graph = SceneGraph::new();
        let (geode, drawable) = quad(&mut graph, 2.0);

        let mut intersector =
            LineSegmentIntersector::new(Vec3::new(0.25, 0.25, 0.0), Vec3::new(0.25, 0.25, 4.0), IntersectionLimit::NoLimit);
        intersector.intersect(&graph, drawable, &[geode], &Mat4::identity());

        let hit = intersector.first().unwrap();
        assert_relative_eq!(hit.ratio, 0.5);
        assert_relative_eq!(hit.world_point, Vec3::new(0.25, 0.25, 2.0));
        assert_relative_eq!(hit.world_normal.z.abs(), 1.0);
        assert_eq!(hit.node_path, vec![geode]);
    }

    #[test]
    fn test_hit_under_transform_is_reported_in_world_space() {
        let mut graph = SceneGraph::new();
        let (geode, drawable) = quad(&mut graph, 0.0);
        let to_world = Mat4::new_translation(&Vec3::new(0.0, 0.0, 3.0));

        let mut intersector =
            LineSegmentIntersector::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.5, 4.0), IntersectionLimit::NoLimit);
        intersector.intersect(&graph, drawable, &[geode], &to_world);

        let hit = intersector.first().unwrap();
        assert_relative_eq!(hit.ratio, 0.75);
        assert_relative_eq!(hit.local_point, Vec3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(hit.world_point, Vec3::new(0.0, 0.5, 3.0));
    }

    #[test]
    fn test_segment_short_of_geometry_misses() {
        let mut graph = SceneGraph::new();
        let (geode, drawable) = quad(&mut graph, 5.0);

        let mut intersector =
            LineSegmentIntersector::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 4.0), IntersectionLimit::NoLimit);
        intersector.intersect(&graph, drawable, &[geode], &Mat4::identity());
        assert!(!intersector.contains_intersections());
    }

    #[test]
    fn test_crossing_on_shared_edge_is_reported_once() {
        let mut graph = SceneGraph::new();
        let (geode, drawable) = quad(&mut graph, 2.0);

        // The quad diagonal from (-1, -1) to (1, 1) is shared by both triangles
        let mut intersector =
            LineSegmentIntersector::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.5, 0.5, 4.0), IntersectionLimit::NoLimit);
        intersector.intersect(&graph, drawable, &[geode], &Mat4::identity());

        assert_eq!(intersector.intersections().len(), 1);
        assert_relative_eq!(intersector.intersections()[0].ratio, 0.5);
    }

    #[test]
    fn test_zero_length_segment_enters_nothing() {
        let intersector = LineSegmentIntersector::new(Vec3::zeros(), Vec3::zeros(), IntersectionLimit::NoLimit);
        let bound = BoundingSphere::new(Vec3::zeros(), 10.0);
        assert!(!intersector.enter(&bound, &Mat4::identity()));
    }

    #[test]
    fn test_limit_one_per_drawable_keeps_nearest() {
        let mut graph = SceneGraph::new();
        let (geode, drawable) = quad(&mut graph, 1.0);

        let mut intersector = LineSegmentIntersector::new(
            Vec3::new(0.1, 0.2, 0.0),
            Vec3::new(0.1, 0.2, 4.0),
            IntersectionLimit::LimitOnePerDrawable,
        );
        // Same drawable seen through two paths at different depths
        intersector.intersect(&graph, drawable, &[geode], &Mat4::new_translation(&Vec3::new(0.0, 0.0, 2.0)));
        intersector.intersect(&graph, drawable, &[geode], &Mat4::identity());

        assert_eq!(intersector.intersections().len(), 1);
        assert_relative_eq!(intersector.intersections()[0].ratio, 0.25);
    }
}
