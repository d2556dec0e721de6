//! Pointer rays and pick results handed to manipulators

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::intersect::Intersection;
use crate::visitor::NodePath;

/// Pointer position as a world-space segment from the near to the far plane
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInfo {
    /// Point on the near clipping plane under the pointer
    pub near_point: Vec3,
    /// Point on the far clipping plane under the pointer
    pub far_point: Vec3,
    hit_list: Vec<NodePath>,
}

impl Default for PointerInfo {
    fn default() -> Self {
        Self::new(Vec3::zeros(), -Vec3::z())
    }
}

impl PointerInfo {
    /// Pointer segment between two world-space points
    pub fn new(near_point: Vec3, far_point: Vec3) -> Self {
        Self {
            near_point,
            far_point,
            hit_list: Vec::new(),
        }
    }

    /// Unproject normalized device coordinates with the inverse of
    /// `projection * view`. Clip-space depth runs from 0 (near) to 1 (far).
    pub fn from_ndc(inverse_view_projection: &Mat4, x: f32, y: f32) -> Self {
        Self::new(
            inverse_view_projection.pre_multiply(&Vec3::new(x, y, 0.0)),
            inverse_view_projection.pre_multiply(&Vec3::new(x, y, 1.0)),
        )
    }

    /// Move the pointer without touching the hit list
    pub fn set_near_far(&mut self, near_point: Vec3, far_point: Vec3) {
        self.near_point = near_point;
        self.far_point = far_point;
    }

    /// Unit direction from the near to the far point
    pub fn eye_direction(&self) -> Vec3 {
        (self.far_point - self.near_point).normalize()
    }

    /// Node paths picked by the last push
    pub fn hit_list(&self) -> &[NodePath] {
        &self.hit_list
    }

    /// Replace the picked paths
    pub fn set_hit_list(&mut self, hits: &[Intersection]) {
        self.hit_list = hits.iter().map(|hit| hit.node_path.clone()).collect();
    }

    /// Add one picked path
    pub fn add_hit(&mut self, path: NodePath) {
        self.hit_list.push(path);
    }

    /// Forget every picked path
    pub fn clear_hits(&mut self) {
        self.hit_list.clear();
    }

    /// Whether `node` lies on any picked path
    pub fn contains(&self, node: NodeId) -> bool {
        self.hit_list.iter().any(|path| path.contains(&node))
    }
}
