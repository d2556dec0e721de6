//! Primitive shapes tessellated into drawables
//!
//! Handle geometry for draggers and test scenes is built from these. Every
//! shape is tessellated into an indexed triangle list. Hints a shape cannot
//! honour are rejected when the drawable is built, never at draw time.

use serde::{Deserialize, Serialize};

use crate::core::error::{SceneError, SceneResult};
use crate::foundation::math::{constants, Mat4, Mat4Ext, Quat, Vec3};
use crate::scene::drawable::Drawable;
use crate::scene::geometry::{PrimitiveSet, PrimitiveTopology, Vertex};

const DEFAULT_SPHERE_ROWS: u32 = 20;
const DEFAULT_SEGMENTS: u32 = 40;
const MIN_ROWS: u32 = 3;
const MIN_SEGMENTS: u32 = 5;

/// How normals are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalsType {
    /// Smooth normals per vertex
    #[default]
    PerVertex,
    /// Flat normals per face
    PerFace,
}

/// How colours are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorsType {
    /// First colour for the whole shape
    #[default]
    Overall,
    /// One colour per face, cycling through the list
    PerFace,
    /// One colour per vertex, cycling through the list
    PerVertex,
}

/// Tessellation options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationHints {
    /// Scales the default number of rows and segments; `1.0` keeps them
    pub detail_ratio: f32,
    /// Normal generation
    pub normals: NormalsType,
    /// Colour assignment
    pub colors: ColorsType,
    /// Emit outward-facing triangles
    pub create_front_face: bool,
    /// Emit inward-facing triangles
    pub create_back_face: bool,
}

impl Default for TessellationHints {
    fn default() -> Self {
        Self {
            detail_ratio: 1.0,
            normals: NormalsType::PerVertex,
            colors: ColorsType::Overall,
            create_front_face: true,
            create_back_face: false,
        }
    }
}

impl TessellationHints {
    fn scaled(&self, count: u32, minimum: u32) -> u32 {
        let ratio = self.detail_ratio;
        if ratio > 0.0 && (ratio - 1.0).abs() > f32::EPSILON {
            ((count as f32 * ratio) as u32).max(minimum)
        } else {
            count
        }
    }
}

/// Analytic shape that can be tessellated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned box before rotation
    Box {
        /// Centre of the box
        center: Vec3,
        /// Half extents along each local axis
        half_lengths: Vec3,
        /// Orientation
        rotation: Quat,
    },
    /// Sphere
    Sphere {
        /// Centre of the sphere
        center: Vec3,
        /// Radius
        radius: f32,
    },
    /// Cone along local +Z. The base sits a quarter of the height below
    /// `center`, the apex three quarters above it.
    Cone {
        /// Reference point on the axis
        center: Vec3,
        /// Base radius
        radius: f32,
        /// Height from base to apex
        height: f32,
        /// Orientation
        rotation: Quat,
    },
}

impl Shape {
    /// Cube with edge length `size`
    pub fn cube(center: Vec3, size: f32) -> Self {
        Shape::Box {
            center,
            half_lengths: Vec3::repeat(size * 0.5),
            rotation: Quat::identity(),
        }
    }

    /// Sphere at `center`
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    /// Cone along +Z
    pub fn cone(center: Vec3, radius: f32, height: f32) -> Self {
        Shape::Cone {
            center,
            radius,
            height,
            rotation: Quat::identity(),
        }
    }

    /// Same shape with a different orientation; spheres ignore it
    pub fn with_rotation(self, new_rotation: Quat) -> Self {
        match self {
            Shape::Box { center, half_lengths, .. } => Shape::Box {
                center,
                half_lengths,
                rotation: new_rotation,
            },
            Shape::Cone { center, radius, height, .. } => Shape::Cone {
                center,
                radius,
                height,
                rotation: new_rotation,
            },
            sphere @ Shape::Sphere { .. } => sphere,
        }
    }

    /// Tessellate into a drawable.
    ///
    /// Fails with [`SceneError::UnsupportedConfiguration`] for an empty
    /// colour list and for hints the shape cannot honour.
    pub fn build_drawable(
        &self,
        name: impl Into<String>,
        hints: &TessellationHints,
        colors: &[[f32; 3]],
    ) -> SceneResult<Drawable> {
        if colors.is_empty() {
            return Err(SceneError::UnsupportedConfiguration(
                "at least one colour is required to build a shape".to_string(),
            ));
        }

        let mut mesh = Mesh::default();
        match *self {
            Shape::Box { center, half_lengths, rotation } => {
                build_box(&mut mesh, hints, colors, half_lengths);
                mesh.transform(&placement(center, rotation), &rotation);
            }
            Shape::Sphere { center, radius } => {
                reject_smooth_only("spheres", hints)?;
                build_sphere(&mut mesh, hints, colors[0], radius);
                mesh.transform(&Mat4::new_translation(&center), &Quat::identity());
            }
            Shape::Cone { center, radius, height, rotation } => {
                reject_smooth_only("cones", hints)?;
                build_cone(&mut mesh, hints, colors[0], radius, height);
                mesh.transform(&placement(center, rotation), &rotation);
            }
        }

        let index_count = u32::try_from(mesh.indices.len()).map_err(|_| {
            SceneError::UnsupportedConfiguration("shape tessellation is too detailed".to_string())
        })?;
        Ok(Drawable::with_geometry(
            name,
            mesh.vertices,
            mesh.indices,
            PrimitiveSet::draw_elements(PrimitiveTopology::TriangleList, index_count, 1, 0, 0, 0),
        ))
    }
}

fn placement(center: Vec3, rotation: Quat) -> Mat4 {
    Mat4::new_translation(&center) * rotation.to_homogeneous()
}

fn reject_smooth_only(kind: &str, hints: &TessellationHints) -> SceneResult<()> {
    if hints.normals == NormalsType::PerFace {
        return Err(SceneError::UnsupportedConfiguration(format!(
            "per-face normals are not supported for {kind}"
        )));
    }
    match hints.colors {
        ColorsType::Overall => Ok(()),
        ColorsType::PerFace => Err(SceneError::UnsupportedConfiguration(format!(
            "per-face colours are not supported for {kind}"
        ))),
        ColorsType::PerVertex => Err(SceneError::UnsupportedConfiguration(format!(
            "per-vertex colours are not supported for {kind}"
        ))),
    }
}

#[derive(Default)]
struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    fn push(&mut self, position: Vec3, tex_coord: [f32; 2], color: [f32; 3], normal: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(position, tex_coord, color, normal));
        index
    }

    /// Two triangles over a quad given counter-clockwise from outside
    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    fn transform(&mut self, matrix: &Mat4, rotation: &Quat) {
        for vertex in &mut self.vertices {
            vertex.position = matrix.pre_multiply(&vertex.position()).into();
            vertex.normal = (rotation * Vec3::from(vertex.normal)).into();
        }
    }
}

fn build_box(mesh: &mut Mesh, hints: &TessellationHints, colors: &[[f32; 3]], half: Vec3) {
    // Outward normal and the two in-plane axes of each face, ordered so
    // u x v == normal
    let faces = [
        (Vec3::x(), Vec3::y(), Vec3::z()),
        (-Vec3::x(), Vec3::z(), Vec3::y()),
        (Vec3::y(), Vec3::z(), Vec3::x()),
        (-Vec3::y(), Vec3::x(), Vec3::z()),
        (Vec3::z(), Vec3::x(), Vec3::y()),
        (-Vec3::z(), Vec3::y(), Vec3::x()),
    ];

    let mut vertex_counter = 0;
    for (face_index, (normal, u, v)) in faces.iter().enumerate() {
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let positions = corners.map(|(su, sv)| (normal + u * su + v * sv).component_mul(&half));
        let tex_coords = corners.map(|(su, sv)| [(su + 1.0) * 0.5, (sv + 1.0) * 0.5]);

        let mut emit = |mesh: &mut Mesh, flip: bool| {
            let n = if flip { -normal } else { *normal };
            let ids: Vec<u32> = positions
                .iter()
                .zip(tex_coords)
                .map(|(position, tex_coord)| {
                    let color = match hints.colors {
                        ColorsType::Overall => colors[0],
                        ColorsType::PerFace => colors[face_index % colors.len()],
                        ColorsType::PerVertex => colors[vertex_counter % colors.len()],
                    };
                    vertex_counter += 1;
                    mesh.push(*position, tex_coord, color, n)
                })
                .collect();
            if flip {
                mesh.quad(ids[0], ids[3], ids[2], ids[1]);
            } else {
                mesh.quad(ids[0], ids[1], ids[2], ids[3]);
            }
        };

        if hints.create_front_face {
            emit(mesh, false);
        }
        if hints.create_back_face {
            emit(mesh, true);
        }
    }
}

fn build_sphere(mesh: &mut Mesh, hints: &TessellationHints, color: [f32; 3], radius: f32) {
    let rows = hints.scaled(DEFAULT_SPHERE_ROWS, MIN_ROWS);
    let segments = hints.scaled(DEFAULT_SEGMENTS, MIN_SEGMENTS);

    let emit = |mesh: &mut Mesh, flip: bool| {
        let first = mesh.vertices.len() as u32;
        for row in 0..=rows {
            let latitude = -constants::HALF_PI + constants::PI * row as f32 / rows as f32;
            let (sin_lat, cos_lat) = latitude.sin_cos();
            for segment in 0..=segments {
                // Last column repeats the first exactly to close the seam
                let angle = if segment == segments {
                    0.0
                } else {
                    constants::TAU * segment as f32 / segments as f32
                };
                let (s, c) = angle.sin_cos();
                let normal = Vec3::new(c * cos_lat, s * cos_lat, sin_lat);
                let tex_coord = [segment as f32 / segments as f32, row as f32 / rows as f32];
                let n = if flip { -normal } else { normal };
                mesh.push(normal * radius, tex_coord, color, n);
            }
        }

        let stride = segments + 1;
        for row in 0..rows {
            for segment in 0..segments {
                let a = first + row * stride + segment;
                let b = a + 1;
                let d = a + stride;
                let c = d + 1;
                if flip {
                    mesh.quad(a, d, c, b);
                } else {
                    mesh.quad(a, b, c, d);
                }
            }
        }
    };

    if hints.create_front_face {
        emit(mesh, false);
    }
    if hints.create_back_face {
        emit(mesh, true);
    }
}

fn build_cone(mesh: &mut Mesh, hints: &TessellationHints, color: [f32; 3], radius: f32, height: f32) {
    let segments = hints.scaled(DEFAULT_SEGMENTS, MIN_SEGMENTS);
    let base_z = -height * 0.25;
    let top_z = height * 0.75;

    let slope = if height > 0.0 { radius / height } else { 0.0 };
    let normal_ratio = 1.0 / (1.0 + slope * slope).sqrt();

    let emit = |mesh: &mut Mesh, flip: bool| {
        let sign = if flip { -1.0 } else { 1.0 };

        // Side: one apex vertex per segment so each keeps its own normal
        let mut ring = Vec::with_capacity(segments as usize + 1);
        for segment in 0..=segments {
            let angle = if segment == segments {
                0.0
            } else {
                constants::TAU * segment as f32 / segments as f32
            };
            let (s, c) = angle.sin_cos();
            let normal = Vec3::new(c * normal_ratio, s * normal_ratio, slope * normal_ratio) * sign;
            let u = segment as f32 / segments as f32;
            let base = mesh.push(Vec3::new(c * radius, s * radius, base_z), [u, 0.0], color, normal);
            let apex = mesh.push(Vec3::new(0.0, 0.0, top_z), [u, 1.0], color, normal);
            ring.push((base, apex));
        }
        for pair in ring.windows(2) {
            let ((base0, apex0), (base1, _)) = (pair[0], pair[1]);
            if flip {
                mesh.indices.extend_from_slice(&[base0, apex0, base1]);
            } else {
                mesh.indices.extend_from_slice(&[base0, base1, apex0]);
            }
        }

        // Bottom cap
        let down = Vec3::new(0.0, 0.0, -sign);
        let center = mesh.push(Vec3::new(0.0, 0.0, base_z), [0.5, 0.5], color, down);
        let cap: Vec<u32> = (0..=segments)
            .map(|segment| {
                let angle = constants::TAU * segment as f32 / segments as f32;
                let (s, c) = angle.sin_cos();
                mesh.push(
                    Vec3::new(c * radius, s * radius, base_z),
                    [0.5 + c * 0.5, 0.5 + s * 0.5],
                    color,
                    down,
                )
            })
            .collect();
        for pair in cap.windows(2) {
            if flip {
                mesh.indices.extend_from_slice(&[center, pair[0], pair[1]]);
            } else {
                mesh.indices.extend_from_slice(&[center, pair[1], pair[0]]);
            }
        }
    };

    if hints.create_front_face {
        emit(mesh, false);
    }
    if hints.create_back_face {
        emit(mesh, true);
    }
}
