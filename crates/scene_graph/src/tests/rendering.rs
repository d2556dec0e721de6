//! Cull, upload and submission against a recording backend

use std::thread;

use crate::core::error::SceneError;
use crate::core::thread_guard::RenderThreadGuard;
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::logging;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::{
    BufferDescription, BufferHandle, BufferUsage, CommandList, DeviceId, GraphicsDevice, ResourceFactory,
    ResourceSetHandle,
};
use crate::scene::{Drawable, SceneGraph, Shape, TessellationHints};
use crate::visitor::CullVisitor;

#[derive(Debug, Default)]
struct RecordingFactory {
    created: Vec<BufferDescription>,
}

impl ResourceFactory for RecordingFactory {
    fn create_buffer(&mut self, description: &BufferDescription) -> Result<BufferHandle, SceneError> {
        self.created.push(*description);
        Ok(BufferHandle(self.created.len() as u64))
    }
}

#[derive(Debug)]
struct RecordingDevice {
    id: DeviceId,
    uploads: usize,
    uploaded_bytes: usize,
}

impl RecordingDevice {
    fn new(id: u64) -> Self {
        Self {
            id: DeviceId(id),
            uploads: 0,
            uploaded_bytes: 0,
        }
    }
}

impl GraphicsDevice for RecordingDevice {
    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn update_buffer(&mut self, _buffer: BufferHandle, _offset_in_bytes: u64, data: &[u8]) -> Result<(), SceneError> {
        self.uploads += 1;
        self.uploaded_bytes += data.len();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    VertexBuffer(BufferHandle),
    IndexBuffer(BufferHandle),
    ResourceSet(u32, ResourceSetHandle),
    Model(Vec3),
    Draw(u32),
    DrawIndexed(u32),
}

#[derive(Debug, Default)]
struct RecordingCommands {
    recorded: Vec<Recorded>,
}

impl CommandList for RecordingCommands {
    fn set_vertex_buffer(&mut self, _slot: u32, buffer: BufferHandle) {
        self.recorded.push(Recorded::VertexBuffer(buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.recorded.push(Recorded::IndexBuffer(buffer));
    }

    fn set_resource_set(&mut self, slot: u32, set: ResourceSetHandle) {
        self.recorded.push(Recorded::ResourceSet(slot, set));
    }

    fn set_model_matrix(&mut self, matrix: &Mat4) {
        self.recorded.push(Recorded::Model(matrix.fixed_view::<3, 1>(0, 3).into_owned()));
    }

    fn draw(&mut self, vertex_count: u32, _instance_count: u32, _vertex_start: u32, _instance_start: u32) {
        self.recorded.push(Recorded::Draw(vertex_count));
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        _instance_count: u32,
        _index_start: u32,
        _vertex_offset: i32,
        _instance_start: u32,
    ) {
        self.recorded.push(Recorded::DrawIndexed(index_count));
    }
}

struct Scene {
    graph: SceneGraph,
    root: NodeId,
    cube: DrawableId,
    line: DrawableId,
}

fn placed(graph: &mut SceneGraph, parent: NodeId, at: Vec3, drawable: Drawable) -> DrawableId {
    let transform = graph.create_transform("placement", Mat4::new_translation(&at));
    let geode = graph.create_geode("geode");
    let id = graph.add_drawable(geode, drawable).unwrap();
    graph.add_child(transform, geode).unwrap();
    graph.add_child(parent, transform).unwrap();
    id
}

fn cube() -> Drawable {
    Shape::cube(Vec3::zeros(), 0.5)
        .build_drawable("cube", &TessellationHints::default(), &[[0.2, 0.4, 0.6]])
        .unwrap()
}

/// Cube five units ahead, a line three units ahead, and a cube far to the side
fn scene() -> Scene {
    logging::init_for_tests();
    let mut graph = SceneGraph::new();
    let root = graph.create_group("root");
    let near_cube = placed(&mut graph, root, Vec3::new(0.0, 0.0, -5.0), cube());
    let line = placed(
        &mut graph,
        root,
        Vec3::new(0.0, 0.0, -3.0),
        Drawable::line_strip("line", &[Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)], [1.0; 3]),
    );
    placed(&mut graph, root, Vec3::new(50.0, 0.0, -5.0), cube());
    Scene {
        graph,
        root,
        cube: near_cube,
        line,
    }
}

/// Orthographic box x, y in [-1, 1], looking down -Z with depth [0, 10]
fn view_and_projection() -> (Mat4, Mat4) {
    let mut projection = Mat4::identity();
    projection[(2, 2)] = -0.1;
    (Mat4::identity(), projection)
}

#[test]
fn test_cull_configure_and_draw_frame() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    guard.set_rendering_thread_current().unwrap();
    let mut device = RecordingDevice::new(1);
    let mut factory = RecordingFactory::default();

    scene.graph.configure_device_buffers(&guard, &mut device, &mut factory).unwrap();
    // Vertex and index buffers for both cubes, a vertex buffer for the line
    assert_eq!(factory.created.len(), 5);
    assert_eq!(factory.created.iter().filter(|d| d.usage == BufferUsage::Index).count(), 2);
    assert_eq!(device.uploads, 5);
    assert!(device.uploaded_bytes > 0);

    let (view, projection) = view_and_projection();
    let mut cull = CullVisitor::new(view, projection);
    scene.graph.accept(scene.root, &mut cull);
    assert_eq!(cull.culled_count(), 1);
    let queue = cull.into_render_queue();
    let order: Vec<DrawableId> = queue.iter().map(|item| item.drawable).collect();
    assert_eq!(order, vec![scene.line, scene.cube]);

    let sets = [(0, ResourceSetHandle(7))];
    let mut commands = RecordingCommands::default();
    queue.draw(&guard, &scene.graph, &device, &sets, &mut commands).unwrap();

    let cube_indices = scene.graph.drawable(scene.cube).unwrap().indices().len() as u32;
    let draws: Vec<&Recorded> = commands
        .recorded
        .iter()
        .filter(|r| matches!(r, Recorded::Draw(_) | Recorded::DrawIndexed(_)))
        .collect();
    assert_eq!(draws, vec![&Recorded::Draw(2), &Recorded::DrawIndexed(cube_indices)]);
    assert_eq!(commands.recorded[0], Recorded::Model(Vec3::new(0.0, 0.0, -3.0)));
    assert!(commands.recorded.contains(&Recorded::ResourceSet(0, ResourceSetHandle(7))));
    assert_eq!(
        commands.recorded.iter().filter(|r| matches!(r, Recorded::IndexBuffer(_))).count(),
        1
    );
}

#[test]
fn test_configure_is_once_per_device() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    let mut first = RecordingDevice::new(1);
    let mut second = RecordingDevice::new(2);
    let mut factory = RecordingFactory::default();

    scene.graph.configure_device_buffers(&guard, &mut first, &mut factory).unwrap();
    scene.graph.configure_device_buffers(&guard, &mut first, &mut factory).unwrap();
    assert_eq!(factory.created.len(), 5);

    scene.graph.configure_device_buffers(&guard, &mut second, &mut factory).unwrap();
    assert_eq!(factory.created.len(), 10);
    let line = scene.graph.drawable(scene.line).unwrap();
    assert!(line.has_device_buffers(DeviceId(1)));
    assert!(line.has_device_buffers(DeviceId(2)));
}

#[test]
fn test_update_uploads_only_changed_geometry() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    let mut device = RecordingDevice::new(1);
    let mut factory = RecordingFactory::default();
    scene.graph.configure_device_buffers(&guard, &mut device, &mut factory).unwrap();
    let configured = device.uploads;

    scene.graph.update_device_buffers(&guard, &mut device).unwrap();
    assert_eq!(device.uploads, configured);

    scene
        .graph
        .modify_drawable(scene.line, |line| {
            let moved = Drawable::line_strip("line", &[Vec3::new(0.0, -0.5, 0.0), Vec3::new(0.0, 0.5, 0.0)], [1.0; 3]);
            line.set_vertices(moved.vertices().to_vec());
        })
        .unwrap();
    scene.graph.update_device_buffers(&guard, &mut device).unwrap();
    assert_eq!(device.uploads, configured + 1);
}

#[test]
fn test_outgrown_buffers_fail_and_are_recreated() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    let mut device = RecordingDevice::new(1);
    let mut factory = RecordingFactory::default();
    scene.graph.configure_device_buffers(&guard, &mut device, &mut factory).unwrap();

    scene
        .graph
        .modify_drawable(scene.line, |line| {
            let longer = Drawable::line_strip("line", &[Vec3::zeros(), Vec3::x(), Vec3::y()], [1.0; 3]);
            line.set_vertices(longer.vertices().to_vec());
        })
        .unwrap();

    let result = scene.graph.update_device_buffers(&guard, &mut device);
    assert!(matches!(result, Err(SceneError::Device(_))));
    assert!(!scene.graph.drawable(scene.line).unwrap().has_device_buffers(DeviceId(1)));

    // Drawing now reports the missing buffers instead of using stale ones
    let mut commands = RecordingCommands::default();
    let line = scene.graph.drawable(scene.line).unwrap();
    assert!(matches!(line.draw(&guard, &device, &[], &mut commands), Err(SceneError::Device(_))));

    scene.graph.configure_device_buffers(&guard, &mut device, &mut factory).unwrap();
    assert!(scene.graph.drawable(scene.line).unwrap().has_device_buffers(DeviceId(1)));
}

#[test]
fn test_draw_callback_replaces_default_submission() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    let device = RecordingDevice::new(1);
    scene
        .graph
        .modify_drawable(scene.line, |line| {
            line.set_draw_callback(Some(Box::new(|_: &Drawable, commands: &mut dyn CommandList| {
                commands.draw(99, 1, 0, 0);
            })));
        })
        .unwrap();

    // No buffers were configured; the callback does not need any
    let mut commands = RecordingCommands::default();
    let line = scene.graph.drawable(scene.line).unwrap();
    line.draw(&guard, &device, &[], &mut commands).unwrap();
    assert_eq!(commands.recorded, vec![Recorded::Draw(99)]);
}

#[test]
fn test_uploads_from_another_thread_are_rejected() {
    let mut scene = scene();
    let guard = RenderThreadGuard::new();
    guard.set_rendering_thread_current().unwrap();

    thread::scope(|scope| {
        scope
            .spawn(|| {
                let mut device = RecordingDevice::new(1);
                let mut factory = RecordingFactory::default();
                let result = scene.graph.configure_device_buffers(&guard, &mut device, &mut factory);
                assert!(matches!(result, Err(SceneError::CrossThread { .. })));
                assert!(factory.created.is_empty());
            })
            .join()
            .unwrap();
    });

    // The owning thread is unaffected
    assert!(guard.assert_rendering_thread().is_ok());
}
