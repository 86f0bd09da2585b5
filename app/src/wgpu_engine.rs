//! wgpu render engine.
//!
//! Draws every visible mesh of the courtroom flat-shaded under the scene's
//! lights, over the scene's clear colour. Mesh buffers are uploaded the first
//! frame a mesh is seen and dropped once no node draws it. Per-draw uniforms
//! share one buffer addressed with dynamic offsets.
//!
//! The surface and depth target are reconfigured on resize and whenever the
//! surface reports itself outdated or lost.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use circuit_court_scene::{
    CameraView, EngineError, Handedness, LightKind, MeshData, MeshInstance, RenderEngine,
    SceneGraph,
};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

const SHADER_WGSL: &str = include_str!("../shaders/courtroom.wgsl");

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-draw uniform block; layout matches `Draw` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct DrawUniform {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    sun: [f32; 4],
    sky: [f32; 4],
    bounce: [f32; 4],
    ambient: [f32; 4],
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// The scene's lights reduced to what the shader takes: one directional and
/// up to two hemispheric lights.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SceneLights {
    sun: [f32; 4],
    sky: [f32; 4],
    bounce: [f32; 4],
    ambient: [f32; 4],
}

impl SceneLights {
    fn from_graph(scene: &SceneGraph) -> Self {
        let unlit = [0.0, 1.0, 0.0, 0.0];
        let mut lights = Self {
            sun: unlit,
            sky: unlit,
            bounce: unlit,
            ambient: [
                scene.ambient_color[0],
                scene.ambient_color[1],
                scene.ambient_color[2],
                match scene.handedness {
                    Handedness::Right => 1.0,
                    Handedness::Left => -1.0,
                },
            ],
        };

        let mut hemispheres = 0;
        for light in scene.lights() {
            match light.kind {
                LightKind::Directional { direction } if lights.sun[3] == 0.0 => {
                    lights.sun = packed(direction, light.intensity);
                }
                LightKind::Hemispheric { direction } if hemispheres < 2 => {
                    let slot = if hemispheres == 0 {
                        &mut lights.sky
                    } else {
                        &mut lights.bounce
                    };
                    *slot = packed(direction, light.intensity);
                    hemispheres += 1;
                }
                _ => log::trace!("light {:?} not representable, skipped", light.name),
            }
        }
        lights
    }
}

/// Unit direction and intensity; a zero direction contributes nothing.
fn packed(direction: Vec3, intensity: f32) -> [f32; 4] {
    match direction.try_normalize() {
        Some(unit) => [unit.x, unit.y, unit.z, intensity],
        None => [0.0, 1.0, 0.0, 0.0],
    }
}

impl DrawUniform {
    fn new(view_projection: Mat4, world: Mat4, lights: &SceneLights) -> Self {
        Self {
            mvp: (view_projection * world).to_cols_array_2d(),
            model: world.to_cols_array_2d(),
            sun: lights.sun,
            sky: lights.sky,
            bounce: lights.bounce,
            ambient: lights.ambient,
        }
    }
}

/// Distance between consecutive draw uniforms in the shared buffer.
fn uniform_stride(min_offset_alignment: u32) -> u64 {
    let align = u64::from(min_offset_alignment.max(1));
    DRAW_UNIFORM_SIZE.div_ceil(align) * align
}

/// Uniform bytes for every draw, each padded to `stride`.
fn pack_uniforms(uniforms: &[DrawUniform], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0_u8; uniforms.len() * stride];
    for (slot, uniform) in bytes.chunks_exact_mut(stride).zip(uniforms) {
        slot[..DRAW_UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(uniform));
    }
    bytes
}

/// Meshes are keyed by allocation; the cached `Arc` keeps the address alive.
fn mesh_key(mesh: &Arc<MeshData>) -> usize {
    Arc::as_ptr(mesh) as usize
}

struct GpuMesh {
    _source: Arc<MeshData>,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    used: bool,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &Arc<MeshData>) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} indices", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "uploaded mesh {} ({} triangles)",
            mesh.name,
            mesh.triangle_count()
        );
        Self {
            _source: mesh.clone(),
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
            used: true,
        }
    }
}

/// Shared per-draw uniform buffer, grown on demand.
struct DrawUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
    stride: u64,
}

impl DrawUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u64) -> Self {
        let stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Uniforms"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            capacity,
            stride,
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Buffer"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Courtroom Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_WGSL.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Courtroom Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Courtroom Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        // glTF winding flips under the left-handed projection; draw both faces.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    uniforms: DrawUniforms,
    meshes: HashMap<usize, GpuMesh>,
}

impl GpuState {
    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    /// Upload meshes seen for the first time and release the ones no longer drawn.
    fn sync_meshes(&mut self, instances: &[MeshInstance<'_>]) {
        for mesh in self.meshes.values_mut() {
            mesh.used = false;
        }
        for instance in instances {
            let device = &self.device;
            self.meshes
                .entry(mesh_key(instance.mesh))
                .or_insert_with(|| GpuMesh::upload(device, instance.mesh))
                .used = true;
        }
        let before = self.meshes.len();
        self.meshes.retain(|_, mesh| mesh.used);
        if self.meshes.len() < before {
            log::debug!("released {} mesh buffers", before - self.meshes.len());
        }
    }

    fn write_uniforms(&mut self, uniforms: &[DrawUniform]) {
        let needed = uniforms.len() as u64;
        if needed > self.uniforms.capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("growing draw uniforms to {capacity}");
            self.uniforms = DrawUniforms::new(&self.device, &self.uniform_layout, capacity);
        }
        if !uniforms.is_empty() {
            self.queue.write_buffer(
                &self.uniforms.buffer,
                0,
                &pack_uniforms(uniforms, self.uniforms.stride),
            );
        }
    }
}

/// [`RenderEngine`] backed by a wgpu surface on a winit window.
pub struct WgpuEngine {
    gpu: Option<GpuState>,
    adapter_name: String,
}

impl std::fmt::Debug for WgpuEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuEngine")
            .field("adapter", &self.adapter_name)
            .field("disposed", &self.gpu.is_none())
            .finish()
    }
}

impl WgpuEngine {
    /// Create a surface on `window` and a device that can present to it.
    pub fn new(window: Arc<Window>) -> Result<Self, EngineError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| EngineError::Surface(format!("Surface creation failed: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| EngineError::Device("No compatible GPU adapter".into()))?;

        let adapter_name = adapter.get_info().name;
        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Circuit Court Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| EngineError::Device(format!("Device creation failed: {e}")))?;

        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| EngineError::Surface("Surface not supported by adapter".into()))?;
        surface.configure(&device, &config);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });
        let pipeline = create_pipeline(&device, &uniform_layout, config.format);
        let uniforms = DrawUniforms::new(&device, &uniform_layout, 16);
        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            gpu: Some(GpuState {
                surface,
                device,
                queue,
                config,
                depth_view,
                pipeline,
                uniform_layout,
                uniforms,
                meshes: HashMap::new(),
            }),
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

impl RenderEngine for WgpuEngine {
    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        // A minimized window reports zero; keep the last valid configuration.
        if width == 0 || height == 0 {
            return;
        }
        gpu.config.width = width;
        gpu.config.height = height;
        gpu.reconfigure();
    }

    fn draw(&mut self, scene: &SceneGraph, view: &CameraView) -> Result<(), EngineError> {
        let gpu = self.gpu.as_mut().ok_or(EngineError::Disposed)?;

        let instances = scene.visible_meshes();
        let aspect = gpu.config.width as f32 / gpu.config.height.max(1) as f32;
        let view_projection = view.view_projection(aspect);
        let lights = SceneLights::from_graph(scene);
        let uniforms: Vec<DrawUniform> = instances
            .iter()
            .map(|instance| DrawUniform::new(view_projection, instance.world, &lights))
            .collect();
        gpu.sync_meshes(&instances);
        gpu.write_uniforms(&uniforms);

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                gpu.reconfigure();
                return Err(EngineError::Surface("surface outdated, reconfigured".into()));
            }
            Err(e) => return Err(EngineError::Surface(e.to_string())),
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let [r, g, b, a] = scene.clear_color;
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Courtroom Frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Courtroom"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&gpu.pipeline);
            for (slot, instance) in instances.iter().enumerate() {
                let Some(mesh) = gpu.meshes.get(&mesh_key(instance.mesh)) else {
                    continue;
                };
                let offset = slot as u64 * gpu.uniforms.stride;
                pass.set_bind_group(0, &gpu.uniforms.bind_group, &[offset as u32]);
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), EngineError> {
        let gpu = self.gpu.take().ok_or(EngineError::Disposed)?;
        let GpuState {
            surface,
            device,
            meshes,
            ..
        } = gpu;
        drop(meshes);
        // Surface first: it borrows the window the device presents to.
        drop(surface);
        device.destroy();
        log::info!("wgpu engine released ({})", self.adapter_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuit_court_scene::fixtures::triangle_glb;
    use circuit_court_scene::ModelAsset;

    fn courtroom_lights() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let sun = Vec3::new(0.0, -2.0, 0.0);
        scene.add_light("sky", LightKind::Hemispheric { direction: -sun }, 1.2);
        scene.add_light("bounce", LightKind::Hemispheric { direction: sun }, 0.4);
        scene.add_light("sun", LightKind::Directional { direction: sun }, 0.5);
        scene.ambient_color = [0.1, 0.2, 0.3];
        scene
    }

    #[test]
    fn lights_are_normalized_into_slots() {
        let lights = SceneLights::from_graph(&courtroom_lights());
        assert_eq!(lights.sky, [0.0, 1.0, 0.0, 1.2]);
        assert_eq!(lights.bounce, [0.0, -1.0, 0.0, 0.4]);
        assert_eq!(lights.sun, [0.0, -1.0, 0.0, 0.5]);
        // Left-handed by default.
        assert_eq!(lights.ambient, [0.1, 0.2, 0.3, -1.0]);
    }

    #[test]
    fn unlit_scene_packs_finite_lights() {
        let mut scene = SceneGraph::new();
        scene.add_light("broken", LightKind::Directional { direction: Vec3::ZERO }, 3.0);
        scene.handedness = Handedness::Right;

        let lights = SceneLights::from_graph(&scene);
        assert_eq!(lights.sun[3], 0.0);
        assert_eq!(lights.ambient[3], 1.0);
        for slot in [lights.sun, lights.sky, lights.bounce, lights.ambient] {
            assert!(slot.iter().all(|value| value.is_finite()));
        }
    }

    #[test]
    fn uniform_carries_world_and_camera() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let view_projection = Mat4::from_scale(Vec3::splat(2.0));
        let uniform = DrawUniform::new(
            view_projection,
            world,
            &SceneLights::from_graph(&courtroom_lights()),
        );
        assert_eq!(uniform.model, world.to_cols_array_2d());
        assert_eq!(uniform.mvp, (view_projection * world).to_cols_array_2d());
    }

    #[test]
    fn uniforms_are_packed_at_aligned_offsets() {
        let stride = uniform_stride(256);
        assert_eq!(stride, 256);
        assert_eq!(uniform_stride(64), DRAW_UNIFORM_SIZE);

        let lights = SceneLights::from_graph(&courtroom_lights());
        let uniforms = [
            DrawUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights),
            DrawUniform::new(Mat4::IDENTITY, Mat4::from_scale(Vec3::splat(3.0)), &lights),
        ];
        let bytes = pack_uniforms(&uniforms, stride);

        assert_eq!(bytes.len(), 512);
        let second: DrawUniform =
            bytemuck::pod_read_unaligned(&bytes[256..256 + DRAW_UNIFORM_SIZE as usize]);
        assert_eq!(second, uniforms[1]);
        assert!(bytes[DRAW_UNIFORM_SIZE as usize..256].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn cloned_nodes_share_one_cache_key() {
        let model = ModelAsset::decode("person", &triangle_glb("Person")).unwrap();
        let mut scene = SceneGraph::new();
        let defense = scene.add_model("Defense", &model);
        scene.clone_subtree(defense, "Prosecutor");

        let keys: Vec<usize> = scene
            .visible_meshes()
            .iter()
            .map(|instance| mesh_key(instance.mesh))
            .collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }
}
