use glam::{Mat4, Vec3};
use terrainview_mesh::GridMesh;
use wgpu::util::DeviceExt;

use crate::program::{DEPTH_FORMAT, ShaderProgram};
use crate::uniforms::{SceneBindings, SceneUniforms, UniformBlock};

/// Per-frame inputs to the terrain pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub projection: Mat4,
    pub model_view: Mat4,
    pub time: f32,
    pub player_position: Vec3,
}

/// Static grid buffers, uploaded once and drawn unchanged every frame.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, mesh: &GridMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_index_buffer"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }
}

/// Uniform buffer sized for one program's uniform block.
struct UniformBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    fn new(device: &wgpu::Device, program: &ShaderProgram) -> Self {
        // A program without uniforms still needs something bound at slot 0.
        let size = u64::from(program.interface().uniform_block_size()).max(16);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain_uniform_buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain_uniform_bind_group"),
            layout: program.bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Fog terrain renderer: one indexed triangle-strip draw of the grid.
pub struct TerrainRenderer {
    program: ShaderProgram,
    bindings: SceneBindings,
    scene: SceneUniforms,
    block: UniformBlock,
    uniforms: UniformBinding,
    mesh: Option<MeshBuffers>,
    depth_texture: wgpu::TextureView,
}

impl TerrainRenderer {
    pub fn new(
        device: &wgpu::Device,
        program: ShaderProgram,
        scene: SceneUniforms,
        width: u32,
        height: u32,
    ) -> Self {
        let bindings = SceneBindings::resolve(program.interface());
        let block = UniformBlock::new(program.interface().uniform_block_size());
        let uniforms = UniformBinding::new(device, &program);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            program,
            bindings,
            scene,
            block,
            uniforms,
            mesh: None,
            depth_texture,
        }
    }

    /// Upload the grid as static vertex and index buffers, replacing any
    /// previous mesh.
    pub fn upload_mesh(&mut self, device: &wgpu::Device, mesh: &GridMesh) {
        self.mesh = Some(MeshBuffers::upload(device, mesh));
        tracing::info!(
            vertices = mesh.vertex_count(),
            indices = mesh.index_count(),
            "grid uploaded"
        );
    }

    /// Swap in a freshly linked program and re-resolve every uniform.
    /// Static scene values carry over to the new program.
    pub fn replace_program(&mut self, device: &wgpu::Device, program: ShaderProgram) {
        self.bindings = SceneBindings::resolve(program.interface());
        self.block = UniformBlock::new(program.interface().uniform_block_size());
        self.uniforms = UniformBinding::new(device, &program);
        self.program = program;
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Fog colour and view distance, constant between reloads.
    pub fn set_environment(&mut self, fog_color: Vec3, view_distance: f32) {
        self.scene.fog_color = fog_color;
        self.scene.view_distance = view_distance;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.scene.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.scene.debug
    }

    pub fn fog_color(&self) -> Vec3 {
        self.scene.fog_color
    }

    /// Render one frame. Backend errors raised while recording or
    /// submitting are logged and never abort the caller's loop.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameParams,
    ) {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.scene.projection = frame.projection;
        self.scene.model_view = frame.model_view;
        self.scene.time = frame.time;
        self.scene.player_position = frame.player_position;
        self.bindings.write(&mut self.block, &self.scene);
        if !self.block.as_bytes().is_empty() {
            queue.write_buffer(&self.uniforms.buffer, 0, self.block.as_bytes());
        }

        let fog = self.scene.fog_color;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("terrain_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("terrain_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(fog.x),
                            g: f64::from(fog.y),
                            b: f64::from(fog.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(mesh) = &self.mesh {
                pass.set_pipeline(self.program.pipeline());
                pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("GPU error @ render exit: {error}");
        }
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
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
        });
        texture.create_view(&Default::default())
    }
}
