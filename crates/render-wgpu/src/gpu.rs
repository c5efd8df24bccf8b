use crate::mesh::{GpuMesh, MeshBindings, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cabinview_assets::SceneMesh;
use cabinview_render::uniforms::{self, UniformSink};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Maps OpenGL clip depth [-1, 1] onto the [0, 1] range wgpu expects.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct CameraUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

/// Host copy of the camera uniform block. Accepts `view` and `projection`;
/// the projection is converted to wgpu depth on the way in.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CameraBlock {
    uniforms: CameraUniforms,
}

impl Default for CameraBlock {
    fn default() -> Self {
        Self {
            uniforms: CameraUniforms {
                view: Mat4::IDENTITY.to_cols_array_2d(),
                projection: OPENGL_TO_WGPU.to_cols_array_2d(),
            },
        }
    }
}

impl UniformSink for CameraBlock {
    fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        match name {
            uniforms::VIEW => self.uniforms.view = value.to_cols_array_2d(),
            uniforms::PROJECTION => {
                self.uniforms.projection = (OPENGL_TO_WGPU * value).to_cols_array_2d()
            }
            _ => return false,
        }
        true
    }
}

/// Log validation errors raised while `f` runs. Pipeline problems are not
/// fatal; the draw simply produces nothing.
fn with_validation<T>(device: &wgpu::Device, what: &str, f: impl FnOnce() -> T) -> T {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        tracing::error!("{what} failed validation: {err}");
    }
    value
}

/// wgpu renderer for the textured scene meshes.
pub struct WgpuRenderer {
    fill_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    wireframe: bool,
    camera: CameraBlock,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    meshes: Vec<GpuMesh>,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let camera = CameraBlock::default();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&camera.uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = uniform_layout(device, "camera_bind_group_layout");
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let model_layout = uniform_layout(device, "model_bind_group_layout");

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &model_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        if let Err(e) = shaders::validate_wgsl(shaders::SCENE_SHADER, "scene_shader") {
            tracing::error!("{e}");
        }
        let shader = with_validation(device, "scene shader", || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("scene_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
            })
        });

        let fill_pipeline = with_validation(device, "fill pipeline", || {
            create_pipeline(
                device,
                &pipeline_layout,
                &shader,
                surface_format,
                wgpu::PolygonMode::Fill,
            )
        });

        let wireframe_pipeline = if device.features().contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            Some(with_validation(device, "wireframe pipeline", || {
                create_pipeline(
                    device,
                    &pipeline_layout,
                    &shader,
                    surface_format,
                    wgpu::PolygonMode::Line,
                )
            }))
        } else {
            tracing::debug!("POLYGON_MODE_LINE unsupported, wireframe disabled");
            None
        };

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            fill_pipeline,
            wireframe_pipeline,
            wireframe: false,
            camera,
            camera_buffer,
            camera_bind_group,
            model_layout,
            texture_layout,
            sampler,
            meshes: Vec::new(),
            depth_texture,
        }
    }

    /// Upload the scene meshes, replacing any previous scene.
    pub fn set_scene(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &[SceneMesh]) {
        let bindings = MeshBindings {
            model_layout: &self.model_layout,
            texture_layout: &self.texture_layout,
            sampler: &self.sampler,
        };
        self.meshes = scene
            .iter()
            .map(|m| GpuMesh::upload(device, queue, &bindings, m))
            .collect();
        tracing::info!(
            "uploaded {} meshes ({} vertices)",
            self.meshes.len(),
            self.vertex_count()
        );
    }

    pub fn meshes_mut(&mut self) -> &mut [GpuMesh] {
        &mut self.meshes
    }

    /// Total vertices across all uploaded meshes.
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(GpuMesh::vertex_count).sum()
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    /// Request wireframe drawing. Returns the mode actually in effect.
    pub fn set_wireframe(&mut self, wireframe: bool) -> bool {
        if wireframe && !self.supports_wireframe() {
            tracing::warn!("wireframe requested but the device lacks POLYGON_MODE_LINE");
        }
        self.wireframe = wireframe && self.supports_wireframe();
        self.wireframe
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame of every uploaded mesh.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        clear_color: [f64; 4],
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera.uniforms),
        );

        for mesh in &self.meshes {
            mesh.write_model(queue);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b, a] = clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
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

            let pipeline = match (&self.wireframe_pipeline, self.wireframe) {
                (Some(wireframe), true) => wireframe,
                _ => &self.fill_pipeline,
            };
            pass.set_pipeline(pipeline);

            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for mesh in &self.meshes {
                pass.set_bind_group(1, &mesh.model_bind_group, &[]);
                pass.set_bind_group(2, &mesh.texture_bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
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

impl UniformSink for WgpuRenderer {
    fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        self.camera.set_mat4(name, value)
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let label = match polygon_mode {
        wgpu::PolygonMode::Line => "wireframe_pipeline",
        _ => "fill_pipeline",
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::LAYOUT],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            polygon_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn opengl_depth_maps_to_unit_range() {
        let near = OPENGL_TO_WGPU * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = OPENGL_TO_WGPU * Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn converted_projection_keeps_x_and_y() {
        let gl = Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.1, 100.0);
        let p = Vec4::new(1.0, 2.0, -5.0, 1.0);
        let a = gl * p;
        let b = OPENGL_TO_WGPU * gl * p;
        assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
        assert!((a.w - b.w).abs() < 1e-6);
        assert!(b.z / b.w > 0.0 && b.z / b.w < 1.0);
    }

    #[test]
    fn camera_block_accepts_view_and_projection_only() {
        let mut block = CameraBlock::default();
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0);

        assert!(block.set_mat4(uniforms::VIEW, view));
        assert!(block.set_mat4(uniforms::PROJECTION, projection));
        assert!(!block.set_mat4(uniforms::MODEL, Mat4::IDENTITY));

        assert_eq!(block.uniforms.view, view.to_cols_array_2d());
        assert_eq!(
            block.uniforms.projection,
            (OPENGL_TO_WGPU * projection).to_cols_array_2d()
        );
    }

    #[test]
    fn camera_uniforms_have_gpu_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 128);
    }
}
