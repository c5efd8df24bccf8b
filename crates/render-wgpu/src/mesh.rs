use bytemuck::{Pod, Zeroable};
use cabinview_assets::{MeshData, SceneMesh, TextureData, WHITE};
use cabinview_common::Transform;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub texture_coord: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
    ];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct ModelUniform {
    model: [[f32; 4]; 4],
}

impl ModelUniform {
    fn new(transform: &Transform) -> Self {
        Self {
            model: transform.model_matrix().to_cols_array_2d(),
        }
    }
}

/// Interleave positions and texture coordinates.
pub(crate) fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(&mesh.uvs)
        .map(|(p, uv)| Vertex {
            position: *p,
            texture_coord: *uv,
        })
        .collect()
}

/// A mesh uploaded to the GPU with its diffuse texture.
pub struct GpuMesh {
    pub name: String,
    pub transform: Transform,
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) model_bind_group: wgpu::BindGroup,
    pub(crate) texture_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    vertex_count: usize,
}

/// Layouts and sampler shared by every uploaded mesh.
pub(crate) struct MeshBindings<'a> {
    pub model_layout: &'a wgpu::BindGroupLayout,
    pub texture_layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
}

impl GpuMesh {
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &MeshBindings<'_>,
        scene_mesh: &SceneMesh,
    ) -> Self {
        let vertices = interleave(&scene_mesh.mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_vertex_buffer", scene_mesh.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_index_buffer", scene_mesh.name)),
            contents: bytemuck::cast_slice(&scene_mesh.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_model_buffer", scene_mesh.name)),
            contents: bytemuck::bytes_of(&ModelUniform::new(&scene_mesh.transform)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_model_bind_group", scene_mesh.name)),
            layout: bindings.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        let white = TextureData::solid(WHITE);
        let texture = scene_mesh.texture.as_ref().unwrap_or(&white);
        let view = upload_texture(device, queue, &scene_mesh.name, texture);
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_texture_bind_group", scene_mesh.name)),
            layout: bindings.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(bindings.sampler),
                },
            ],
        });

        Self {
            name: scene_mesh.name.clone(),
            transform: scene_mesh.transform,
            vertex_buffer,
            index_buffer,
            index_count: scene_mesh.mesh.indices.len() as u32,
            model_bind_group,
            texture_bind_group,
            model_buffer,
            vertex_count: vertices.len(),
        }
    }

    /// Replace the model scale factors.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.scale(x, y, z);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Write the current transform into the mesh's `model` uniform.
    pub(crate) fn write_model(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.model_buffer,
            0,
            bytemuck::bytes_of(&ModelUniform::new(&self.transform)),
        );
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    data: &TextureData,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{name}_texture")),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.bytes_per_row()),
            rows_per_image: Some(data.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        assert_eq!(Vertex::LAYOUT.attributes.len(), 2);
    }

    #[test]
    fn model_uniform_is_column_major() {
        let transform = Transform {
            translation: glam::Vec3::new(1.0, 2.0, 3.0),
            scale: glam::Vec3::splat(2.0),
        };
        let uniform = ModelUniform::new(&transform);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64);
        assert_eq!(uniform.model[0][0], 2.0);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn interleave_pairs_attributes() {
        let mesh = MeshData::terrain_plane(2.0);
        let vertices = interleave(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[0].position, mesh.positions[0]);
        assert_eq!(vertices[1].texture_coord, mesh.uvs[1]);
    }
}
